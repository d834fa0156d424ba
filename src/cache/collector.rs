//! Performance Metrics Collector
//!
//! Keeps one-hour rolling windows of resolve latencies and successful
//! refreshes, and folds them together with the store's figures into a
//! [`PerformanceSnapshot`].
//!
//! The lifetime refresh total is owned by the store's `CacheMetrics`; this
//! collector only tracks when refreshes happened.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::clock::{Clock, SystemClock};

/// Length of the rolling windows.
pub const METRICS_WINDOW_MS: i64 = 60 * 60 * 1000;

// == Performance Snapshot ==
/// Point-in-time performance figures.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceSnapshot {
    pub cache_hit_rate: f64,
    pub cache_size: usize,
    /// Mean resolve latency over the last hour
    pub average_response_time_ms: f64,
    /// Successful refreshes over the last hour
    pub urls_refreshed_last_hour: u64,
    /// Resolve calls since start or last reset
    pub total_requests: u64,
    pub uptime_ms: i64,
    /// RFC 3339 timestamp of the snapshot
    pub last_updated: String,
}

#[derive(Debug)]
struct CollectorState {
    /// (recorded_at_ms, duration_ms)
    response_times: VecDeque<(i64, f64)>,
    refreshed_at: VecDeque<i64>,
    request_count: u64,
    started_at: i64,
}

impl CollectorState {
    fn new(now: i64) -> Self {
        Self {
            response_times: VecDeque::new(),
            refreshed_at: VecDeque::new(),
            request_count: 0,
            started_at: now,
        }
    }

    fn prune(&mut self, now: i64) {
        let cutoff = now - METRICS_WINDOW_MS;
        while self.response_times.front().is_some_and(|(at, _)| *at < cutoff) {
            self.response_times.pop_front();
        }
        while self.refreshed_at.front().is_some_and(|at| *at < cutoff) {
            self.refreshed_at.pop_front();
        }
    }

    fn average_response_time_ms(&self) -> f64 {
        if self.response_times.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.response_times.iter().map(|(_, ms)| ms).sum();
        sum / self.response_times.len() as f64
    }
}

// == Metrics Collector ==
#[derive(Debug)]
pub struct MetricsCollector {
    clock: Arc<dyn Clock>,
    state: Mutex<CollectorState>,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let now = clock.now_ms();
        Self {
            clock,
            state: Mutex::new(CollectorState::new(now)),
        }
    }

    /// Records one successfully refreshed entry.
    pub async fn record_refresh(&self) {
        let now = self.clock.now_ms();
        let mut state = self.state.lock().await;
        state.refreshed_at.push_back(now);
        state.prune(now);
    }

    /// Records the latency of one resolve call.
    pub async fn record_response_time(&self, duration: Duration) {
        let now = self.clock.now_ms();
        let mut state = self.state.lock().await;
        state
            .response_times
            .push_back((now, duration.as_secs_f64() * 1000.0));
        state.request_count += 1;
        state.prune(now);
    }

    pub async fn average_response_time_ms(&self) -> f64 {
        let now = self.clock.now_ms();
        let mut state = self.state.lock().await;
        state.prune(now);
        state.average_response_time_ms()
    }

    pub async fn refreshes_last_hour(&self) -> u64 {
        let now = self.clock.now_ms();
        let mut state = self.state.lock().await;
        state.prune(now);
        state.refreshed_at.len() as u64
    }

    pub async fn total_requests(&self) -> u64 {
        self.state.lock().await.request_count
    }

    /// Clears all windows and counters and restarts uptime.
    pub async fn reset(&self) {
        let now = self.clock.now_ms();
        *self.state.lock().await = CollectorState::new(now);
    }

    // == Snapshot ==
    /// Bundles the store's `hit_rate` and `cache_size` with the collector's
    /// own figures.
    pub async fn snapshot(&self, hit_rate: f64, cache_size: usize) -> PerformanceSnapshot {
        let now = self.clock.now_ms();
        let mut state = self.state.lock().await;
        state.prune(now);

        PerformanceSnapshot {
            cache_hit_rate: hit_rate,
            cache_size,
            average_response_time_ms: state.average_response_time_ms(),
            urls_refreshed_last_hour: state.refreshed_at.len() as u64,
            total_requests: state.request_count,
            uptime_ms: now - state.started_at,
            last_updated: Utc::now().to_rfc3339(),
        }
    }
}
