//! Signed URL Refresh Job
//!
//! Renews cached signed URLs that have entered their refresh window before
//! they expire, then sweeps whatever expired in the meantime.
//!
//! A run never fails because of the minter: failed mints are counted, logged
//! and left for the next run, which retries them if they still qualify.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::cache::{MetricsCollector, RefreshCandidate, SharedStore};
use crate::error::{CacheError, Result};
use crate::minter::Minter;

/// Mints issued concurrently per batch
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Upper bound on a single mint
pub const DEFAULT_MINT_TIMEOUT: Duration = Duration::from_secs(10);

// == Refresh Config ==
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    pub batch_size: usize,
    pub mint_timeout: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            mint_timeout: DEFAULT_MINT_TIMEOUT,
        }
    }
}

// == Refresh Result ==
/// Summary of one refresh run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RefreshResult {
    /// Entries renewed in the store
    pub refreshed: u64,
    /// Mints that errored, came back blank or timed out
    pub failed: u64,
    /// Minted URLs dropped because the entry changed during the mint
    pub skipped: u64,
    /// Wall time of the run in milliseconds
    pub duration_ms: u64,
}

enum Outcome {
    Refreshed,
    Failed,
    Skipped,
}

// == Refresh Job ==
/// Single-flight refresh job over a shared store.
pub struct RefreshJob {
    store: SharedStore,
    minter: Arc<dyn Minter>,
    collector: Arc<MetricsCollector>,
    config: RefreshConfig,
    /// Held for the whole of a run
    running: Mutex<()>,
}

impl RefreshJob {
    pub fn new(
        store: SharedStore,
        minter: Arc<dyn Minter>,
        collector: Arc<MetricsCollector>,
        config: RefreshConfig,
    ) -> Self {
        Self {
            store,
            minter,
            collector,
            config: RefreshConfig {
                batch_size: config.batch_size.max(1),
                ..config
            },
            running: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &RefreshConfig {
        &self.config
    }

    /// True while a run is in flight.
    pub fn is_running(&self) -> bool {
        self.running.try_lock().is_err()
    }

    // == Run ==
    /// Renews every entry currently inside its refresh window.
    ///
    /// Returns [`CacheError::RefreshInProgress`] without touching the store
    /// or the minter if another run has not finished yet.
    pub async fn run(&self) -> Result<RefreshResult> {
        let _guard = self
            .running
            .try_lock()
            .map_err(|_| CacheError::RefreshInProgress)?;

        let started = Instant::now();
        let mut result = RefreshResult::default();

        let candidates = self.store.read().await.refresh_candidates();
        if candidates.is_empty() {
            debug!("No signed URLs need refreshing");
            return Ok(result);
        }

        info!("Refreshing {} expiring signed URLs", candidates.len());

        for batch in candidates.chunks(self.config.batch_size) {
            let outcomes = join_all(batch.iter().map(|c| self.refresh_one(c))).await;

            for outcome in outcomes {
                match outcome {
                    Outcome::Refreshed => result.refreshed += 1,
                    Outcome::Failed => result.failed += 1,
                    Outcome::Skipped => result.skipped += 1,
                }
            }
        }

        let expired = self.store.write().await.clear_expired();
        if expired > 0 {
            info!("Cleared {} expired signed URLs", expired);
        }

        result.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            "Refresh complete: {} refreshed, {} failed, {} skipped in {}ms",
            result.refreshed, result.failed, result.skipped, result.duration_ms
        );

        Ok(result)
    }

    async fn refresh_one(&self, candidate: &RefreshCandidate) -> Outcome {
        let path = candidate.storage_path.as_str();

        let url = match self.mint(path, candidate.ttl_seconds).await {
            Ok(url) => url,
            Err(e) => {
                warn!(path, error = %e, "Failed to refresh signed URL");
                return Outcome::Failed;
            }
        };

        {
            let mut store = self.store.write().await;
            // Only replace the entry we selected; a newer foreground write wins
            let unchanged = store
                .entry(path)
                .is_some_and(|entry| candidate.matches(entry));
            if !unchanged {
                debug!(path, "Entry changed during refresh, dropping minted URL");
                return Outcome::Skipped;
            }
            store.refresh(path, url, candidate.ttl_seconds);
        }

        self.collector.record_refresh().await;
        Outcome::Refreshed
    }

    /// Mints under the configured timeout, rejecting blank URLs.
    async fn mint(&self, path: &str, ttl_seconds: i64) -> Result<String> {
        let url = timeout(self.config.mint_timeout, self.minter.mint(path, ttl_seconds))
            .await
            .map_err(|_| CacheError::MintTimeout(path.to_string()))??;

        if url.trim().is_empty() {
            return Err(CacheError::Mint(format!("{}: empty signed URL", path)));
        }
        Ok(url)
    }
}

/// Spawns a background task that runs the refresh job every
/// `interval_secs` seconds.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let job = Arc::new(RefreshJob::new(store, minter, collector, RefreshConfig::default()));
/// let refresh_handle = spawn_refresh_task(job.clone(), 300);
/// // Later, during shutdown:
/// refresh_handle.abort();
/// ```
pub fn spawn_refresh_task(job: Arc<RefreshJob>, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting signed URL refresh task with interval of {} seconds",
            interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            match job.run().await {
                Ok(result) if result.refreshed + result.failed + result.skipped > 0 => {
                    info!(
                        "Scheduled refresh: {} refreshed, {} failed",
                        result.refreshed, result.failed
                    );
                }
                Ok(_) => debug!("Scheduled refresh: nothing to do"),
                Err(CacheError::RefreshInProgress) => {
                    debug!("Scheduled refresh skipped, previous run still in flight");
                }
                Err(e) => warn!("Scheduled refresh failed: {}", e),
            }
        }
    })
}
