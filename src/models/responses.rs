//! Response DTOs for the signed URL API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{CacheEntry, CacheMetrics, PerformanceSnapshot};
use crate::resolver::PathResolution;
use crate::tasks::RefreshResult;

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Response body for `GET /signed-url`
#[derive(Debug, Clone, Serialize)]
pub struct ResolveResponse {
    pub path: String,
    pub url: String,
    /// Whether the URL was served from the cache
    pub cached: bool,
}

impl ResolveResponse {
    pub fn new(path: impl Into<String>, url: impl Into<String>, cached: bool) -> Self {
        Self {
            path: path.into(),
            url: url.into(),
            cached,
        }
    }
}

/// One path of a `POST /signed-urls` response; `url` is null when minting
/// failed.
#[derive(Debug, Clone, Serialize)]
pub struct BulkUrl {
    pub path: String,
    pub url: Option<String>,
    pub cached: bool,
}

/// Response body for `POST /signed-urls`
#[derive(Debug, Clone, Serialize)]
pub struct BulkResolveResponse {
    pub urls: Vec<BulkUrl>,
    pub hits: usize,
    pub minted: usize,
    pub failed: usize,
}

impl BulkResolveResponse {
    pub fn new(resolutions: Vec<PathResolution>) -> Self {
        let urls: Vec<BulkUrl> = resolutions
            .into_iter()
            .map(|r| match r.resolved {
                Some(resolved) => BulkUrl {
                    path: r.path,
                    url: Some(resolved.url),
                    cached: resolved.cached,
                },
                None => BulkUrl {
                    path: r.path,
                    url: None,
                    cached: false,
                },
            })
            .collect();

        let hits = urls.iter().filter(|u| u.cached).count();
        let failed = urls.iter().filter(|u| u.url.is_none()).count();
        Self {
            minted: urls.len() - hits - failed,
            urls,
            hits,
            failed,
        }
    }
}

/// Response body for `DELETE /signed-url`
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub path: String,
    /// Whether a cached URL was removed
    pub deleted: bool,
}

impl InvalidateResponse {
    pub fn new(path: impl Into<String>, deleted: bool) -> Self {
        Self {
            path: path.into(),
            deleted,
        }
    }
}

/// Response body for `POST /jobs/refresh-urls`
#[derive(Debug, Clone, Serialize)]
pub struct RefreshRunResponse {
    pub success: bool,
    pub result: RefreshResult,
    pub timestamp: String,
}

impl RefreshRunResponse {
    pub fn new(result: RefreshResult) -> Self {
        Self {
            success: true,
            result,
            timestamp: now_rfc3339(),
        }
    }
}

/// Store figures reported by the statistics endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheSummary {
    pub size: usize,
    pub hit_rate: f64,
    pub hits: u64,
    pub misses: u64,
    pub refreshes: u64,
    pub evictions: u64,
}

impl CacheSummary {
    pub fn new(metrics: CacheMetrics, size: usize) -> Self {
        Self {
            size,
            hit_rate: metrics.hit_rate(),
            hits: metrics.hits,
            misses: metrics.misses,
            refreshes: metrics.refreshes,
            evictions: metrics.evictions,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStatistics {
    pub cache: CacheSummary,
    pub performance: PerformanceSnapshot,
}

/// Response body for `GET /jobs/refresh-urls`
#[derive(Debug, Clone, Serialize)]
pub struct StatisticsResponse {
    pub success: bool,
    pub statistics: CacheStatistics,
    pub timestamp: String,
}

impl StatisticsResponse {
    pub fn new(cache: CacheSummary, performance: PerformanceSnapshot) -> Self {
        Self {
            success: true,
            statistics: CacheStatistics { cache, performance },
            timestamp: now_rfc3339(),
        }
    }
}

/// One row of `GET /cache/entries`
#[derive(Debug, Clone, Serialize)]
pub struct EntryView {
    pub path: String,
    pub url: String,
    pub expires_at: i64,
    pub ttl_seconds: i64,
    pub remaining_ms: i64,
    pub needs_refresh: bool,
}

impl EntryView {
    pub fn new(path: String, entry: &CacheEntry, now_ms: i64) -> Self {
        Self {
            path,
            url: entry.url.clone(),
            expires_at: entry.expires_at,
            ttl_seconds: entry.ttl_seconds,
            remaining_ms: entry.remaining_ms(now_ms),
            needs_refresh: entry.needs_refresh(now_ms),
        }
    }
}

/// Response body for `DELETE /cache`
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    /// Number of entries dropped
    pub cleared: usize,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: now_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
