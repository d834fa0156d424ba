//! Cache Module
//!
//! In-memory signed URL cache with TTL expiry, refresh-window queries and
//! performance metrics.

mod collector;
mod entry;
mod stats;
mod store;


use std::sync::Arc;

use tokio::sync::RwLock;

// Re-export public types
pub use collector::{MetricsCollector, PerformanceSnapshot, METRICS_WINDOW_MS};
pub use entry::CacheEntry;
pub use stats::CacheMetrics;
pub use store::{RefreshCandidate, SignedUrlStore};

// == Public Constants ==
/// Share of the TTL, in percent, left at which an entry becomes due for refresh
pub const REFRESH_THRESHOLD_PERCENT: i64 = 20;

/// Store handle shared between request handlers and the refresh job.
///
/// Every operation takes the write lock since lookups update counters.
pub type SharedStore = Arc<RwLock<SignedUrlStore>>;

/// Wraps a store for sharing.
pub fn shared(store: SignedUrlStore) -> SharedStore {
    Arc::new(RwLock::new(store))
}
