//! Signed URL Store Module
//!
//! In-memory map of storage paths to signed URLs with lazy expiry,
//! refresh-window queries and hit/miss/refresh/eviction accounting.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::cache::{CacheEntry, CacheMetrics};
use crate::clock::{Clock, SystemClock};

// == Refresh Candidate ==
/// A live entry that has entered its refresh window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshCandidate {
    pub storage_path: String,
    /// TTL the entry was written with; re-minting reuses it
    pub ttl_seconds: i64,
    /// Expiry observed when the candidate was selected
    pub expires_at: i64,
    pub remaining_ms: i64,
    /// Write time and URL of the selected entry; together they identify it
    pub created_at: i64,
    pub url: String,
}

impl RefreshCandidate {
    /// True if `entry` is still the exact write this candidate was taken from.
    pub fn matches(&self, entry: &CacheEntry) -> bool {
        entry.created_at == self.created_at && entry.url == self.url
    }
}

// == Signed URL Store ==
/// Cache of signed URLs keyed by storage path.
///
/// Operations are synchronous and infallible. Share it across tasks as a
/// [`SharedStore`](crate::cache::SharedStore).
#[derive(Debug)]
pub struct SignedUrlStore {
    /// Path -> entry storage
    entries: HashMap<String, CacheEntry>,
    /// Performance counters
    metrics: CacheMetrics,
    /// Time source for expiry math
    clock: Arc<dyn Clock>,
}

impl Default for SignedUrlStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SignedUrlStore {
    // == Constructors ==
    /// Creates an empty store on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty store on the given clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            metrics: CacheMetrics::new(),
            clock,
        }
    }

    fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    // == Get ==
    /// Returns the cached URL for `storage_path` if it is still valid.
    ///
    /// An expired entry is removed here and counted as one eviction and
    /// one miss.
    pub fn get(&mut self, storage_path: &str) -> Option<String> {
        let now = self.now_ms();

        let expired = match self.entries.get(storage_path) {
            None => {
                self.metrics.record_miss();
                return None;
            }
            Some(entry) => entry.is_expired(now),
        };

        if expired {
            self.entries.remove(storage_path);
            self.metrics.record_eviction();
            self.metrics.record_miss();
            debug!(path = storage_path, "Evicted expired signed URL on read");
            return None;
        }

        self.metrics.record_hit();
        self.entries.get(storage_path).map(|entry| entry.url.clone())
    }

    // == Set ==
    /// Stores `url` for `storage_path`, valid for `ttl_seconds`.
    ///
    /// Any previous entry is replaced. A non-positive TTL stores an entry
    /// that is already expired.
    pub fn set(&mut self, storage_path: impl Into<String>, url: impl Into<String>, ttl_seconds: i64) {
        let storage_path = storage_path.into();
        let entry = CacheEntry::new(storage_path.clone(), url, ttl_seconds, self.now_ms());
        self.entries.insert(storage_path, entry);
    }

    // == Refresh ==
    /// Same as [`set`](Self::set) but counted as a renewal.
    pub fn refresh(&mut self, storage_path: impl Into<String>, url: impl Into<String>, ttl_seconds: i64) {
        self.set(storage_path, url, ttl_seconds);
        self.metrics.record_refresh();
    }

    // == Needs Refresh ==
    /// True if the entry is live and within 20% of the TTL it was written with.
    pub fn needs_refresh(&self, storage_path: &str) -> bool {
        let now = self.now_ms();
        self.entries
            .get(storage_path)
            .is_some_and(|entry| entry.needs_refresh(now))
    }

    /// True if the entry is live and within 20% of `ttl_seconds`.
    ///
    /// The caller-supplied TTL is trusted as is; prefer
    /// [`needs_refresh`](Self::needs_refresh).
    pub fn needs_refresh_with_ttl(&self, storage_path: &str, ttl_seconds: i64) -> bool {
        let now = self.now_ms();
        self.entries
            .get(storage_path)
            .is_some_and(|entry| entry.in_refresh_window(ttl_seconds, now))
    }

    // == Refresh Queries ==
    /// Live entries inside their own refresh window, soonest to expire first.
    pub fn refresh_candidates(&self) -> Vec<RefreshCandidate> {
        let now = self.now_ms();
        self.collect_candidates(|entry| entry.needs_refresh(now), now)
    }

    /// Paths of [`refresh_candidates`](Self::refresh_candidates).
    pub fn paths_needing_refresh(&self) -> Vec<String> {
        self.refresh_candidates()
            .into_iter()
            .map(|candidate| candidate.storage_path)
            .collect()
    }

    /// Paths whose entries are within 20% of `ttl_seconds`, soonest to
    /// expire first.
    pub fn paths_needing_refresh_with_ttl(&self, ttl_seconds: i64) -> Vec<String> {
        let now = self.now_ms();
        self.collect_candidates(|entry| entry.in_refresh_window(ttl_seconds, now), now)
            .into_iter()
            .map(|candidate| candidate.storage_path)
            .collect()
    }

    fn collect_candidates<F>(&self, wanted: F, now: i64) -> Vec<RefreshCandidate>
    where
        F: Fn(&CacheEntry) -> bool,
    {
        let mut candidates: Vec<RefreshCandidate> = self
            .entries
            .values()
            .filter(|entry| wanted(entry))
            .map(|entry| RefreshCandidate {
                storage_path: entry.storage_path.clone(),
                ttl_seconds: entry.ttl_seconds,
                expires_at: entry.expires_at,
                remaining_ms: entry.remaining_ms(now),
                created_at: entry.created_at,
                url: entry.url.clone(),
            })
            .collect();

        candidates.sort_by(|a, b| {
            a.remaining_ms
                .cmp(&b.remaining_ms)
                .then_with(|| a.storage_path.cmp(&b.storage_path))
        });
        candidates
    }

    // == Delete ==
    /// Removes an entry. Returns true if one was present.
    pub fn delete(&mut self, storage_path: &str) -> bool {
        self.entries.remove(storage_path).is_some()
    }

    // == Clear Expired ==
    /// Removes every entry with `expires_at <= now`.
    ///
    /// Returns the number of entries removed.
    pub fn clear_expired(&mut self) -> usize {
        let now = self.now_ms();
        let before = self.entries.len();

        self.entries.retain(|_, entry| !entry.is_expired(now));

        let removed = before - self.entries.len();
        self.metrics.evictions += removed as u64;
        removed
    }

    // == Clear ==
    /// Drops all entries and zeroes all metrics.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.metrics.reset();
    }

    // == Entry ==
    /// Looks at an entry without touching metrics or evicting it.
    pub fn entry(&self, storage_path: &str) -> Option<&CacheEntry> {
        self.entries.get(storage_path)
    }

    /// Snapshot of all entries, sorted by path.
    pub fn entries(&self) -> Vec<(String, CacheEntry)> {
        let mut entries: Vec<(String, CacheEntry)> = self
            .entries
            .iter()
            .map(|(path, entry)| (path.clone(), entry.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    // == Metrics ==
    /// Returns a copy of the current counters.
    pub fn metrics(&self) -> CacheMetrics {
        self.metrics
    }

    pub fn hit_rate(&self) -> f64 {
        self.metrics.hit_rate()
    }

    /// Zeroes the counters but keeps entries.
    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }

    // == Length ==
    /// Number of stored entries, expired ones included until swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current time on the store's clock.
    pub fn now(&self) -> i64 {
        self.now_ms()
    }
}
