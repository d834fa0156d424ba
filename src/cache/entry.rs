//! Cache Entry Module
//!
//! Defines one cached signed URL together with the TTL it was written with.

use serde::Serialize;

use crate::cache::REFRESH_THRESHOLD_PERCENT;

// == Cache Entry ==
/// A cached signed URL and its expiry metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheEntry {
    /// Storage path the URL grants access to
    pub storage_path: String,
    /// The signed URL
    pub url: String,
    /// Write timestamp (Unix milliseconds)
    pub created_at: i64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: i64,
    /// TTL in seconds the entry was written with
    pub ttl_seconds: i64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry written at `now_ms` that lives for `ttl_seconds`.
    ///
    /// A non-positive TTL yields an entry that is already expired.
    pub fn new(
        storage_path: impl Into<String>,
        url: impl Into<String>,
        ttl_seconds: i64,
        now_ms: i64,
    ) -> Self {
        Self {
            storage_path: storage_path.into(),
            url: url.into(),
            created_at: now_ms,
            expires_at: now_ms.saturating_add(ttl_seconds.saturating_mul(1000)),
            ttl_seconds,
        }
    }

    // == Is Expired ==
    /// An entry is expired once `now >= expires_at`.
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at
    }

    // == Time Remaining ==
    /// Milliseconds until expiry. Negative once expired.
    pub fn remaining_ms(&self, now_ms: i64) -> i64 {
        self.expires_at.saturating_sub(now_ms)
    }

    // == Refresh Window ==
    /// True when the entry is still valid but has no more than 20% of
    /// `ttl_seconds` left.
    pub fn in_refresh_window(&self, ttl_seconds: i64, now_ms: i64) -> bool {
        let remaining = self.remaining_ms(now_ms);
        let ttl_ms = ttl_seconds.saturating_mul(1000);

        remaining > 0
            && remaining.saturating_mul(100) <= ttl_ms.saturating_mul(REFRESH_THRESHOLD_PERCENT)
    }

    /// Same as [`in_refresh_window`](Self::in_refresh_window) with the
    /// entry's own TTL.
    pub fn needs_refresh(&self, now_ms: i64) -> bool {
        self.in_refresh_window(self.ttl_seconds, now_ms)
    }
}
