//! Signed URL Resolver
//!
//! Cache-through lookup used by request handlers: serve from the store when
//! possible, otherwise mint synchronously and remember the result. Lists of
//! paths are served from one store pass, with the misses minted in
//! concurrent batches.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use serde::Serialize;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::cache::{MetricsCollector, SharedStore};
use crate::error::{CacheError, Result};
use crate::minter::Minter;

/// A resolved URL and whether it came from the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedUrl {
    pub url: String,
    pub cached: bool,
}

/// Outcome for one path of a bulk resolve; `resolved` is None when the
/// mint failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathResolution {
    pub path: String,
    pub resolved: Option<ResolvedUrl>,
}

/// Values that are not storage paths pass through bulk conversion untouched.
pub fn is_storage_path(value: &str) -> bool {
    !value.is_empty() && !value.starts_with("http://") && !value.starts_with("https://")
}

pub struct SignedUrlResolver {
    store: SharedStore,
    minter: Arc<dyn Minter>,
    collector: Arc<MetricsCollector>,
    /// TTL in seconds for URLs minted on a miss
    ttl_seconds: i64,
    mint_timeout: Duration,
    /// Concurrent mints per batch in bulk resolves
    batch_size: usize,
}

impl SignedUrlResolver {
    pub fn new(
        store: SharedStore,
        minter: Arc<dyn Minter>,
        collector: Arc<MetricsCollector>,
        ttl_seconds: i64,
        mint_timeout: Duration,
        batch_size: usize,
    ) -> Self {
        Self {
            store,
            minter,
            collector,
            ttl_seconds,
            mint_timeout,
            batch_size: batch_size.max(1),
        }
    }

    // == Resolve ==
    /// Returns a usable signed URL for `storage_path`.
    ///
    /// Misses fall back to the minter; a failed mint is returned as an error
    /// and nothing is cached.
    pub async fn resolve(&self, storage_path: &str) -> Result<ResolvedUrl> {
        let started = Instant::now();
        let resolved = self.resolve_inner(storage_path).await;
        self.collector.record_response_time(started.elapsed()).await;
        resolved
    }

    async fn resolve_inner(&self, storage_path: &str) -> Result<ResolvedUrl> {
        if let Some(url) = self.store.write().await.get(storage_path) {
            debug!(path = storage_path, "Signed URL cache hit");
            return Ok(ResolvedUrl { url, cached: true });
        }

        debug!(path = storage_path, "Signed URL cache miss, minting");
        let url = self.mint(storage_path).await?;

        self.store
            .write()
            .await
            .set(storage_path, url.clone(), self.ttl_seconds);

        Ok(ResolvedUrl { url, cached: false })
    }

    /// Mints under the configured timeout, rejecting blank URLs. Failures
    /// are logged here.
    async fn mint(&self, storage_path: &str) -> Result<String> {
        let minted = match timeout(
            self.mint_timeout,
            self.minter.mint(storage_path, self.ttl_seconds),
        )
        .await
        {
            Ok(Ok(url)) if !url.trim().is_empty() => Ok(url),
            Ok(Ok(_)) => Err(CacheError::Mint(format!(
                "{}: empty signed URL",
                storage_path
            ))),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(CacheError::MintTimeout(storage_path.to_string())),
        };
        minted.inspect_err(|e| warn!(path = storage_path, error = %e, "Failed to mint signed URL"))
    }

    // == Bulk Resolve ==
    /// Resolves a list of paths, preserving input order.
    ///
    /// Hits come from a single pass over the store. Misses are deduplicated
    /// and minted `batch_size` at a time; failed paths come back with
    /// `resolved: None` and are not cached.
    pub async fn resolve_many(&self, storage_paths: &[String]) -> Vec<PathResolution> {
        let started = Instant::now();
        let mut resolved: HashMap<&str, ResolvedUrl> = HashMap::new();
        let mut misses: Vec<&str> = Vec::new();

        {
            let mut store = self.store.write().await;
            let mut seen = HashSet::new();
            for path in storage_paths.iter().map(String::as_str) {
                if !seen.insert(path) {
                    continue;
                }
                match store.get(path) {
                    Some(url) => {
                        resolved.insert(path, ResolvedUrl { url, cached: true });
                    }
                    None => misses.push(path),
                }
            }
        }

        let hits = resolved.len();
        let mut failed = 0;
        for batch in misses.chunks(self.batch_size) {
            let minted = join_all(batch.iter().map(|path| self.mint(path))).await;

            let mut store = self.store.write().await;
            for (path, result) in batch.iter().zip(minted) {
                match result {
                    Ok(url) => {
                        store.set(*path, url.clone(), self.ttl_seconds);
                        resolved.insert(*path, ResolvedUrl { url, cached: false });
                    }
                    Err(_) => failed += 1,
                }
            }
        }

        if !misses.is_empty() {
            info!(
                "Bulk resolve: {} hits, {} minted, {} failed",
                hits,
                misses.len() - failed,
                failed
            );
        }
        self.collector.record_response_time(started.elapsed()).await;

        storage_paths
            .iter()
            .map(|path| PathResolution {
                path: path.clone(),
                resolved: resolved.get(path.as_str()).cloned(),
            })
            .collect()
    }

    /// Replaces storage paths in `values` with signed URLs.
    ///
    /// Anything that is not a storage path is returned as-is, and a path
    /// whose mint fails falls back to its original value.
    pub async fn sign_values(&self, values: &[String]) -> Vec<String> {
        let paths: Vec<String> = values
            .iter()
            .filter(|value| is_storage_path(value))
            .cloned()
            .collect();
        let resolutions = self.resolve_many(&paths).await;
        let signed: HashMap<&str, &str> = resolutions
            .iter()
            .filter_map(|r| r.resolved.as_ref().map(|u| (r.path.as_str(), u.url.as_str())))
            .collect();

        values
            .iter()
            .map(|value| {
                signed
                    .get(value.as_str())
                    .map_or_else(|| value.clone(), |url| url.to_string())
            })
            .collect()
    }

    // == Invalidate ==
    /// Drops the cached URL for `storage_path`. Returns true if one was cached.
    pub async fn invalidate(&self, storage_path: &str) -> bool {
        self.store.write().await.delete(storage_path)
    }
}
