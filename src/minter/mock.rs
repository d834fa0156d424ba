//! Mock minter for testing
//!
//! Configure failing paths, blank answers and latency via builder methods,
//! then inspect the recorded calls.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::Minter;
use crate::error::{CacheError, Result};

/// Mock minter answering `https://mock.storage/{path}?v={n}`.
#[derive(Default)]
pub struct MockMinter {
    /// Paths that answer with an error
    failing: HashSet<String>,
    /// Paths that answer with an empty URL
    blank: HashSet<String>,
    /// Delay before every answer
    delay: Option<Duration>,
    /// Monotonic version stamped into every URL
    version: AtomicUsize,
    /// Captured (path, ttl) pairs
    calls: Arc<Mutex<Vec<(String, i64)>>>,
}

impl MockMinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, path: impl Into<String>) -> Self {
        self.failing.insert(path.into());
        self
    }

    pub fn blank_on(mut self, path: impl Into<String>) -> Self {
        self.blank.insert(path.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn calls(&self) -> Vec<(String, i64)> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

#[async_trait]
impl Minter for MockMinter {
    async fn mint(&self, storage_path: &str, ttl_seconds: i64) -> Result<String> {
        self.calls
            .lock()
            .await
            .push((storage_path.to_string(), ttl_seconds));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.contains(storage_path) {
            return Err(CacheError::Mint(format!("{}: object not found", storage_path)));
        }
        if self.blank.contains(storage_path) {
            return Ok(String::new());
        }

        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("https://mock.storage/{}?v={}", storage_path, version))
    }
}
