//! Signed URL Cache - proactive TTL cache for object-storage signed URLs
//!
//! Caches short-lived signed URLs by storage path and renews them in the
//! background before they expire.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod minter;
pub mod models;
pub mod resolver;
pub mod tasks;

pub use api::AppState;
pub use cache::{MetricsCollector, SharedStore, SignedUrlStore};
pub use config::Config;
pub use error::{CacheError, Result};
pub use minter::{Minter, StorageMinter};
pub use resolver::{PathResolution, ResolvedUrl, SignedUrlResolver};
pub use tasks::{spawn_refresh_task, RefreshConfig, RefreshJob, RefreshResult};
