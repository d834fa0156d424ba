//! Minter Module
//!
//! Abstraction over the storage provider's signed URL issuance.

use async_trait::async_trait;

use crate::error::Result;

#[cfg(test)]
pub mod mock;
pub mod storage;

#[cfg(test)]
pub use mock::MockMinter;
pub use storage::StorageMinter;

/// Issues signed URLs for storage paths.
#[async_trait]
pub trait Minter: Send + Sync {
    /// Returns a fresh signed URL for `storage_path` valid for `ttl_seconds`.
    ///
    /// Errors are opaque to callers; the refresh job counts them as
    /// failures and the resolver passes them on.
    async fn mint(&self, storage_path: &str, ttl_seconds: i64) -> Result<String>;
}
