/// File asset storage
///
/// Holds the binary bytes behind drop-type items. Assets are row-addressed:
/// every asset record carries a generated storage-relative path, and the
/// backend deals only in those paths.

pub mod disk;
pub mod models;

pub use models::FileAsset;

use crate::error::CaptureResult;
use async_trait::async_trait;

/// Backing store for file bytes
///
/// Implementations handle the actual storage and retrieval of asset data.
#[async_trait]
pub trait FileBackend: Send + Sync {
    /// Store bytes at a storage-relative path
    async fn put(&self, path: &str, data: Vec<u8>) -> CaptureResult<()>;

    /// Retrieve bytes by path
    async fn get(&self, path: &str) -> CaptureResult<Option<Vec<u8>>>;

    /// Delete bytes by path; deleting an absent path is Ok so a retried
    /// purge stays idempotent
    async fn delete(&self, path: &str) -> CaptureResult<()>;

    /// Check whether a path exists
    async fn exists(&self, path: &str) -> CaptureResult<bool>;

    /// Size of the stored bytes, if present
    async fn size(&self, path: &str) -> CaptureResult<Option<u64>>;
}

/// Generate the storage-relative path for a new asset
///
/// Uses directory sharding: {first2chars}/{asset_id}, keeping any single
/// directory from accumulating every file in the workspace fleet.
pub fn storage_path_for(asset_id: &str) -> String {
    if asset_id.len() >= 2 {
        format!("{}/{}", &asset_id[0..2], asset_id)
    } else {
        format!("_/{}", asset_id)
    }
}
