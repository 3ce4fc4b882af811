/// Disk-based file storage backend
use crate::{
    error::{CaptureError, CaptureResult},
    file_store::FileBackend,
};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

/// Disk storage backend
///
/// Stores asset bytes on the local filesystem under the configured base
/// directory, at the sharded storage-relative paths generated when the
/// asset record is created.
#[derive(Clone)]
pub struct DiskFileBackend {
    base_path: PathBuf,
}

impl DiskFileBackend {
    /// Create a new disk storage backend
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }
}

#[async_trait]
impl FileBackend for DiskFileBackend {
    async fn put(&self, path: &str, data: Vec<u8>) -> CaptureResult<()> {
        let file_path = self.resolve(path);

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                CaptureError::Storage(format!("Failed to create asset directory: {}", e))
            })?;
        }

        fs::write(&file_path, data)
            .await
            .map_err(|e| CaptureError::Storage(format!("Failed to write asset {}: {}", path, e)))?;

        Ok(())
    }

    async fn get(&self, path: &str) -> CaptureResult<Option<Vec<u8>>> {
        let file_path = self.resolve(path);

        match fs::read(&file_path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CaptureError::Storage(format!(
                "Failed to read asset {}: {}",
                path, e
            ))),
        }
    }

    async fn delete(&self, path: &str) -> CaptureResult<()> {
        let file_path = self.resolve(path);

        match fs::remove_file(&file_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CaptureError::Storage(format!(
                "Failed to delete asset {}: {}",
                path, e
            ))),
        }
    }

    async fn exists(&self, path: &str) -> CaptureResult<bool> {
        Ok(self.resolve(path).exists())
    }

    async fn size(&self, path: &str) -> CaptureResult<Option<u64>> {
        let file_path = self.resolve(path);

        match fs::metadata(&file_path).await {
            Ok(metadata) => Ok(Some(metadata.len())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CaptureError::Storage(format!(
                "Failed to stat asset {}: {}",
                path, e
            ))),
        }
    }
}
