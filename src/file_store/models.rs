/// File asset records
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata for a stored file asset
///
/// Exclusively owned by at most one item; the asset record, its bytes, and
/// the owning item's reference live and die together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileAsset {
    pub id: String,
    pub workspace_id: String,
    pub uploader_id: String,
    pub filename: String,
    pub storage_path: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
}
