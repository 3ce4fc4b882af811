/// Item records and request payloads
use crate::error::{CaptureError, CaptureResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of captured item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Drop,
    Link,
    Note,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Drop => "drop",
            ItemKind::Link => "link",
            ItemKind::Note => "note",
        }
    }

    pub fn from_str(s: &str) -> CaptureResult<Self> {
        match s {
            "drop" => Ok(ItemKind::Drop),
            "link" => Ok(ItemKind::Link),
            "note" => Ok(ItemKind::Note),
            _ => Err(CaptureError::Validation(format!("Invalid item kind: {}", s))),
        }
    }
}

/// A captured item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub workspace_id: String,
    pub owner_id: String,
    pub kind: ItemKind,
    pub title: String,
    pub body: Option<String>,
    pub tags: Vec<String>,
    pub pinned: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub file_id: Option<String>,
    pub trashed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    pub fn is_trashed(&self) -> bool {
        self.trashed_at.is_some()
    }
}

/// Payload for creating a note or link item
#[derive(Debug, Clone, Deserialize)]
pub struct NewItem {
    pub kind: ItemKind,
    pub title: String,
    pub body: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub ttl_seconds: Option<i64>,
}

/// Payload for creating a drop item backed by an uploaded file
#[derive(Debug, Clone)]
pub struct NewDrop {
    pub title: String,
    pub filename: String,
    pub mime_type: Option<String>,
    pub data: Vec<u8>,
    pub tags: Vec<String>,
    pub ttl_seconds: Option<i64>,
}

/// Outcome of a purge request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeOutcome {
    Purged { bytes_freed: i64 },
    /// The id no longer exists; a retried purge is a success, not an error
    AlreadyGone,
}

/// Aggregate counts returned by an expiry sweep
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SweepStats {
    pub items_deleted: u64,
    pub files_deleted: u64,
    pub bytes_freed: i64,
    pub failures: u64,
}

/// Normalize a tag set: trim, lowercase, drop empties, dedup
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !tag.contains(',') && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

/// Tags are stored as a comma-joined string on the item row
pub fn join_tags(tags: &[String]) -> String {
    tags.join(",")
}

pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}
