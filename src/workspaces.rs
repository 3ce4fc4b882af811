/// Workspace and membership read model
///
/// Workspace and member CRUD happens outside this service; these reads are
/// what the permission gate and the quota ledger need. Absent membership
/// reads as NotFound so non-members cannot probe workspace existence.
use crate::{
    error::{CaptureError, CaptureResult},
    permissions::Role,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

/// A tenant boundary owning items, quota, and membership
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub tier: String,
    pub storage_used_bytes: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct WorkspaceStore {
    db: SqlitePool,
}

impl WorkspaceStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Load a workspace by id
    pub async fn get(&self, workspace_id: &str) -> CaptureResult<Workspace> {
        let row = sqlx::query(
            r#"
            SELECT id, name, owner_id, tier, storage_used_bytes, created_at
            FROM workspace
            WHERE id = ?1
            "#,
        )
        .bind(workspace_id)
        .fetch_optional(&self.db)
        .await?;

        let row = row.ok_or_else(|| {
            CaptureError::NotFound(format!("Workspace not found: {}", workspace_id))
        })?;

        Ok(Workspace {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            owner_id: row.try_get("owner_id")?,
            tier: row.try_get("tier")?,
            storage_used_bytes: row.try_get("storage_used_bytes")?,
            created_at: row.try_get("created_at")?,
        })
    }

    /// Resolve the caller's role in a workspace
    pub async fn member_role(&self, workspace_id: &str, user_id: &str) -> CaptureResult<Role> {
        let row = sqlx::query(
            "SELECT role FROM workspace_member WHERE workspace_id = ?1 AND user_id = ?2",
        )
        .bind(workspace_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        let row = row.ok_or_else(|| {
            CaptureError::NotFound(format!("Workspace not found: {}", workspace_id))
        })?;

        let role: String = row.try_get("role")?;
        Role::from_str(&role)
    }
}
