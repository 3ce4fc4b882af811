/// Per-workspace storage quota ledger
///
/// `storage_used_bytes` on the workspace row is a cached aggregate, kept
/// consistent by routing every byte of growth and shrinkage through this
/// ledger. The reserve is a single conditional UPDATE so two concurrent
/// uploads can never both pass a stale read and jointly overshoot the
/// ceiling; the release is floored at zero to tolerate a retried cleanup
/// releasing twice.
use crate::error::{CaptureError, CaptureResult};
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct QuotaLedger {
    db: SqlitePool,
}

impl QuotaLedger {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Atomically charge `bytes` against the workspace, failing with
    /// `QuotaExceeded` (counter untouched) when the ceiling would be
    /// crossed. The ceiling is supplied by the caller's tier lookup.
    pub async fn reserve(&self, workspace_id: &str, bytes: i64, limit: i64) -> CaptureResult<()> {
        if bytes < 0 {
            return Err(CaptureError::Validation(
                "Cannot reserve a negative byte count".to_string(),
            ));
        }
        if bytes == 0 {
            return Ok(());
        }

        let result = sqlx::query(
            r#"
            UPDATE workspace
            SET storage_used_bytes = storage_used_bytes + ?2
            WHERE id = ?1 AND storage_used_bytes + ?2 <= ?3
            "#,
        )
        .bind(workspace_id)
        .bind(bytes)
        .bind(limit)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        // Distinguish a missing workspace from a full one
        self.usage(workspace_id).await?;
        Err(CaptureError::QuotaExceeded {
            requested: bytes,
            limit,
        })
    }

    /// Unconditionally refund `bytes`, floored at zero
    pub async fn release(&self, workspace_id: &str, bytes: i64) -> CaptureResult<()> {
        if bytes <= 0 {
            return Ok(());
        }

        sqlx::query(
            r#"
            UPDATE workspace
            SET storage_used_bytes = MAX(storage_used_bytes - ?2, 0)
            WHERE id = ?1
            "#,
        )
        .bind(workspace_id)
        .bind(bytes)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Read the cached aggregate
    pub async fn usage(&self, workspace_id: &str) -> CaptureResult<i64> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT storage_used_bytes FROM workspace WHERE id = ?1")
                .bind(workspace_id)
                .fetch_optional(&self.db)
                .await?;

        row.map(|(used,)| used)
            .ok_or_else(|| CaptureError::NotFound(format!("Workspace not found: {}", workspace_id)))
    }
}
