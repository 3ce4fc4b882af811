/// Workspace activity log
///
/// Side-effect write on mutating operations. Nothing in the core reads
/// these rows back; item state is never reconstructed from them.
use crate::error::CaptureResult;
use chrono::Utc;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct ActivityLog {
    db: SqlitePool,
}

impl ActivityLog {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn record(
        &self,
        workspace_id: &str,
        actor_id: &str,
        action: &str,
        item_id: Option<&str>,
        detail: Option<&str>,
    ) -> CaptureResult<()> {
        sqlx::query(
            r#"
            INSERT INTO activity_log (workspace_id, actor_id, action, item_id, detail, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(workspace_id)
        .bind(actor_id)
        .bind(action)
        .bind(item_id)
        .bind(detail)
        .bind(Utc::now())
        .execute(&self.db)
        .await?;

        Ok(())
    }
}
