/// Background task implementations
use crate::{context::AppContext, error::CaptureResult, items::SweepStats};

/// Purge every expired, unpinned item and refund its workspace quota
pub async fn run_expiry_sweep(ctx: &AppContext) -> CaptureResult<SweepStats> {
    ctx.items.sweep().await
}

/// Health check - verify the database is reachable
pub async fn health_check(ctx: &AppContext) -> CaptureResult<()> {
    sqlx::query("SELECT 1").fetch_one(&ctx.db).await?;

    Ok(())
}
