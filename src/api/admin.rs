/// Privileged maintenance endpoints
use crate::{context::AppContext, error::{CaptureError, CaptureResult}};
use axum::{
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

pub const CLEANUP_SECRET_HEADER: &str = "x-cleanup-secret";

/// Build admin routes
pub fn routes() -> Router<AppContext> {
    Router::new().route("/internal/sweep", post(trigger_sweep))
}

/// Run one expiry sweep
///
/// Shared-secret authenticated; meant to be invoked by an external
/// scheduler, not a user.
async fn trigger_sweep(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> CaptureResult<impl IntoResponse> {
    let secret = headers
        .get(CLEANUP_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if secret.is_empty() || secret != ctx.config.access.cleanup_secret {
        return Err(CaptureError::Authentication(
            "Invalid cleanup secret".to_string(),
        ));
    }

    let stats = ctx.items.sweep().await?;

    tracing::info!(
        "Sweep via trigger: {} items, {} files, {} bytes freed, {} failures",
        stats.items_deleted,
        stats.files_deleted,
        stats.bytes_freed,
        stats.failures
    );

    Ok(Json(stats))
}
