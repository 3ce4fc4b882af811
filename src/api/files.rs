/// File upload and signed-URL download endpoints
use crate::{
    auth::Actor,
    context::AppContext,
    error::{CaptureError, CaptureResult},
    items::NewDrop,
    permissions,
};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

/// Build file routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/workspaces/:workspace_id/drops", post(upload_drop))
        .route("/files/:file_id", get(download_file))
}

#[derive(Debug, Deserialize)]
struct UploadParams {
    filename: String,
    title: Option<String>,
    /// Comma-separated tag list
    tags: Option<String>,
    ttl_seconds: Option<i64>,
}

/// Upload a file as a new drop item
///
/// Accepts raw binary data in the request body with a Content-Type header;
/// the filename rides in the query string.
async fn upload_drop(
    State(ctx): State<AppContext>,
    Path(workspace_id): Path<String>,
    actor: Actor,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> CaptureResult<impl IntoResponse> {
    let role = ctx.workspaces.member_role(&workspace_id, &actor.user_id).await?;
    permissions::check_item_access(role, true)?;

    let workspace = ctx.workspaces.get(&workspace_id).await?;
    let limits = ctx.tiers.limits_for(&workspace.tier);

    let mime_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let tags = params
        .tags
        .map(|raw| raw.split(',').map(String::from).collect())
        .unwrap_or_default();

    let item = ctx
        .items
        .create_drop(
            &workspace,
            &limits,
            &actor.user_id,
            NewDrop {
                title: params.title.unwrap_or_default(),
                filename: params.filename,
                mime_type,
                data: body.to_vec(),
                tags,
                ttl_seconds: params.ttl_seconds,
            },
        )
        .await?;

    ctx.activity
        .record(&workspace_id, &actor.user_id, "item.upload", Some(&item.id), None)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(super::items::item_response(&ctx, item).await?),
    ))
}

#[derive(Debug, Deserialize)]
struct DownloadParams {
    token: Option<String>,
    expires: Option<String>,
}

/// Serve a file through its signed URL
///
/// The token is the sole gate: no session, no membership lookup. Every
/// verification failure (missing parameters, malformed expiry, expired
/// link, bad tag) yields the same unauthorized response.
async fn download_file(
    State(ctx): State<AppContext>,
    Path(file_id): Path<String>,
    Query(params): Query<DownloadParams>,
) -> CaptureResult<Response> {
    let (Some(token), Some(expires)) = (params.token, params.expires) else {
        return Err(CaptureError::Unauthorized);
    };

    if !ctx.signer.verify(&file_id, &token, &expires) {
        return Err(CaptureError::Unauthorized);
    }

    let asset = ctx
        .items
        .asset(&file_id)
        .await?
        .ok_or_else(|| CaptureError::NotFound(format!("File not found: {}", file_id)))?;

    let data = ctx
        .items
        .asset_bytes(&asset)
        .await?
        .ok_or_else(|| CaptureError::NotFound(format!("File not found: {}", file_id)))?;

    let disposition = format!(
        "inline; filename=\"{}\"",
        asset.filename.replace('"', "'")
    );

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, asset.mime_type)
        .header(header::CONTENT_LENGTH, data.len().to_string())
        .header(header::CONTENT_DISPOSITION, disposition)
        .header(header::CACHE_CONTROL, "private, max-age=60")
        .body(axum::body::Body::from(data))
        .unwrap())
}
