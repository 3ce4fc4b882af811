/// Caller identity extraction
///
/// Authentication itself happens upstream; by the time a request reaches
/// this service the auth layer has resolved the session and installed the
/// caller's id in the `X-User-Id` header. Membership and capability checks
/// against that id are this service's job.
use crate::error::CaptureError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = CaptureError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                CaptureError::Authentication("Missing X-User-Id header".to_string())
            })?;

        Ok(Actor {
            user_id: user_id.to_string(),
        })
    }
}
