/// Unified error types for the Dropnest capture service
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the service
#[derive(Error, Debug)]
pub enum CaptureError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Caller identity missing or unusable
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Permission check failed; carries the missing capability name
    #[error("Missing capability: {capability}")]
    Forbidden { capability: &'static str },

    /// Upload would exceed the workspace tier's storage ceiling
    #[error("Storage quota exceeded: {requested} bytes requested, {limit} bytes allowed")]
    QuotaExceeded { requested: i64, limit: i64 },

    /// Signed download link failed verification or expired
    #[error("Invalid or expired download link")]
    Unauthorized,

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict errors (e.g., trashing an already-trashed item)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Backing file store errors
    #[error("File storage error: {0}")]
    Storage(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Structured error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Convert CaptureError to HTTP response
impl IntoResponse for CaptureError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            CaptureError::Authentication(_) => (
                StatusCode::UNAUTHORIZED,
                "AuthenticationRequired",
                self.to_string(),
            ),
            CaptureError::Forbidden { .. } => {
                (StatusCode::FORBIDDEN, "Forbidden", self.to_string())
            }
            CaptureError::QuotaExceeded { .. } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "QuotaExceeded",
                self.to_string(),
            ),
            // Expired and forged links are deliberately indistinguishable
            CaptureError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "InvalidDownloadLink",
                self.to_string(),
            ),
            CaptureError::Validation(_) => {
                (StatusCode::BAD_REQUEST, "InvalidRequest", self.to_string())
            }
            CaptureError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound", self.to_string()),
            CaptureError::Conflict(_) => (StatusCode::CONFLICT, "Conflict", self.to_string()),
            CaptureError::Database(_)
            | CaptureError::Storage(_)
            | CaptureError::Internal(_)
            | CaptureError::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalServerError",
                "Internal server error".to_string(), // Don't leak details
            ),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for service operations
pub type CaptureResult<T> = Result<T, CaptureError>;
