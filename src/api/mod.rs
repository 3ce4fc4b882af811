/// API routes and handlers
pub mod admin;
pub mod files;
pub mod items;

use crate::context::AppContext;
use axum::Router;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(items::routes())
        .merge(files::routes())
        .merge(admin::routes())
}
