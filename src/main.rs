/// Dropnest - Multi-tenant capture service
///
/// Users drop files, links, and notes into shared workspaces. Items carry
/// a TTL, can be pinned or trashed, and are purged by an expiry sweep;
/// files are served only through time-limited signed URLs, and storage is
/// metered per workspace against its subscription tier.

mod activity;
mod api;
mod auth;
mod config;
mod context;
mod db;
mod error;
mod file_store;
mod items;
mod jobs;
mod permissions;
mod quota;
mod server;
mod signed_url;
mod tiers;
mod workspaces;

use config::ServerConfig;
use context::AppContext;
use error::CaptureResult;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> CaptureResult<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dropnest=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = ServerConfig::from_env()?;

    // Create application context
    let ctx = Arc::new(AppContext::new(config).await?);

    // Start background jobs
    let scheduler = Arc::new(jobs::JobScheduler::new(Arc::clone(&ctx)));
    scheduler.start();

    // Start server
    server::serve((*ctx).clone()).await?;

    Ok(())
}
