/// Application context and dependency injection
use crate::{
    activity::ActivityLog,
    config::ServerConfig,
    db,
    error::CaptureResult,
    file_store::{disk::DiskFileBackend, FileBackend},
    items::ItemStore,
    quota::QuotaLedger,
    signed_url::UrlSigner,
    tiers::{StaticTierProvider, TierLimitProvider},
    workspaces::WorkspaceStore,
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    pub workspaces: WorkspaceStore,
    pub items: ItemStore,
    pub quota: QuotaLedger,
    pub signer: UrlSigner,
    pub tiers: Arc<dyn TierLimitProvider>,
    pub activity: ActivityLog,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> CaptureResult<Self> {
        // Validate configuration
        config.validate()?;

        // Create data directories if they don't exist
        Self::ensure_directories(&config).await?;

        // Initialize database
        let pool = db::create_pool(&config.storage.database, db::DatabaseOptions::default()).await?;
        db::run_migrations(&pool).await?;
        db::test_connection(&pool).await?;

        // File storage backend
        let backend: Arc<dyn FileBackend> =
            Arc::new(DiskFileBackend::new(config.storage.files_directory.clone()));

        let quota = QuotaLedger::new(pool.clone());
        let items = ItemStore::new(pool.clone(), backend, quota.clone());
        let workspaces = WorkspaceStore::new(pool.clone());
        let activity = ActivityLog::new(pool.clone());
        let signer = UrlSigner::new(&config.access.url_signing_secret);
        let tiers: Arc<dyn TierLimitProvider> = Arc::new(StaticTierProvider);

        Ok(Self {
            config: Arc::new(config),
            db: pool,
            workspaces,
            items,
            quota,
            signer,
            tiers,
            activity,
        })
    }

    /// Ensure required directories exist
    async fn ensure_directories(config: &ServerConfig) -> CaptureResult<()> {
        tokio::fs::create_dir_all(&config.storage.data_directory).await?;
        tokio::fs::create_dir_all(&config.storage.files_directory).await?;

        Ok(())
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}
