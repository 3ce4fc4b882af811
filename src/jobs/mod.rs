use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{error, info};

pub mod tasks;

/// Job scheduler for background tasks
pub struct JobScheduler {
    context: Arc<crate::context::AppContext>,
}

impl JobScheduler {
    pub fn new(context: Arc<crate::context::AppContext>) -> Self {
        Self { context }
    }

    /// Start all background jobs
    pub fn start(self: Arc<Self>) {
        info!("Starting background job scheduler");

        if self.context.config.sweep.enabled {
            tokio::spawn(Self::expiry_sweep_job(Arc::clone(&self)));
        } else {
            info!("Expiry sweep disabled; relying on the external cleanup trigger");
        }

        tokio::spawn(Self::health_check_job(Arc::clone(&self)));

        info!("Background jobs started");
    }

    /// Purge expired items on the configured interval
    async fn expiry_sweep_job(scheduler: Arc<Self>) {
        let period = Duration::from_secs(scheduler.context.config.sweep.interval_seconds);
        let mut interval = interval(period);

        loop {
            interval.tick().await;

            match tasks::run_expiry_sweep(&scheduler.context).await {
                Ok(stats) => {
                    if stats.items_deleted > 0 || stats.failures > 0 {
                        info!(
                            "Expiry sweep: {} items, {} files, {} bytes freed, {} failures",
                            stats.items_deleted,
                            stats.files_deleted,
                            stats.bytes_freed,
                            stats.failures
                        );
                    }
                }
                Err(e) => error!("Expiry sweep failed: {}", e),
            }
        }
    }

    /// Health check job (runs every 5 minutes)
    async fn health_check_job(scheduler: Arc<Self>) {
        let mut interval = interval(Duration::from_secs(300));

        loop {
            interval.tick().await;

            match tasks::health_check(&scheduler.context).await {
                Ok(_) => {
                    // Silent success - health is good
                }
                Err(e) => error!("Health check failed: {}", e),
            }
        }
    }
}
