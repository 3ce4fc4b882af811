/// Configuration management for Dropnest
use crate::error::{CaptureError, CaptureResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub access: AccessConfig,
    pub sweep: SweepConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub database: PathBuf,
    pub files_directory: PathBuf,
}

/// Signed-URL and cleanup-secret configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Secret keying the HMAC over download tokens
    pub url_signing_secret: String,
    /// Lifetime of minted download links, in seconds
    pub download_ttl_seconds: u64,
    /// Shared secret authenticating the cleanup trigger endpoint
    pub cleanup_secret: String,
}

/// Expiry sweep configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    pub enabled: bool,
    pub interval_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> CaptureResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("DROPNEST_HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("DROPNEST_PORT")
            .unwrap_or_else(|_| "8710".to_string())
            .parse()
            .map_err(|_| CaptureError::Validation("Invalid port number".to_string()))?;

        let data_directory: PathBuf = env::var("DROPNEST_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let database = env::var("DROPNEST_DB_LOCATION")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("dropnest.sqlite"));
        let files_directory = env::var("DROPNEST_FILES_DIRECTORY")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("files"));

        let url_signing_secret = env::var("DROPNEST_URL_SIGNING_SECRET")
            .map_err(|_| CaptureError::Validation("URL signing secret required".to_string()))?;
        let download_ttl_seconds = env::var("DROPNEST_DOWNLOAD_TTL_SECONDS")
            .unwrap_or_else(|_| "900".to_string())
            .parse()
            .unwrap_or(900);
        let cleanup_secret = env::var("DROPNEST_CLEANUP_SECRET")
            .map_err(|_| CaptureError::Validation("Cleanup secret required".to_string()))?;

        let sweep_enabled = env::var("DROPNEST_SWEEP_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);
        let sweep_interval = env::var("DROPNEST_SWEEP_INTERVAL_SECONDS")
            .unwrap_or_else(|_| "300".to_string())
            .parse()
            .unwrap_or(300);

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(ServerConfig {
            service: ServiceConfig { hostname, port },
            storage: StorageConfig {
                data_directory,
                database,
                files_directory,
            },
            access: AccessConfig {
                url_signing_secret,
                download_ttl_seconds,
                cleanup_secret,
            },
            sweep: SweepConfig {
                enabled: sweep_enabled,
                interval_seconds: sweep_interval,
            },
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> CaptureResult<()> {
        if self.service.hostname.is_empty() {
            return Err(CaptureError::Validation(
                "Hostname cannot be empty".to_string(),
            ));
        }

        if self.access.url_signing_secret.len() < 32 {
            return Err(CaptureError::Validation(
                "URL signing secret must be at least 32 characters".to_string(),
            ));
        }

        if self.access.cleanup_secret.len() < 16 {
            return Err(CaptureError::Validation(
                "Cleanup secret must be at least 16 characters".to_string(),
            ));
        }

        Ok(())
    }
}
