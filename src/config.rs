use anyhow::{bail, Context, Result};
use std::env;

/// Connection settings for the Spanner-backed store
#[derive(Debug, Clone, PartialEq)]
pub struct SpannerConfig {
    pub emulator_host: Option<String>,
    pub project: String,
    pub instance: String,
    pub database: String,
}

/// Where records are kept
#[derive(Debug, Clone, PartialEq)]
pub enum StorageBackend {
    Spanner(SpannerConfig),
    /// Process-local map; records are lost on restart
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub storage_backend: StorageBackend,
    pub service_port: u16,
    pub service_host: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let backend = env::var("STORAGE_BACKEND").unwrap_or_else(|_| "spanner".to_string());

        let storage_backend = match backend.as_str() {
            "spanner" => StorageBackend::Spanner(SpannerConfig::from_env()?),
            "memory" => StorageBackend::Memory,
            other => bail!("STORAGE_BACKEND must be 'spanner' or 'memory', got '{}'", other),
        };

        let service_port = env::var("SERVICE_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("SERVICE_PORT must be a valid port number (0-65535)")?;

        let service_host = env::var("SERVICE_HOST")
            .unwrap_or_else(|_| "0.0.0.0".to_string());

        Ok(Config {
            storage_backend,
            service_port,
            service_host,
        })
    }

    pub fn log_startup(&self) {
        tracing::info!("Configuration loaded:");
        match &self.storage_backend {
            StorageBackend::Spanner(spanner) => {
                tracing::info!("  Storage backend: spanner");
                tracing::info!("  Spanner emulator: {}",
                    spanner.emulator_host.as_deref().unwrap_or("disabled (using production)"));
                tracing::info!("  Spanner project: {}", spanner.project);
                tracing::info!("  Spanner instance: {}", spanner.instance);
                tracing::info!("  Spanner database: {}", spanner.database);
            }
            StorageBackend::Memory => {
                tracing::info!("  Storage backend: memory (records are not persisted)");
            }
        }
        tracing::info!("  Service listening on: {}:{}", self.service_host, self.service_port);
    }
}

impl SpannerConfig {
    fn from_env() -> Result<Self> {
        let emulator_host = env::var("SPANNER_EMULATOR_HOST").ok();

        let project = env::var("SPANNER_PROJECT")
            .context("SPANNER_PROJECT environment variable is required")?;

        let instance = env::var("SPANNER_INSTANCE")
            .context("SPANNER_INSTANCE environment variable is required")?;

        let database = env::var("SPANNER_DATABASE")
            .context("SPANNER_DATABASE environment variable is required")?;

        Ok(SpannerConfig {
            emulator_host,
            project,
            instance,
            database,
        })
    }
}
