mod api_doc;
mod app;
mod config;
mod dispatch;
mod error;
mod handlers;
mod models;
mod routes;
mod spanner;
mod state;
mod store;

use anyhow::Context;
use config::{Config, StorageBackend};
use spanner::SpannerStore;
use state::AppState;
use std::sync::Arc;
use store::{KvStore, MemoryStore};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    tracing::info!("kv-proxy starting");

    let config = Config::from_env()?;
    config.log_startup();

    let store: Arc<dyn KvStore> = match &config.storage_backend {
        StorageBackend::Spanner(spanner) => Arc::new(SpannerStore::from_config(spanner).await?),
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory store; records will be lost on shutdown");
            Arc::new(MemoryStore::new())
        }
    };

    let app = app::build_router(AppState { store });

    let addr = format!("{}:{}", config.service_host, config.service_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("kv-proxy stopped");
    Ok(())
}

/// Resolves on SIGINT (Ctrl-C) or, on Unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("Shutdown signal received, draining connections");
}
