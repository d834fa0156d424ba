//! Signed URL Cache server
//!
//! Serves signed URLs through the cache and keeps them fresh in the
//! background.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use signed_url_cache::api::create_router;
use signed_url_cache::{spawn_refresh_task, AppState, Config, StorageMinter};

/// Main entry point for the signed URL cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the storage minter and application state
/// 4. Start background refresh task
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "signed_url_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Signed URL Cache Server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: default_ttl={}s, refresh_interval={}s, batch_size={}, mint_timeout={}s, port={}",
        config.default_ttl,
        config.refresh_interval,
        config.refresh_batch_size,
        config.mint_timeout,
        config.server_port
    );
    if config.cron_secret.is_none() {
        warn!("CRON_SECRET is not set, admin endpoints are unauthenticated");
    }

    let storage_url = config
        .storage_url
        .clone()
        .context("STORAGE_URL must be set")?;
    let service_key = config
        .storage_service_key
        .clone()
        .context("STORAGE_SERVICE_KEY must be set")?;
    let minter = StorageMinter::new(storage_url, config.storage_bucket.clone(), service_key)?;

    let state = AppState::from_config(&config, Arc::new(minter));
    info!("Signed URL store initialized");

    let refresh_handle = spawn_refresh_task(state.refresh_job.clone(), config.refresh_interval);
    info!("Background refresh task started");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(refresh_handle))
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the refresh task and allows graceful shutdown.
async fn shutdown_signal(refresh_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    refresh_handle.abort();
    warn!("Refresh task aborted");
}
