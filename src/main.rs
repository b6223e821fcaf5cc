//! Offline Cache - a caching proxy for an offline-capable web app
//!
//! Classifies every request, serves static assets cache-first and API
//! calls network-first, pre-warms static assets at install and sweeps
//! stale entries in the background.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use offline_cache::api::create_router;
use offline_cache::cache::MemoryStorage;
use offline_cache::fetch::HttpFetcher;
use offline_cache::tasks::{spawn_janitor_task, SWEEP_INTERVAL};
use offline_cache::{AppState, Config, ServiceWorker};

/// Main entry point for the offline cache proxy.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the worker over in-memory partitions and an HTTP fetcher
/// 4. Install (pre-warm static files) and activate (drop orphan partitions)
/// 5. Start the background janitor
/// 6. Serve the proxy router on the configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "offline_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting offline cache proxy");

    let config = Config::from_env();
    info!(
        "Configuration loaded: origin={}, port={}, manifest={:?}",
        config.origin_url, config.server_port, config.manifest_path
    );

    let worker = ServiceWorker::from_config(
        &config,
        Arc::new(MemoryStorage::new()),
        Arc::new(HttpFetcher::new()),
    )
    .context("failed to build worker")?;

    let report = worker.install().await;
    if !report.failed.is_empty() {
        warn!("Install finished with {} uncached files", report.failed.len());
    }
    worker.activate().await;

    let janitor_handle = spawn_janitor_task(worker.storage(), worker.stats(), SWEEP_INTERVAL);
    info!("Background janitor started");

    let state = AppState::new(worker);
    let app = create_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Proxy listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(janitor_handle))
        .await
        .context("server error")?;

    state.worker.settle().await;
    info!("Proxy shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the janitor and allows graceful shutdown.
async fn shutdown_signal(janitor_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
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

    janitor_handle.abort();
    warn!("Janitor aborted");
}
