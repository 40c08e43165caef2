use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};

use fraudr::api::{create_router, AppState};
use fraudr::config::Config;
use fraudr::engine::ThresholdStore;
use fraudr::observability::{init_tracing, MetricsRegistry};
use fraudr::orchestrator::Orchestrator;
use fraudr::policy::{PolicyLoader, PolicyWatcher};
use fraudr::scoring::{load_model, ModelFile};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse configuration
    let config = Config::parse();

    // Initialize tracing
    init_tracing(&config.log_level, config.log_json);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting fraudr decision service"
    );

    let metrics = Arc::new(MetricsRegistry::new());
    let store = Arc::new(ThresholdStore::default());

    // Start policy watcher (built-in policy when no file is configured)
    let policy_handle = match &config.policy_path {
        Some(path) => {
            let watcher = PolicyWatcher::new(
                PolicyLoader::new(path),
                Arc::clone(&store),
                config.policy_reload_interval(),
            )
            .with_metrics(Arc::clone(&metrics));
            let (_snapshot_rx, handle) = watcher.start();
            Some(handle)
        }
        None => {
            warn!("No policy file configured, using built-in thresholds");
            None
        }
    };

    // Load scoring model
    let model = match &config.model_path {
        Some(path) => load_model(path)
            .with_context(|| format!("failed to load model from {}", path.display()))?,
        None => {
            warn!("No model file configured, using built-in heuristic model");
            ModelFile::builtin()
        }
    };
    info!(model_version = %model.model_version, "Model loaded");

    let orchestrator = Orchestrator::from_model(model, Arc::clone(&store)).with_metrics(metrics);

    // Create application state
    let state = Arc::new(AppState {
        orchestrator,
        start_time: Instant::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        max_batch_size: config.max_batch_size,
        latency_budget_ms: config.latency_budget_ms,
    });

    // Create router
    let app = create_router(state);

    // Parse listen address
    let addr: SocketAddr = config.listen_addr.parse()?;

    info!(addr = %addr, "Starting HTTP server");

    // Create TCP listener
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Run server with graceful shutdown
    if config.graceful_shutdown {
        let shutdown_timeout = config.shutdown_timeout();
        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());
        tokio::select! {
            result = server => result?,
            _ = drain_deadline(shutdown_timeout) => {
                warn!(timeout_secs = shutdown_timeout.as_secs(), "Graceful shutdown timed out");
            }
        }
    } else {
        axum::serve(listener, app).await?;
    }

    // Cleanup
    info!("Shutting down...");
    if let Some(handle) = policy_handle {
        handle.abort();
    }

    info!("Shutdown complete");
    Ok(())
}

/// Resolves once a shutdown signal has been received and the drain window has elapsed.
async fn drain_deadline(timeout: std::time::Duration) {
    shutdown_signal().await;
    tokio::time::sleep(timeout).await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Received shutdown signal");
}
