//! Spec Registry - owner-scoped registry of rule and unit specs
//!
//! Serves the registry over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spec_registry::api::create_router;
use spec_registry::{
    spawn_cleanup_task, spawn_event_forwarder, AppState, Backend, Config, MemoryBackend,
    QueueNotifier, SqliteBackend,
};

/// Main entry point for the registry service.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the storage backend (SQLite file or memory)
/// 4. Create the notification queue and its forwarder
/// 5. Start the background cache sweep
/// 6. Serve the Axum router until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spec_registry=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Spec Registry");

    let config = Config::from_env();
    info!(
        "Configuration loaded: port={}, database={:?}, spec_cache_ttl={}s, cleanup_interval={}s",
        config.server_port, config.database_path, config.spec_cache_ttl, config.cleanup_interval
    );

    let registry_config = config.registry_config();
    let backend: Arc<dyn Backend> = match &config.database_path {
        Some(path) => {
            let sqlite = SqliteBackend::open(path)
                .with_context(|| format!("opening database {}", path.display()))?;
            for table in [&registry_config.units_table, &registry_config.rules_table] {
                sqlite
                    .provision(table)
                    .await
                    .with_context(|| format!("provisioning table {}", table))?;
            }
            Arc::new(sqlite)
        }
        None => {
            warn!("DATABASE_PATH not set, registry state will not survive a restart");
            Arc::new(MemoryBackend::new())
        }
    };

    let (notifier, events) = QueueNotifier::channel(config.queue_capacity, config.notify_timeout());
    let forwarder = spawn_event_forwarder(events);

    let state = AppState::new(backend, Arc::new(notifier), &registry_config);
    info!("Registry initialized on {} backend", state.backend_name);

    let caches = vec![
        state.registry.unit_specs().clone(),
        state.registry.rule_specs().clone(),
    ];
    let cleanup_handle = spawn_cleanup_task(caches, config.cleanup_interval);

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await
        .context("serving HTTP")?;

    // The router (and with it the last notifier) is gone, so the queue closes
    // and the forwarder finishes what is left.
    match forwarder.await {
        Ok(count) => info!("Forwarded {} change events", count),
        Err(err) => warn!("Change event forwarder failed: {}", err),
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the cache sweep and allows graceful shutdown.
async fn shutdown_signal(cleanup_handle: JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
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

    cleanup_handle.abort();
    warn!("Cache sweep aborted");
}
