//! todo-json server
//!
//! Serves the session-scoped todo endpoint over HTTP.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;

use todo_json::config::{self, LogFormat, ServerConfig};
use todo_json::handlers::{build_app, TodoServer};
use todo_json::{metrics, tracing_setup};

/// Upper bound for flushing RocksDB on shutdown
const DATABASE_FLUSH_TIMEOUT_SECS: u64 = 10;

#[tokio::main]
async fn main() -> Result<()> {
    if std::env::args().skip(1).any(|a| a == "--help" || a == "-h") {
        config::print_env_help();
        return Ok(());
    }

    tracing_setup::init_tracing(LogFormat::from_env())?;

    metrics::register_metrics().context("Failed to register metrics")?;
    info!("Metrics registered at /metrics");

    info!("Starting todo-json server...");

    let server_config = ServerConfig::from_env();
    server_config.log();

    let server = Arc::new(TodoServer::new(server_config.clone())?);

    // Keep a reference for shutdown cleanup (clone BEFORE moving into router)
    let server_for_shutdown = Arc::clone(&server);

    info!(
        max_concurrent = server_config.max_concurrent_requests,
        timeout_secs = server_config.request_timeout_secs,
        "Request limits enabled"
    );

    if server_config.session_ttl().is_some() {
        spawn_session_maintenance(
            Arc::clone(&server),
            Duration::from_secs(server_config.maintenance_interval_secs),
        );
    }

    let app = build_app(server);

    let addr = server_config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown signal received, flushing databases...");

    let flush = tokio::task::spawn_blocking(move || server_for_shutdown.flush_all_databases());
    match tokio::time::timeout(Duration::from_secs(DATABASE_FLUSH_TIMEOUT_SECS), flush).await {
        Ok(Ok(Ok(()))) => info!("Databases flushed successfully"),
        Ok(Ok(Err(e))) => tracing::error!("Failed to flush databases: {}", e),
        Ok(Err(e)) => tracing::error!("Flush task failed: {}", e),
        Err(_) => tracing::error!(
            "Database flush timed out after {}s",
            DATABASE_FLUSH_TIMEOUT_SECS
        ),
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Periodically remove expired sessions. The first tick fires immediately,
/// clearing sessions that expired while the server was down.
fn spawn_session_maintenance(server: Arc<TodoServer>, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let server = Arc::clone(&server);
            match tokio::task::spawn_blocking(move || server.run_session_maintenance()).await {
                Ok(removed) => tracing::debug!(removed, "Session maintenance finished"),
                Err(e) => tracing::error!("Session maintenance task failed: {}", e),
            }
        }
    });
}

/// Handle graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
