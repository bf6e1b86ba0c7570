mod approvals;
mod auth;
mod bootstrap;
mod error;
mod health;

use std::time::Duration;

use anyhow::Result;
use procura_core::config::{AppConfig, LoadOptions};
use tracing::{info, warn};

fn init_logging(config: &AppConfig) {
    use procura_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    // Now bootstrap using the same config we already loaded
    let app = bootstrap::bootstrap_with_config(config).await?;

    let state = approvals::AppState {
        db_pool: app.db_pool.clone(),
        approvals: app.config.approvals.clone(),
    };
    let router = approvals::router(state).merge(health::router(app.db_pool.clone()));

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(event_name = "system.server.started", bind_address = %address, "procura-server started");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, router).with_graceful_shutdown(async {
        shutdown_rx.await.ok();
    });
    let server_task = tokio::spawn(async move { server.await });

    wait_for_shutdown().await;
    let _ = shutdown_tx.send(());

    // In-flight requests get the configured grace window before the process
    // exits anyway.
    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    match tokio::time::timeout(grace, server_task).await {
        Ok(result) => result??,
        Err(_) => {
            warn!(
                event_name = "system.server.shutdown_timeout",
                grace_secs = app.config.server.graceful_shutdown_secs,
                "graceful shutdown window elapsed with requests still in flight"
            );
        }
    }

    info!(event_name = "system.server.stopping", "procura-server stopping");
    Ok(())
}

async fn wait_for_shutdown() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(event_name = "system.server.signal_error", error = %error, "shutdown signal wait failed");
    }
    info!(event_name = "system.server.shutdown_signal", "shutdown signal received");
}
