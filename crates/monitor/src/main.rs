//! Docker System Monitor - host and container reports over Telegram
//!
//! This binary runs on a single Docker host, sampling CPU, memory, disk and
//! container state on a fixed interval and posting the results to a chat.

use anyhow::{Context, Result};
use monitor_lib::{
    collector::{ShellRunner, SystemMonitor},
    notifier::TelegramNotifier,
    observability::StructuredLogger,
    scheduler::{MonitorLoop, SchedulerConfig},
};
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

const MONITOR_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting docker-system-monitor");

    // Load configuration
    let config = config::MonitorConfig::load().context("Configuration error")?;
    info!(
        host_name = %config.host_name,
        interval_secs = config.interval_secs,
        proc_root = %config.proc_root.display(),
        "Monitor configured"
    );

    let logger = StructuredLogger::new(&config.host_name);
    logger.log_startup(MONITOR_VERSION, config.interval());

    let notifier = Arc::new(TelegramNotifier::new(config.telegram()));
    let monitor = SystemMonitor::with_sources(Arc::new(ShellRunner::new()), config.proc_root.clone());

    let monitor_loop = MonitorLoop::new(
        monitor,
        notifier,
        logger,
        SchedulerConfig {
            interval: config.interval(),
            ..Default::default()
        },
    );

    // Forward SIGINT/SIGTERM to the loop
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        let received = wait_for_signal().await;
        info!(signal = received, "Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    let cycles = monitor_loop.run(shutdown_rx).await;
    info!(cycles = cycles, "Shutting down");

    Ok(())
}

/// Resolve on the first SIGINT or SIGTERM
async fn wait_for_signal() -> &'static str {
    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            warn!(error = %e, "Cannot listen for SIGTERM, only SIGINT will stop the monitor");
            let _ = tokio::signal::ctrl_c().await;
            return "SIGINT";
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => "SIGINT",
        _ = terminate.recv() => "SIGTERM",
    }
}
