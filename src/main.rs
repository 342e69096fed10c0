//! Speedtest monitor - Main Entry Point
//!
//! Configuration comes from the environment only; there are no CLI flags.

use speedtest_mqtt::config::MonitorConfig;
use speedtest_mqtt::monitor::Monitor;
use speedtest_mqtt::observability::init_default_logging;
use std::process;
use tokio::signal;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_default_logging();

    let config = match MonitorConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    Monitor::from_config(config).run(shutdown_signal()).await;

    info!("Application shutdown complete");
}

/// Resolve on SIGINT or SIGTERM
async fn shutdown_signal() {
    let mut sigint = match signal::unix::signal(signal::unix::SignalKind::interrupt()) {
        Ok(stream) => stream,
        Err(e) => {
            error!("Failed to install SIGINT handler: {}", e);
            process::exit(1);
        }
    };
    let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            error!("Failed to install SIGTERM handler: {}", e);
            process::exit(1);
        }
    };

    tokio::select! {
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down gracefully...");
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}
