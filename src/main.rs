//! Fleet controller (v1)
//!
//! Tracks worker hosts, detects failures and redistributes their replicas.
//!
//! # Architecture Overview
//!
//! ```text
//!     Operator ──HTTP──▶ http server ──▶ Registry ◀── HealthMonitor ──probe──▶ workers
//!                            │              ▲              │
//!                            ▼              │         HostDown events
//!                   ScalingCoordinator      │              ▼
//!                            │              └──────── Redistributor
//!                            └──────────scale──────────────┴──────────▶ workers
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use fleet_controller::config::{load_config, ControllerConfig};
use fleet_controller::lifecycle::{wait_for_shutdown_signal, Controller, Shutdown};
use fleet_controller::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "fleet-controller")]
#[command(about = "Health monitoring and replica redistribution for a worker fleet", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ControllerConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "fleet-controller starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        health_interval_secs = config.health_check.interval_secs,
        unplaced_policy = ?config.redistribution.unplaced_policy,
        audit_path = %config.audit.path,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            wait_for_shutdown_signal().await;
            shutdown.trigger();
        });
    }

    Controller::new(config).run(listener, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
