//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the registry, audit log, worker client and scaling coordinator
//! - Start background tasks (audit writer, redistributor, health monitor)
//! - Serve the HTTP API until shutdown, then stop tasks in order

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::audit::{action, AuditLog, AuditRecord, AuditWriter};
use crate::config::ControllerConfig;
use crate::health::HealthMonitor;
use crate::http::{AppState, HttpServer};
use crate::lifecycle::Shutdown;
use crate::redistribution::Redistributor;
use crate::registry::Registry;
use crate::scaling::ScalingCoordinator;
use crate::worker::{HttpWorkerClient, WorkerClient};

/// Host field of the controller's own lifecycle audit records.
const CONTROLLER_HOST: &str = "localhost";

/// A fully wired controller, ready to serve.
pub struct Controller {
    config: ControllerConfig,
    registry: Arc<Registry>,
    worker: Arc<dyn WorkerClient>,
    audit: AuditLog,
    audit_rx: Option<mpsc::UnboundedReceiver<AuditRecord>>,
}

impl Controller {
    /// Build a controller talking to workers over HTTP.
    pub fn new(config: ControllerConfig) -> Self {
        let worker = HttpWorkerClient::new(
            config.worker.clone(),
            config.health_check.timeout(),
            config.timeouts.scale(),
        );
        Self::with_worker_client(config, Arc::new(worker))
    }

    /// Build a controller with a custom worker client.
    pub fn with_worker_client(config: ControllerConfig, worker: Arc<dyn WorkerClient>) -> Self {
        let (audit, audit_rx) = if config.audit.enabled {
            let (audit, rx) = AuditLog::channel();
            (audit, Some(rx))
        } else {
            (AuditLog::disabled(), None)
        };

        Self {
            config,
            registry: Arc::new(Registry::new()),
            worker,
            audit,
            audit_rx,
        }
    }

    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn audit(&self) -> AuditLog {
        self.audit.clone()
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: &Shutdown) -> std::io::Result<()> {
        let Controller {
            config,
            registry,
            worker,
            audit,
            audit_rx,
        } = self;

        // The writer has its own signal so it outlives the other tasks.
        let writer_stop = Shutdown::new();
        let writer = audit_rx.map(|rx| {
            let writer = AuditWriter::new(&config.audit.path);
            tokio::spawn(writer.run(rx, writer_stop.subscribe()))
        });

        let addr = listener.local_addr()?;
        audit.record(
            action::CONTROLLER_START,
            CONTROLLER_HOST,
            format!("Listening on {}", addr),
        );

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let redistributor = Redistributor::new(
            registry.clone(),
            worker.clone(),
            audit.clone(),
            config.redistribution.clone(),
        );
        let redistributor = tokio::spawn(redistributor.run(events_rx, shutdown.subscribe()));

        let monitor = HealthMonitor::new(
            registry.clone(),
            worker.clone(),
            audit.clone(),
            config.health_check.clone(),
            events_tx,
        );
        let monitor = tokio::spawn(monitor.run(shutdown.subscribe()));

        let state = AppState {
            registry: registry.clone(),
            coordinator: ScalingCoordinator::new(registry, worker, audit.clone()),
            audit: audit.clone(),
        };
        let result = HttpServer::new(&config, state)
            .run(listener, shutdown.subscribe())
            .await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "HTTP server failed");
        }

        shutdown.trigger();
        if let Err(e) = monitor.await {
            tracing::error!(error = %e, "Health monitor task failed");
        }
        if let Err(e) = redistributor.await {
            tracing::error!(error = %e, "Redistributor task failed");
        }

        audit.record(action::CONTROLLER_STOP, CONTROLLER_HOST, "Shutdown complete");
        writer_stop.trigger();
        if let Some(writer) = writer {
            if let Err(e) = writer.await {
                tracing::error!(error = %e, "Audit writer task failed");
            }
        }

        result
    }
}
