use std::sync::Arc;

use crate::audit::{action, AuditLog};
use crate::error::{FleetError, FleetResult};
use crate::observability::metrics;
use crate::registry::{HostRecord, Registry};
use crate::worker::WorkerClient;

/// Applies operator scale requests to live hosts.
#[derive(Clone)]
pub struct ScalingCoordinator {
    registry: Arc<Registry>,
    worker: Arc<dyn WorkerClient>,
    audit: AuditLog,
}

impl ScalingCoordinator {
    pub fn new(registry: Arc<Registry>, worker: Arc<dyn WorkerClient>, audit: AuditLog) -> Self {
        Self {
            registry,
            worker,
            audit,
        }
    }

    /// Set the replica count of `host` to `desired`.
    ///
    /// Fails without contacting the worker when the host is unknown or Down.
    /// A worker failure leaves the recorded count untouched. A count the
    /// worker confirmed is always recorded, even when the host went Down
    /// while the command was in flight; that case still returns `HostDown`.
    pub async fn scale(&self, host: &str, desired: u32) -> FleetResult<HostRecord> {
        let current = match self.registry.get(host) {
            Some(record) => record,
            None => {
                metrics::record_scale("not_found");
                return Err(FleetError::HostNotFound(host.to_string()));
            }
        };
        if current.is_down() {
            metrics::record_scale("host_down");
            return Err(FleetError::HostDown(host.to_string()));
        }

        if let Err(e) = self.worker.create_replicas(host, desired).await {
            tracing::error!(host = %host, replicas = desired, error = %e, "Scale command failed");
            metrics::record_scale("remote_error");
            return Err(e);
        }

        // The worker now runs `desired`; record it even if the host went Down
        // meanwhile so a drain moves the confirmed count.
        let record = match self.registry.commit_confirmed(host, desired) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(host = %host, replicas = desired, error = %e, "Worker scaled but host was removed");
                metrics::record_scale("stale");
                return Err(e);
            }
        };
        self.audit
            .record(action::SCALE_HOST, host, format!("Scaled to {}", desired));

        if record.is_down() {
            tracing::warn!(host = %host, replicas = desired, "Host went down while scaling, count kept for redistribution");
            metrics::record_scale("host_down");
            return Err(FleetError::HostDown(host.to_string()));
        }

        tracing::info!(host = %host, from = current.replica_count, to = desired, "Scaled host");
        metrics::record_scale("success");
        Ok(record)
    }
}
