//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every registered host
//! - Drive Unknown/Running/Down transitions in the registry
//! - Report each fresh Down transition exactly once

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{FuturesUnordered, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tokio::time;

use crate::audit::{action, AuditLog};
use crate::config::HealthCheckConfig;
use crate::error::FleetError;
use crate::health::HealthEvent;
use crate::observability::metrics;
use crate::registry::{HostStatus, Registry};
use crate::worker::WorkerClient;

/// Outcome of one probe cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Hosts whose probe succeeded.
    pub healthy: Vec<String>,
    /// Hosts whose probe failed or timed out.
    pub failed: Vec<String>,
    /// Hosts that transitioned to Down during this cycle.
    pub newly_down: Vec<String>,
}

pub struct HealthMonitor {
    registry: Arc<Registry>,
    worker: Arc<dyn WorkerClient>,
    audit: AuditLog,
    config: HealthCheckConfig,
    events: mpsc::UnboundedSender<HealthEvent>,
}

impl HealthMonitor {
    pub fn new(
        registry: Arc<Registry>,
        worker: Arc<dyn WorkerClient>,
        audit: AuditLog,
        config: HealthCheckConfig,
        events: mpsc::UnboundedSender<HealthEvent>,
    ) -> Self {
        Self {
            registry,
            worker,
            audit,
            config,
            events,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Active health checks disabled");
            return;
        }

        tracing::info!(
            interval = self.config.interval_secs,
            timeout = self.config.timeout_secs,
            "Health monitor starting"
        );

        let mut ticker = time::interval(self.config.interval());
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.check_all().await;
                    tracing::debug!(
                        healthy = report.healthy.len(),
                        failed = report.failed.len(),
                        newly_down = report.newly_down.len(),
                        "Health cycle complete"
                    );
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Run one probe cycle over a registry snapshot.
    pub async fn check_all(&self) -> CycleReport {
        let timeout = self.config.timeout();
        let mut probes: FuturesUnordered<_> = self
            .registry
            .snapshot()
            .into_iter()
            .map(|record| {
                let worker = self.worker.clone();
                async move {
                    let result = probe(worker.as_ref(), &record.host, timeout).await;
                    (record.host, result)
                }
            })
            .collect();

        let mut report = CycleReport::default();
        while let Some((host, result)) = probes.next().await {
            metrics::record_probe(result.is_ok());
            match result {
                Ok(()) => {
                    self.mark_running(&host);
                    report.healthy.push(host);
                }
                Err(e) => {
                    if self.mark_down(&host, &e) {
                        report.newly_down.push(host.clone());
                    }
                    report.failed.push(host);
                }
            }
        }
        report
    }

    fn mark_running(&self, host: &str) {
        // A host being drained stays Down; its workload is already moving.
        let Some(previous) = self.registry.set_status(host, HostStatus::Running) else {
            return;
        };
        if previous.status == HostStatus::Running {
            return;
        }

        tracing::info!(host = %host, from = %previous.status, "Host is running");
        metrics::record_transition(HostStatus::Running.as_str());
        self.audit.record(
            action::HOST_STATUS_CHANGED,
            host,
            format!("{} -> running", previous.status),
        );
    }

    /// Returns true when this call performed the transition to Down.
    fn mark_down(&self, host: &str, error: &FleetError) -> bool {
        let Some(previous) = self.registry.set_status(host, HostStatus::Down) else {
            tracing::debug!(host = %host, "Probe failed for a host that is gone or draining");
            return false;
        };
        if previous.status == HostStatus::Down {
            tracing::debug!(host = %host, error = %error, "Host still down");
            return false;
        }

        tracing::warn!(
            host = %host,
            replicas = previous.replica_count,
            error = %error,
            "Host is down, scheduling redistribution"
        );
        metrics::record_transition(HostStatus::Down.as_str());
        self.audit.record(
            action::HOST_DOWN,
            host,
            format!("{} -> down: {}", previous.status, error),
        );

        let event = HealthEvent::HostDown {
            host: host.to_string(),
            replicas: previous.replica_count,
        };
        if self.events.send(event).is_err() {
            tracing::error!(host = %host, "Redistributor is gone, failed host will not be drained");
        }
        true
    }
}

async fn probe(worker: &dyn WorkerClient, host: &str, timeout: Duration) -> Result<(), FleetError> {
    match time::timeout(timeout, worker.probe(host)).await {
        Ok(result) => result,
        Err(_) => Err(FleetError::remote(
            host,
            format!("probe timed out after {}ms", timeout.as_millis()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::mock::MockWorker;

    fn monitor(
        registry: &Arc<Registry>,
        worker: &Arc<MockWorker>,
    ) -> (HealthMonitor, mpsc::UnboundedReceiver<HealthEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let config = HealthCheckConfig {
            enabled: true,
            interval_secs: 1,
            timeout_secs: 1,
        };
        let monitor = HealthMonitor::new(
            registry.clone(),
            worker.clone(),
            AuditLog::disabled(),
            config,
            tx,
        );
        (monitor, rx)
    }

    fn fleet(hosts: &[(&str, u32)]) -> Arc<Registry> {
        let registry = Arc::new(Registry::new());
        for (host, replicas) in hosts {
            registry.register(*host, HostStatus::Unknown, *replicas);
        }
        registry
    }

    #[tokio::test]
    async fn test_successful_probes_mark_running() {
        let registry = fleet(&[("a", 1), ("b", 2), ("c", 3)]);
        let worker = MockWorker::new();
        let (monitor, mut events) = monitor(&registry, &worker);

        let mut report = monitor.check_all().await;
        report.healthy.sort();
        assert_eq!(report.healthy, vec!["a", "b", "c"]);
        assert!(registry.snapshot().iter().all(|r| r.is_running()));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_failure_emits_single_event() {
        let registry = fleet(&[("a", 1), ("b", 7), ("c", 3)]);
        let worker = MockWorker::new();
        let (monitor, mut events) = monitor(&registry, &worker);
        monitor.check_all().await;

        worker.set_down("b");
        let report = monitor.check_all().await;
        assert_eq!(report.newly_down, vec!["b"]);
        assert_eq!(registry.get("b").unwrap().status, HostStatus::Down);
        assert_eq!(
            events.try_recv().unwrap(),
            HealthEvent::HostDown { host: "b".into(), replicas: 7 }
        );

        // Repeated failures against a host already Down stay silent.
        let report = monitor.check_all().await;
        assert_eq!(report.failed, vec!["b"]);
        assert!(report.newly_down.is_empty());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_hung_host_does_not_block_others() {
        let registry = fleet(&[("a", 0), ("b", 4), ("c", 0)]);
        let worker = MockWorker::new();
        worker.set_hung("b");
        let (monitor, mut events) = monitor(&registry, &worker);

        let started = std::time::Instant::now();
        let mut report = monitor.check_all().await;
        assert!(started.elapsed() < Duration::from_secs(3));

        report.healthy.sort();
        assert_eq!(report.healthy, vec!["a", "c"]);
        assert_eq!(report.newly_down, vec!["b"]);
        assert_eq!(
            events.try_recv().unwrap(),
            HealthEvent::HostDown { host: "b".into(), replicas: 4 }
        );
    }

    #[tokio::test]
    async fn test_down_host_recovers() {
        let registry = fleet(&[("a", 5)]);
        let worker = MockWorker::new();
        worker.set_down("a");
        let (monitor, _events) = monitor(&registry, &worker);

        monitor.check_all().await;
        assert_eq!(registry.get("a").unwrap().status, HostStatus::Down);

        worker.set_up("a");
        monitor.check_all().await;
        let record = registry.get("a").unwrap();
        assert_eq!(record.status, HostStatus::Running);
        assert_eq!(record.replica_count, 5);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let registry = fleet(&[("a", 0)]);
        let worker = MockWorker::new();
        let (monitor, _events) = monitor(&registry, &worker);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let handle = tokio::spawn(monitor.run(shutdown_rx));
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();

        assert!(worker.probe_count() >= 1);
        assert!(registry.get("a").unwrap().is_running());
    }

    #[tokio::test]
    async fn test_draining_host_is_not_revived() {
        let registry = fleet(&[("a", 5)]);
        let worker = MockWorker::new();
        worker.set_down("a");
        let (monitor, mut events) = monitor(&registry, &worker);
        monitor.check_all().await;
        assert!(events.try_recv().is_ok());

        registry.begin_drain("a").unwrap();
        worker.set_up("a");
        let report = monitor.check_all().await;

        assert_eq!(report.healthy, vec!["a"]);
        assert!(report.newly_down.is_empty());
        assert!(registry.get("a").unwrap().is_down());
        assert!(events.try_recv().is_err());
    }
}
