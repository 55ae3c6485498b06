//! Failed-host workload redistribution.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures_util::future::join_all;
use serde::Serialize;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, Instant};

use crate::audit::{action, AuditLog};
use crate::config::{RedistributionConfig, UnplacedPolicy};
use crate::error::{FleetError, FleetResult};
use crate::health::HealthEvent;
use crate::observability::metrics;
use crate::redistribution::split::{split_replicas, Placement};
use crate::registry::{DrainOutcome, Registry};
use crate::worker::WorkerClient;

/// A placement whose scale command failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedPlacement {
    pub host: String,
    pub replicas: u32,
    pub error: String,
}

/// What a redistribution attempt did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedistributionReport {
    pub failed_host: String,
    pub replicas: u32,
    /// The full split, zero shares included.
    pub plan: Vec<Placement>,
    pub confirmed: Vec<Placement>,
    pub failed: Vec<FailedPlacement>,
    /// Whether the failed host's record was removed.
    pub removed: bool,
    /// Replicas left on the still-Down host for another pass.
    pub remaining: u32,
}

impl RedistributionReport {
    /// Replicas whose placement was confirmed by the target host.
    pub fn placed(&self) -> u32 {
        self.confirmed.iter().map(|p| p.replicas).sum()
    }
}

/// Moves the workload of Down hosts onto the Running ones.
pub struct Redistributor {
    registry: Arc<Registry>,
    worker: Arc<dyn WorkerClient>,
    audit: AuditLog,
    config: RedistributionConfig,
    /// Down hosts whose workload found no target, with their replica count.
    parked: BTreeMap<String, u32>,
}

impl Redistributor {
    pub fn new(
        registry: Arc<Registry>,
        worker: Arc<dyn WorkerClient>,
        audit: AuditLog,
        config: RedistributionConfig,
    ) -> Self {
        Self {
            registry,
            worker,
            audit,
            config,
            parked: BTreeMap::new(),
        }
    }

    /// Split `replicas` of `failed_host` over the Running hosts, then settle
    /// its record: removed when fully drained, reduced when its count grew
    /// meanwhile.
    pub async fn redistribute(
        &self,
        failed_host: &str,
        replicas: u32,
    ) -> FleetResult<RedistributionReport> {
        let active: Vec<String> = self
            .registry
            .snapshot()
            .into_iter()
            .filter(|r| r.is_running() && r.host != failed_host)
            .map(|r| r.host)
            .collect();

        if active.is_empty() && replicas > 0 {
            return Err(self.no_active_hosts(failed_host, replicas));
        }

        let plan = split_replicas(replicas, &active);
        tracing::info!(
            failed_host = %failed_host,
            replicas,
            targets = active.len(),
            "Redistributing replicas"
        );

        let outcomes = join_all(plan.iter().filter(|p| p.replicas > 0).map(move |p| async move {
            (p, self.worker.create_replicas(&p.host, p.replicas).await)
        }))
        .await;

        let mut confirmed = Vec::new();
        let mut failed = Vec::new();
        for (placement, result) in outcomes {
            metrics::record_placement(result.is_ok());
            match result {
                Ok(()) => {
                    self.confirm(failed_host, placement);
                    confirmed.push(placement.clone());
                }
                Err(e) => {
                    tracing::error!(
                        failed_host = %failed_host,
                        target_host = %placement.host,
                        replicas = placement.replicas,
                        error = %e,
                        "Failed to place replicas"
                    );
                    self.audit.record(
                        action::PLACEMENT_FAILED,
                        &placement.host,
                        format!("{} replicas from {}: {}", placement.replicas, failed_host, e),
                    );
                    failed.push(FailedPlacement {
                        host: placement.host.clone(),
                        replicas: placement.replicas,
                        error: e.to_string(),
                    });
                }
            }
        }

        let (removed, remaining) = self.settle(failed_host, replicas);
        metrics::record_redistribution(if failed.is_empty() { "complete" } else { "partial" });

        Ok(RedistributionReport {
            failed_host: failed_host.to_string(),
            replicas,
            plan,
            confirmed,
            failed,
            removed,
            remaining,
        })
    }

    fn confirm(&self, failed_host: &str, placement: &Placement) {
        tracing::info!(
            failed_host = %failed_host,
            target_host = %placement.host,
            replicas = placement.replicas,
            "Redistributed replicas"
        );
        self.audit.record(
            action::REDISTRIBUTE_REPLICAS,
            &placement.host,
            format!("Received {} replicas from {}", placement.replicas, failed_host),
        );
        if let Err(e) = self.registry.add_replicas(&placement.host, placement.replicas) {
            tracing::warn!(
                target_host = %placement.host,
                error = %e,
                "Placement confirmed but target record is no longer live"
            );
        }
    }

    fn settle(&self, failed_host: &str, drained: u32) -> (bool, u32) {
        match self.registry.finish_drain(failed_host, drained) {
            DrainOutcome::Removed(record) => {
                tracing::info!(host = %failed_host, "Removed failed host");
                self.audit.record(
                    action::REMOVE_HOST,
                    failed_host,
                    format!("Removed after redistributing {} replicas", record.replica_count),
                );
                (true, 0)
            }
            DrainOutcome::Remaining(record) => {
                tracing::warn!(
                    host = %failed_host,
                    remaining = record.replica_count,
                    "Failed host gained replicas during redistribution"
                );
                (false, record.replica_count)
            }
            DrainOutcome::Kept(record) => {
                tracing::warn!(
                    host = %failed_host,
                    status = %record.status,
                    "Failed host was re-registered during redistribution, kept"
                );
                (false, 0)
            }
            DrainOutcome::Missing => {
                tracing::debug!(host = %failed_host, "Failed host already removed");
                (false, 0)
            }
        }
    }

    fn no_active_hosts(&self, failed_host: &str, replicas: u32) -> FleetError {
        let error = FleetError::NoActiveHosts {
            host: failed_host.to_string(),
            replicas,
        };
        tracing::error!(host = %failed_host, replicas, policy = ?self.config.unplaced_policy, "{}", error);
        metrics::record_redistribution("no_active_hosts");
        self.audit.record(action::NO_ACTIVE_HOSTS, failed_host, error.to_string());

        if self.config.unplaced_policy == UnplacedPolicy::Drop
            && self.registry.remove_down(failed_host).is_some()
        {
            tracing::warn!(host = %failed_host, replicas, "Dropped workload of failed host");
            self.audit.record(
                action::REPLICAS_DROPPED,
                failed_host,
                format!("{} replicas lost", replicas),
            );
        }
        error
    }

    /// Handle one monitor event.
    pub async fn handle(&mut self, event: HealthEvent) -> Option<RedistributionReport> {
        match event {
            HealthEvent::HostDown { host, replicas } => self.drain(&host, replicas).await,
        }
    }

    /// Retry every parked workload once.
    pub async fn retry_parked(&mut self) {
        let parked: Vec<(String, u32)> =
            self.parked.iter().map(|(h, r)| (h.clone(), *r)).collect();
        for (host, replicas) in parked {
            self.drain(&host, replicas).await;
        }
    }

    /// Parked hosts and their replica counts.
    pub fn parked(&self) -> &BTreeMap<String, u32> {
        &self.parked
    }

    async fn drain(&mut self, host: &str, hint: u32) -> Option<RedistributionReport> {
        let mut last = None;
        loop {
            let Some(record) = self.registry.begin_drain(host) else {
                match self.registry.get(host) {
                    Some(record) if record.is_down() => {
                        tracing::warn!(host = %host, "Host is already being drained");
                    }
                    Some(record) => {
                        tracing::info!(host = %host, status = %record.status, "Host is no longer down, skipping redistribution");
                    }
                    None => {
                        tracing::debug!(host = %host, replicas = hint, "Host already removed, skipping redistribution");
                    }
                }
                self.unpark(host);
                return last;
            };
            let replicas = record.replica_count;

            match self.redistribute(host, replicas).await {
                Ok(report) => {
                    self.unpark(host);
                    let again = report.remaining > 0;
                    last = Some(report);
                    if !again {
                        return last;
                    }
                }
                Err(FleetError::NoActiveHosts { .. })
                    if self.config.unplaced_policy == UnplacedPolicy::Retain =>
                {
                    self.registry.abort_drain(host);
                    self.parked.insert(host.to_string(), replicas);
                    self.record_unplaced();
                    return last;
                }
                Err(_) => {
                    self.registry.abort_drain(host);
                    self.unpark(host);
                    return last;
                }
            }
        }
    }

    fn unpark(&mut self, host: &str) {
        if self.parked.remove(host).is_some() {
            self.record_unplaced();
        }
    }

    fn record_unplaced(&self) {
        metrics::record_unplaced(self.parked.values().map(|&r| u64::from(r)).sum());
    }

    /// Consume monitor events until shutdown or until the monitor goes away.
    pub async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<HealthEvent>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        tracing::info!(policy = ?self.config.unplaced_policy, "Redistributor starting");

        let period = self.config.retry_interval();
        let mut retry = time::interval_at(Instant::now() + period, period);

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        self.handle(event).await;
                    }
                    None => break,
                },
                _ = retry.tick(), if !self.parked.is_empty() => {
                    tracing::info!(parked = self.parked.len(), "Retrying unplaced workloads");
                    self.retry_parked().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Redistributor received shutdown signal, exiting loop");
                    break;
                }
            }
        }

        if !self.parked.is_empty() {
            tracing::warn!(parked = ?self.parked, "Exiting with unplaced workloads");
        }
    }
}
