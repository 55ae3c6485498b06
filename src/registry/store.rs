//! In-memory host registry.
//!
//! # Responsibilities
//! - Own the host → record mapping
//! - Apply every mutation inside one short critical section
//! - Hand out ordered point-in-time snapshots for slow callers
//! - Track which Down hosts are being drained by the redistributor
//!
//! # Design Decisions
//! - A single `Mutex` over a `BTreeMap`: ordered iteration for free, one
//!   exclusion domain for every component
//! - The lock is never held across an `.await`
//! - Poisoning is recovered; the map holds plain values only

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{FleetError, FleetResult};
use crate::observability::metrics;
use crate::registry::host::{HostRecord, HostStatus};

/// Per-status host counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct StatusCounts {
    pub unknown: usize,
    pub running: usize,
    pub down: usize,
}

/// What settling a drained host did to its record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Everything the record held was drained; the record is gone.
    Removed(HostRecord),
    /// A confirmed scale raised the count mid-drain. The record stays Down
    /// holding only the undrained difference.
    Remaining(HostRecord),
    /// The host was re-registered mid-drain and is no longer Down.
    Kept(HostRecord),
    Missing,
}

#[derive(Debug, Default)]
struct Inner {
    hosts: BTreeMap<String, HostRecord>,
    /// Down hosts whose workload is being moved. Their status is frozen.
    draining: BTreeSet<String>,
}

impl Inner {
    fn publish(&self) {
        metrics::record_fleet_size(&counts(&self.hosts));
    }
}

/// The authoritative set of known hosts.
#[derive(Debug, Default)]
pub struct Registry {
    inner: Mutex<Inner>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace the record for `host`. Returns the stored record.
    ///
    /// Re-registration ends any drain in progress for the host.
    pub fn register(
        &self,
        host: impl Into<String>,
        status: HostStatus,
        replica_count: u32,
    ) -> HostRecord {
        let record = HostRecord::new(host, status, replica_count);
        let mut inner = self.inner();
        inner.draining.remove(&record.host);
        inner.hosts.insert(record.host.clone(), record.clone());
        inner.publish();
        record
    }

    pub fn get(&self, host: &str) -> Option<HostRecord> {
        self.inner().hosts.get(host).cloned()
    }

    /// Set the status of `host`, returning the record as it was before.
    ///
    /// Absent hosts are ignored; they may have been removed concurrently.
    /// Hosts being drained keep their Down status and also yield `None`.
    pub fn set_status(&self, host: &str, status: HostStatus) -> Option<HostRecord> {
        let mut inner = self.inner();
        if inner.draining.contains(host) {
            return None;
        }
        let record = inner.hosts.get_mut(host)?;
        let previous = record.clone();
        record.status = status;
        if previous.status != status {
            inner.publish();
        }
        Some(previous)
    }

    /// Overwrite the replica count of a live host.
    pub fn set_replica_count(&self, host: &str, count: u32) -> FleetResult<HostRecord> {
        self.update_live(host, |record| record.replica_count = count)
    }

    /// Record a replica count the worker has already confirmed.
    ///
    /// Unlike [`Registry::set_replica_count`] this also writes to Down
    /// records, so a later drain moves what the worker actually runs.
    pub fn commit_confirmed(&self, host: &str, count: u32) -> FleetResult<HostRecord> {
        let mut inner = self.inner();
        let record = inner
            .hosts
            .get_mut(host)
            .ok_or_else(|| FleetError::HostNotFound(host.to_string()))?;
        record.replica_count = count;
        Ok(record.clone())
    }

    /// Add `delta` replicas to a live host.
    pub fn add_replicas(&self, host: &str, delta: u32) -> FleetResult<HostRecord> {
        self.update_live(host, |record| {
            record.replica_count = record.replica_count.saturating_add(delta)
        })
    }

    fn update_live(
        &self,
        host: &str,
        apply: impl FnOnce(&mut HostRecord),
    ) -> FleetResult<HostRecord> {
        let mut inner = self.inner();
        let record = inner
            .hosts
            .get_mut(host)
            .ok_or_else(|| FleetError::HostNotFound(host.to_string()))?;
        if record.is_down() {
            return Err(FleetError::HostDown(host.to_string()));
        }
        apply(record);
        Ok(record.clone())
    }

    /// Ordered copy of every record.
    pub fn snapshot(&self) -> Vec<HostRecord> {
        self.inner().hosts.values().cloned().collect()
    }

    pub fn remove(&self, host: &str) -> Option<HostRecord> {
        let mut inner = self.inner();
        inner.draining.remove(host);
        let removed = inner.hosts.remove(host);
        if removed.is_some() {
            inner.publish();
        }
        removed
    }

    /// Remove `host` only if it is still Down.
    pub fn remove_down(&self, host: &str) -> Option<HostRecord> {
        let mut inner = self.inner();
        if !inner.hosts.get(host).is_some_and(HostRecord::is_down) {
            return None;
        }
        inner.draining.remove(host);
        let removed = inner.hosts.remove(host);
        inner.publish();
        removed
    }

    /// Freeze a Down host for draining and return the record to drain.
    ///
    /// Returns `None` when the host is absent, not Down, or already draining.
    pub fn begin_drain(&self, host: &str) -> Option<HostRecord> {
        let mut inner = self.inner();
        let record = inner.hosts.get(host).filter(|r| r.is_down())?.clone();
        if !inner.draining.insert(host.to_string()) {
            return None;
        }
        Some(record)
    }

    /// Release a drain that moved nothing.
    pub fn abort_drain(&self, host: &str) {
        self.inner().draining.remove(host);
    }

    /// Settle a drain that moved `drained` replicas off `host`.
    pub fn finish_drain(&self, host: &str, drained: u32) -> DrainOutcome {
        let mut inner = self.inner();
        inner.draining.remove(host);
        let Some(record) = inner.hosts.get_mut(host) else {
            return DrainOutcome::Missing;
        };
        if !record.is_down() {
            return DrainOutcome::Kept(record.clone());
        }
        if record.replica_count > drained {
            record.replica_count -= drained;
            return DrainOutcome::Remaining(record.clone());
        }

        let removed = inner.hosts.remove(host);
        inner.publish();
        match removed {
            Some(record) => DrainOutcome::Removed(record),
            None => DrainOutcome::Missing,
        }
    }

    pub fn is_draining(&self, host: &str) -> bool {
        self.inner().draining.contains(host)
    }

    pub fn len(&self) -> usize {
        self.inner().hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner().hosts.is_empty()
    }

    pub fn status_counts(&self) -> StatusCounts {
        counts(&self.inner().hosts)
    }
}

fn counts(hosts: &BTreeMap<String, HostRecord>) -> StatusCounts {
    hosts.values().fold(StatusCounts::default(), |mut acc, r| {
        match r.status {
            HostStatus::Unknown => acc.unknown += 1,
            HostStatus::Running => acc.running += 1,
            HostStatus::Down => acc.down += 1,
        }
        acc
    })
}
