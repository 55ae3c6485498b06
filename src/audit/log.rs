//! Append-only audit trail of state-changing operations.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::{broadcast, mpsc};

/// Action names written to the audit trail.
pub mod action {
    pub const CONTROLLER_START: &str = "ControllerStart";
    pub const CONTROLLER_STOP: &str = "ControllerStop";
    pub const REGISTER_HOST: &str = "RegisterHost";
    pub const HOST_STATUS_CHANGED: &str = "HostStatusChanged";
    pub const HOST_DOWN: &str = "HostDown";
    pub const REDISTRIBUTE_REPLICAS: &str = "RedistributeReplicas";
    pub const PLACEMENT_FAILED: &str = "ReplicaPlacementFailed";
    pub const NO_ACTIVE_HOSTS: &str = "NoActiveHosts";
    pub const REPLICAS_DROPPED: &str = "ReplicasDropped";
    pub const REMOVE_HOST: &str = "RemoveHost";
    pub const SCALE_HOST: &str = "ScaleHost";
}

/// One audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Per-process sequence number, starting at 1.
    pub id: u64,
    /// RFC 3339 timestamp.
    pub timestamp: String,
    pub action: String,
    pub host: String,
    pub details: String,
}

/// Handle for emitting audit records. Cheap to clone.
///
/// Ids are assigned and enqueued under one lock, so the writer sees them in
/// increasing order.
#[derive(Debug, Clone)]
pub struct AuditLog {
    sequence: Arc<Mutex<u64>>,
    tx: Option<mpsc::UnboundedSender<AuditRecord>>,
}

impl AuditLog {
    /// A log whose records are delivered to the returned receiver.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<AuditRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let log = Self {
            sequence: Arc::new(Mutex::new(0)),
            tx: Some(tx),
        };
        (log, rx)
    }

    /// A log that assigns ids but discards records.
    pub fn disabled() -> Self {
        Self {
            sequence: Arc::new(Mutex::new(0)),
            tx: None,
        }
    }

    /// Emit a record and return its id.
    pub fn record(&self, action: &str, host: &str, details: impl Into<String>) -> u64 {
        let mut sequence = self.sequence.lock().unwrap_or_else(PoisonError::into_inner);
        *sequence += 1;
        let id = *sequence;
        let record = AuditRecord {
            id,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            action: action.to_string(),
            host: host.to_string(),
            details: details.into(),
        };

        if let Some(tx) = &self.tx {
            if tx.send(record).is_err() {
                tracing::debug!(id, action, "Audit writer gone, record dropped");
            }
        }
        id
    }

    /// Highest id handed out so far.
    pub fn last_id(&self) -> u64 {
        *self.sequence.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Background task appending audit records to a file.
pub struct AuditWriter {
    path: PathBuf,
}

impl AuditWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Run until shutdown or until every `AuditLog` handle is dropped.
    ///
    /// Records still queued at shutdown are written before returning.
    pub async fn run(
        self,
        mut rx: mpsc::UnboundedReceiver<AuditRecord>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        tracing::info!(path = %self.path.display(), "Audit writer starting");
        loop {
            tokio::select! {
                record = rx.recv() => match record {
                    Some(record) => self.append(&record).await,
                    None => break,
                },
                _ = shutdown.recv() => {
                    while let Ok(record) = rx.try_recv() {
                        self.append(&record).await;
                    }
                    break;
                }
            }
        }
        tracing::info!("Audit writer stopped");
    }

    async fn append(&self, record: &AuditRecord) {
        let mut line = match serde_json::to_vec(record) {
            Ok(line) => line,
            Err(e) => {
                tracing::error!(id = record.id, error = %e, "Failed to encode audit record");
                return;
            }
        };
        line.push(b'\n');

        let result = async {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await?;
            file.write_all(&line).await?;
            file.flush().await
        }
        .await;

        if let Err(e) = result {
            tracing::error!(path = %self.path.display(), error = %e, "Failed to append audit record");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_sequential() {
        let (log, mut rx) = AuditLog::channel();
        assert_eq!(log.record(action::REGISTER_HOST, "a", "Host registered"), 1);
        assert_eq!(log.clone().record(action::SCALE_HOST, "a", "Scaled to 3"), 2);

        let first = rx.try_recv().unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(first.action, "RegisterHost");
        assert_eq!(first.host, "a");
        assert!(chrono::DateTime::parse_from_rfc3339(&first.timestamp).is_ok());
        assert_eq!(rx.try_recv().unwrap().details, "Scaled to 3");
    }

    #[test]
    fn test_concurrent_ids_never_collide() {
        let log = AuditLog::disabled();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let log = log.clone();
                std::thread::spawn(move || {
                    (0..250)
                        .map(|_| log.record(action::HOST_STATUS_CHANGED, "h", ""))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate id {id}");
            }
        }
        assert_eq!(seen.len(), 2000);
        assert_eq!(log.last_id(), 2000);
    }

    #[test]
    fn test_concurrent_records_arrive_in_id_order() {
        let (log, mut rx) = AuditLog::channel();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let log = log.clone();
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        log.record(action::SCALE_HOST, "h", "Scaled to 1");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut ids = Vec::new();
        while let Ok(record) = rx.try_recv() {
            ids.push(record.id);
        }
        assert_eq!(ids.len(), 2000);
        assert!(ids.windows(2).all(|w| w[0] + 1 == w[1]));
    }

    #[tokio::test]
    async fn test_writer_appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.json");
        let (log, rx) = AuditLog::channel();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        log.record(action::CONTROLLER_START, "localhost", "Controller started");
        log.record(action::REGISTER_HOST, "10.0.0.1", "Host registered");
        let writer = tokio::spawn(AuditWriter::new(path.clone()).run(rx, shutdown_rx));
        shutdown_tx.send(()).unwrap();
        writer.await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let records: Vec<AuditRecord> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].action, "ControllerStart");
        assert_eq!(records[1].host, "10.0.0.1");
    }
}
