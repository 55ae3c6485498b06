//! In-process worker double for unit tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::error::{FleetError, FleetResult};
use crate::worker::WorkerClient;

#[derive(Default)]
pub struct MockWorker {
    down: Mutex<HashSet<String>>,
    hung: Mutex<HashSet<String>>,
    scale_failures: Mutex<HashSet<String>>,
    scale_gate: Mutex<Option<Arc<Notify>>>,
    scale_calls: Mutex<Vec<(String, u32)>>,
    probes: AtomicUsize,
}

impl MockWorker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Probes against `host` fail from now on.
    pub fn set_down(&self, host: &str) {
        self.down.lock().unwrap().insert(host.to_string());
    }

    pub fn set_up(&self, host: &str) {
        self.down.lock().unwrap().remove(host);
    }

    /// Probes against `host` never complete.
    pub fn set_hung(&self, host: &str) {
        self.hung.lock().unwrap().insert(host.to_string());
    }

    /// Scale commands to `host` are rejected.
    pub fn fail_scale(&self, host: &str) {
        self.scale_failures.lock().unwrap().insert(host.to_string());
    }

    /// Hold every scale command until the returned handle is notified.
    pub fn gate_scales(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.scale_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Release every held scale command and stop gating new ones.
    pub fn open_scales(&self) {
        let gate = self.scale_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notify_waiters();
        }
    }

    pub fn scale_calls(&self) -> Vec<(String, u32)> {
        self.scale_calls.lock().unwrap().clone()
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkerClient for MockWorker {
    async fn probe(&self, host: &str) -> FleetResult<()> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        let hung = self.hung.lock().unwrap().contains(host);
        if hung {
            std::future::pending::<()>().await;
        }
        let down = self.down.lock().unwrap().contains(host);
        if down {
            return Err(FleetError::remote(host, "connection refused"));
        }
        Ok(())
    }

    async fn create_replicas(&self, host: &str, count: u32) -> FleetResult<()> {
        self.scale_calls.lock().unwrap().push((host.to_string(), count));
        let gate = self.scale_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let failing = self.scale_failures.lock().unwrap().contains(host);
        if failing {
            return Err(FleetError::remote(host, "unexpected status 500 Internal Server Error"));
        }
        Ok(())
    }
}
