//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};
use serde::Deserialize;
use serde_json::Value;
use tokio::net::TcpListener;

use fleet_controller::config::ControllerConfig;
use fleet_controller::lifecycle::{Controller, Shutdown};

#[derive(Debug, Deserialize)]
struct CreateReplica {
    count: u32,
}

#[derive(Default)]
struct WorkerState {
    down: AtomicBool,
    creates: Mutex<Vec<u32>>,
}

/// A worker host served by axum on an ephemeral port.
#[derive(Clone)]
pub struct MockWorker {
    pub addr: SocketAddr,
    state: Arc<WorkerState>,
}

impl MockWorker {
    pub async fn start() -> Self {
        let state = Arc::new(WorkerState::default());
        let app = Router::new()
            .route("/status", get(status))
            .route("/createReplica", post(create_replica))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state }
    }

    /// Host identifier as registered with the controller.
    pub fn id(&self) -> String {
        self.addr.to_string()
    }

    /// Answer health probes with 503 from now on.
    pub fn fail(&self) {
        self.state.down.store(true, Ordering::SeqCst);
    }

    /// Replica counts received through scale commands.
    pub fn creates(&self) -> Vec<u32> {
        self.state.creates.lock().unwrap().clone()
    }
}

async fn status(State(state): State<Arc<WorkerState>>) -> StatusCode {
    if state.down.load(Ordering::SeqCst) {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    }
}

async fn create_replica(
    State(state): State<Arc<WorkerState>>,
    Json(body): Json<CreateReplica>,
) -> StatusCode {
    state.creates.lock().unwrap().push(body.count);
    StatusCode::CREATED
}

/// Controller config tuned for fast tests, auditing into `audit_path`.
pub fn fast_config(audit_path: &std::path::Path) -> ControllerConfig {
    let mut config = ControllerConfig::default();
    config.health_check.interval_secs = 1;
    config.health_check.timeout_secs = 1;
    config.timeouts.scale_secs = 2;
    config.redistribution.retry_interval_secs = 1;
    config.audit.path = audit_path.to_string_lossy().into_owned();
    config
}

/// A running controller and a client pointed at it.
pub struct TestController {
    pub base: String,
    pub client: reqwest::Client,
    pub shutdown: Shutdown,
    task: tokio::task::JoinHandle<std::io::Result<()>>,
}

impl TestController {
    pub async fn start(config: ControllerConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let shutdown = Shutdown::new();

        let task = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { Controller::new(config).run(listener, &shutdown).await })
        };

        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        Self {
            base,
            client,
            shutdown,
            task,
        }
    }

    pub async fn post(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.base, path))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.base, path))
            .send()
            .await
            .unwrap()
    }

    /// The host record, or `None` on 404.
    pub async fn host(&self, id: &str) -> Option<Value> {
        let res = self.get(&format!("/hosts/{}", id)).await;
        if res.status() == reqwest::StatusCode::NOT_FOUND {
            return None;
        }
        Some(res.json().await.unwrap())
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        self.task.await.unwrap().unwrap();
    }
}

/// Poll `check` every 100ms until it returns true or `timeout` elapses.
pub async fn wait_for<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    false
}
