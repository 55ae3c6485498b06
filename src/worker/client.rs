//! HTTP client for worker hosts.
//!
//! # Responsibilities
//! - Resolve a host identifier into a worker base URL
//! - Probe the worker status endpoint
//! - Send replica-creation commands
//!
//! # Design Decisions
//! - Every call is bounded by its own timeout
//! - Any non-2xx status is a failure, never retried here

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, Uri};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use serde::Serialize;
use tokio::time;
use url::Url;

use crate::config::WorkerConfig;
use crate::error::{FleetError, FleetResult};

/// Outbound operations against a worker host.
#[async_trait]
pub trait WorkerClient: Send + Sync {
    /// Reachability check. `Ok` means the worker answered with a success status.
    async fn probe(&self, host: &str) -> FleetResult<()>;

    /// Ask the worker to create `count` replicas.
    async fn create_replicas(&self, host: &str, count: u32) -> FleetResult<()>;
}

#[derive(Debug, Serialize)]
struct ScaleCommand<'a> {
    count: u32,
    #[serde(rename = "serviceName", skip_serializing_if = "Option::is_none")]
    service_name: Option<&'a str>,
}

/// [`WorkerClient`] speaking plain HTTP/1.1.
#[derive(Clone)]
pub struct HttpWorkerClient {
    client: Client<HttpConnector, Body>,
    config: WorkerConfig,
    probe_timeout: Duration,
    scale_timeout: Duration,
}

impl HttpWorkerClient {
    pub fn new(config: WorkerConfig, probe_timeout: Duration, scale_timeout: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Self {
            client,
            config,
            probe_timeout,
            scale_timeout,
        }
    }

    /// Build the URI of `path` on `host`, applying the default worker port.
    pub fn endpoint(&self, host: &str, path: &str) -> FleetResult<Uri> {
        let mut url = Url::parse(&format!("http://{}", host))
            .map_err(|e| FleetError::remote(host, format!("invalid worker address: {}", e)))?;
        if url.port().is_none() {
            url.set_port(Some(self.config.port))
                .map_err(|_| FleetError::remote(host, "invalid worker address: cannot set port"))?;
        }
        url.set_path(path);

        url.as_str()
            .parse()
            .map_err(|e| FleetError::remote(host, format!("invalid worker URI: {}", e)))
    }

    async fn send(&self, host: &str, request: Request<Body>, timeout: Duration) -> FleetResult<()> {
        match time::timeout(timeout, self.client.request(request)).await {
            Ok(Ok(response)) if response.status().is_success() => Ok(()),
            Ok(Ok(response)) => Err(FleetError::remote(
                host,
                format!("unexpected status {}", response.status()),
            )),
            Ok(Err(e)) => Err(FleetError::remote(host, format!("connection error: {}", e))),
            Err(_) => Err(FleetError::remote(
                host,
                format!("timed out after {}ms", timeout.as_millis()),
            )),
        }
    }
}

#[async_trait]
impl WorkerClient for HttpWorkerClient {
    async fn probe(&self, host: &str) -> FleetResult<()> {
        let uri = self.endpoint(host, &self.config.status_path)?;
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(header::USER_AGENT, "fleet-controller-health-check")
            .body(Body::empty())
            .map_err(|e| FleetError::remote(host, e))?;

        self.send(host, request, self.probe_timeout).await
    }

    async fn create_replicas(&self, host: &str, count: u32) -> FleetResult<()> {
        let uri = self.endpoint(host, &self.config.scale_path)?;
        let command = ScaleCommand {
            count,
            service_name: self.config.service_name.as_deref(),
        };
        let body = serde_json::to_vec(&command).map_err(|e| FleetError::remote(host, e))?;
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .map_err(|e| FleetError::remote(host, e))?;

        self.send(host, request, self.scale_timeout).await
    }
}
