//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the controller API
//! - Wire up middleware (tracing, timeout, request ID)
//! - Serve on a listener until the shutdown signal fires

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::audit::AuditLog;
use crate::config::ControllerConfig;
use crate::http::handlers;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::registry::Registry;
use crate::scaling::ScalingCoordinator;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub coordinator: ScalingCoordinator,
    pub audit: AuditLog,
}

/// HTTP server for the controller API.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: &ControllerConfig, state: AppState) -> Self {
        Self {
            router: Self::build_router(config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ControllerConfig, state: AppState) -> Router {
        Router::new()
            .route("/register", post(handlers::register_host))
            .route("/scale", post(handlers::scale_host))
            .route("/hosts", get(handlers::list_hosts))
            .route("/hosts/{host}", get(handlers::get_host))
            .route("/status", get(handlers::get_status))
            .with_state(state)
            .layer(TimeoutLayer::new(config.timeouts.request()))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// The assembled router, for serving on a custom transport.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server received shutdown signal");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
