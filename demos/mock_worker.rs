//! A pretend worker host for trying the controller locally.
//!
//! ```text
//! cargo run --example mock_worker -- 8081
//! ```

use axum::{http::StatusCode, routing::{get, post}, Json, Router};
use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Deserialize)]
struct CreateReplica {
    count: u32,
    #[serde(rename = "serviceName")]
    service_name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let port: u16 = std::env::args()
        .nth(1)
        .map(|p| p.parse())
        .transpose()?
        .unwrap_or(8081);

    let app = Router::new()
        .route("/status", get(|| async { "Worker is healthy" }))
        .route(
            "/createReplica",
            post(|Json(body): Json<CreateReplica>| async move {
                println!(
                    "Creating {} replicas of {}",
                    body.count,
                    body.service_name.as_deref().unwrap_or("default service")
                );
                StatusCode::CREATED
            }),
        );

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    println!("Mock worker is listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
