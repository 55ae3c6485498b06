//! Controller API handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::audit::action;
use crate::error::{FleetError, FleetResult};
use crate::http::response::HostResponse;
use crate::http::server::AppState;
use crate::registry::{HostRecord, HostStatus, StatusCounts};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub host: String,
    #[serde(default)]
    pub status: Option<HostStatus>,
    #[serde(default)]
    pub replicas: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ScaleRequest {
    pub host: String,
    pub replicas: u32,
}

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub hosts: StatusCounts,
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> FleetResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| FleetError::MalformedRequest(rejection.body_text()))
}

pub async fn register_host(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<HostResponse>), FleetError> {
    let request = json_body(payload)?;
    let host = request.host.trim();
    if host.is_empty() {
        return Err(FleetError::MalformedRequest("host must not be empty".into()));
    }
    let status = request.status.unwrap_or_default();
    if status == HostStatus::Down {
        return Err(FleetError::MalformedRequest(
            "a host cannot be registered as down".into(),
        ));
    }
    let replicas = request.replicas.unwrap_or(0);

    let record = state.registry.register(host, status, replicas);
    tracing::info!(host = %host, status = %status, replicas, "Registered host");
    state.audit.record(
        action::REGISTER_HOST,
        host,
        format!("Registered as {} with {} replicas", status, replicas),
    );

    Ok((
        StatusCode::CREATED,
        Json(HostResponse::success("Host registered", record)),
    ))
}

pub async fn scale_host(
    State(state): State<AppState>,
    payload: Result<Json<ScaleRequest>, JsonRejection>,
) -> Result<Json<HostResponse>, FleetError> {
    let request = json_body(payload)?;
    let host = request.host.trim();
    if host.is_empty() {
        return Err(FleetError::MalformedRequest("host must not be empty".into()));
    }
    let record = state.coordinator.scale(host, request.replicas).await?;
    Ok(Json(HostResponse::success("Replicas scaled", record)))
}

pub async fn list_hosts(State(state): State<AppState>) -> Json<Vec<HostRecord>> {
    Json(state.registry.snapshot())
}

pub async fn get_host(
    State(state): State<AppState>,
    Path(host): Path<String>,
) -> Result<Json<HostRecord>, FleetError> {
    state
        .registry
        .get(&host)
        .map(Json)
        .ok_or(FleetError::HostNotFound(host))
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        hosts: state.registry.status_counts(),
    })
}
