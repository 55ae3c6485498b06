//! Response bodies and error mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::FleetError;
use crate::registry::HostRecord;

/// Success body carrying the affected host record.
#[derive(Debug, Serialize)]
pub struct HostResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub host: HostRecord,
}

impl HostResponse {
    pub fn success(message: &'static str, host: HostRecord) -> Self {
        Self {
            status: "success",
            message,
            host,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    status: &'static str,
    message: String,
}

impl FleetError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            FleetError::HostNotFound(_) => StatusCode::NOT_FOUND,
            FleetError::HostDown(_) => StatusCode::CONFLICT,
            FleetError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            FleetError::RemoteUnreachable { .. } => StatusCode::BAD_GATEWAY,
            FleetError::NoActiveHosts { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for FleetError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!(status = %status, error = %self, "Request failed");
        } else {
            tracing::debug!(status = %status, error = %self, "Request rejected");
        }
        let body = ErrorBody {
            status: "error",
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
