//! Controller error taxonomy.

use thiserror::Error;

/// Errors produced by the fleet controller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FleetError {
    /// The operation referenced a host that is not registered.
    #[error("host not found: {0}")]
    HostNotFound(String),

    /// The host is marked Down and cannot be scaled.
    #[error("host is down: {0}")]
    HostDown(String),

    /// The inbound payload was invalid.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// A probe or scale command failed or timed out.
    #[error("host {host} unreachable: {reason}")]
    RemoteUnreachable { host: String, reason: String },

    /// Redistribution found no Running host to place the workload on.
    #[error("no active hosts to take {replicas} replicas from {host}")]
    NoActiveHosts { host: String, replicas: u32 },
}

impl FleetError {
    /// Build a `RemoteUnreachable` from any displayable cause.
    pub fn remote(host: &str, reason: impl std::fmt::Display) -> Self {
        Self::RemoteUnreachable {
            host: host.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for controller operations.
pub type FleetResult<T> = Result<T, FleetError>;
