//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, ports valid, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ControllerConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ControllerConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &ControllerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.worker.port == 0 {
        errors.push(ValidationError::new("worker.port", "must be non-zero"));
    }
    for (field, path) in [
        ("worker.status_path", &config.worker.status_path),
        ("worker.scale_path", &config.worker.scale_path),
    ] {
        if !path.starts_with('/') {
            errors.push(ValidationError::new(field, "must start with '/'"));
        }
    }

    if config.health_check.interval_secs == 0 {
        errors.push(ValidationError::new("health_check.interval_secs", "must be greater than 0"));
    }
    if config.health_check.timeout_secs == 0 {
        errors.push(ValidationError::new("health_check.timeout_secs", "must be greater than 0"));
    }
    if config.redistribution.retry_interval_secs == 0 {
        errors.push(ValidationError::new(
            "redistribution.retry_interval_secs",
            "must be greater than 0",
        ));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }
    if config.timeouts.scale_secs == 0 {
        errors.push(ValidationError::new("timeouts.scale_secs", "must be greater than 0"));
    }

    if config.audit.enabled && config.audit.path.trim().is_empty() {
        errors.push(ValidationError::new("audit.path", "required when audit is enabled"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ControllerConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = ControllerConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.worker.status_path = "status".into();
        config.health_check.interval_secs = 0;
        config.audit.path = " ".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "worker.status_path",
                "health_check.interval_secs",
                "audit.path",
            ]
        );
    }

    #[test]
    fn test_audit_path_ignored_when_disabled() {
        let mut config = ControllerConfig::default();
        config.audit.enabled = false;
        config.audit.path = String::new();
        assert!(validate_config(&config).is_ok());
    }
}
