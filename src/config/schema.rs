//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the controller.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the fleet controller.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ControllerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// How to reach worker hosts.
    pub worker: WorkerConfig,

    /// Health check settings.
    pub health_check: HealthCheckConfig,

    /// Redistribution settings.
    pub redistribution: RedistributionConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Audit log settings.
    pub audit: AuditConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Worker endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Port used when a host identifier carries none.
    pub port: u16,

    /// Path probed for health.
    pub status_path: String,

    /// Path receiving scale commands.
    pub scale_path: String,

    /// Workload name sent along with scale commands.
    pub service_name: Option<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            port: 8081,
            status_path: "/status".to_string(),
            scale_path: "/createReplica".to_string(),
            service_name: None,
        }
    }
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable the background monitor.
    pub enabled: bool,

    /// Probe cycle interval in seconds.
    pub interval_secs: u64,

    /// Per-probe timeout in seconds.
    pub timeout_secs: u64,
}

impl HealthCheckConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 30,
            timeout_secs: 5,
        }
    }
}

/// What happens to a failed host's workload when no Running host is left.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnplacedPolicy {
    /// Keep the Down record and retry placement periodically.
    #[default]
    Retain,
    /// Remove the Down record; its replicas are reported lost.
    Drop,
}

/// Redistribution configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RedistributionConfig {
    pub unplaced_policy: UnplacedPolicy,

    /// Interval between retries of parked workloads, in seconds.
    pub retry_interval_secs: u64,
}

impl RedistributionConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }
}

impl Default for RedistributionConfig {
    fn default() -> Self {
        Self {
            unplaced_policy: UnplacedPolicy::Retain,
            retry_interval_secs: 30,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Inbound request timeout in seconds.
    pub request_secs: u64,

    /// Outbound scale command timeout in seconds.
    pub scale_secs: u64,
}

impl TimeoutConfig {
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    pub fn scale(&self) -> Duration {
        Duration::from_secs(self.scale_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            scale_secs: 5,
        }
    }
}

/// Audit log configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    pub enabled: bool,

    /// File receiving one JSON record per line.
    pub path: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "controller_logs.json".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
