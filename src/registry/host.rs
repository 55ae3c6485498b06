//! Host record and status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Observed status of a worker host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostStatus {
    /// Registered, no probe has completed yet.
    #[default]
    Unknown,
    /// Last probe succeeded.
    Running,
    /// Last probe failed; the host is awaiting redistribution.
    Down,
}

impl HostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HostStatus::Unknown => "unknown",
            HostStatus::Running => "running",
            HostStatus::Down => "down",
        }
    }
}

impl fmt::Display for HostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single registered worker host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    /// Host identifier, `name` or `name:port`.
    pub host: String,
    /// Current status.
    pub status: HostStatus,
    /// Number of replicas assigned to this host.
    #[serde(rename = "replicas")]
    pub replica_count: u32,
}

impl HostRecord {
    pub fn new(host: impl Into<String>, status: HostStatus, replica_count: u32) -> Self {
        Self {
            host: host.into(),
            status,
            replica_count,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == HostStatus::Running
    }

    pub fn is_down(&self) -> bool {
        self.status == HostStatus::Down
    }
}
