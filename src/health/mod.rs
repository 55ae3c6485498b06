//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Periodic timer
//!     → Registry::snapshot() (lock released immediately)
//!     → Probe each host concurrently, each bounded by a timeout
//!     → Registry::set_status() per result
//!     → HealthEvent::HostDown on a fresh Down transition
//!     → Redistributor
//! ```
//!
//! # State Transitions
//! ```text
//! Unknown/Running → Down: a single failed or timed-out probe
//! Unknown/Down → Running: a single successful probe
//! Down → Down:            no-op (no second event)
//! ```

pub mod monitor;

pub use monitor::{CycleReport, HealthMonitor};

/// Events emitted by the monitor for the redistribution task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    /// `host` just transitioned to Down holding `replicas`.
    HostDown { host: String, replicas: u32 },
}
