//! Redistribution subsystem.
//!
//! # Data Flow
//! ```text
//! HealthEvent::HostDown
//!     → engine.rs: Registry::begin_drain() (host must be Down; its status
//!       is frozen until the drain settles)
//!     → Registry::snapshot(), keep Running hosts except the failed one
//!     → split.rs: base + remainder split in identifier order
//!     → scale command per non-zero share (concurrent, failures logged)
//!     → Registry::add_replicas() per confirmed share
//!     → Registry::finish_drain(): remove the host, or drain again what a
//!       confirmed scale added meanwhile
//! ```
//!
//! # Design Decisions
//! - No rollback or retry of individual placements
//! - Workload with no eligible target is parked and retried, or dropped,
//!   per `UnplacedPolicy`

pub mod engine;
pub mod split;

pub use engine::{FailedPlacement, RedistributionReport, Redistributor};
pub use split::{split_replicas, Placement};
