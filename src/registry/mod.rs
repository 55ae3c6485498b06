//! Host registry subsystem.
//!
//! # Data Flow
//! ```text
//! POST /register ──▶ store.rs (insert/replace)
//! HealthMonitor  ──▶ store.rs (status transitions)
//! Scale / Redistribution ──▶ store.rs (replica counts, removal)
//! Everyone       ◀── snapshot() (ordered, lock released before I/O)
//! ```

pub mod host;
pub mod store;

pub use host::{HostRecord, HostStatus};
pub use store::{DrainOutcome, Registry, StatusCounts};
