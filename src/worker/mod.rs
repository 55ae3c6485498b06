//! Outbound calls to worker hosts.
//!
//! # Data Flow
//! ```text
//! HealthMonitor  → probe()            → GET  http://{host}:{port}/status
//! Redistributor  → create_replicas()  → POST http://{host}:{port}/createReplica
//! ScalingCoordinator ↗
//! ```

pub mod client;
#[cfg(test)]
pub(crate) mod mock;

pub use client::{HttpWorkerClient, WorkerClient};
