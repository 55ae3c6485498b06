//! Operator-driven scaling.
//!
//! The coordinator forwards the desired replica count to the worker first
//! and only updates the registry once the worker confirmed it. A host that
//! was removed or marked Down while the command was in flight is reported,
//! never resurrected.

pub mod coordinator;

pub use coordinator::ScalingCoordinator;
