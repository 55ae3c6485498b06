//! Fleet controller library.
//!
//! Keeps a registry of worker hosts, probes them periodically, moves the
//! replicas of failed hosts onto healthy ones and applies operator scale
//! requests.

pub mod audit;
pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod redistribution;
pub mod registry;
pub mod scaling;
pub mod worker;

pub use config::ControllerConfig;
pub use error::{FleetError, FleetResult};
pub use http::HttpServer;
pub use lifecycle::{Controller, Shutdown};
pub use registry::{HostRecord, HostStatus, Registry};
