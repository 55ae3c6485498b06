//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Registry, AuditLog, worker client → background tasks → HTTP
//!
//! Shutdown (shutdown.rs):
//!     Signal received → stop accepting → join tasks → flush audit → exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Listener is bound by the caller so tests can use ephemeral ports
//! - The audit writer stops last so the stop record reaches the file

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::wait_for_shutdown_signal;
pub use startup::Controller;
