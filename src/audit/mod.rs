//! Audit trail.
//!
//! # Data Flow
//! ```text
//! registration / status change / redistribution / scale
//!     → AuditLog::record (assigns a unique, increasing id)
//!     → unbounded channel
//!     → AuditWriter (appends one JSON object per line)
//! ```

pub mod log;

pub use log::{action, AuditLog, AuditRecord, AuditWriter};
