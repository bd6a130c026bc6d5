//! Observability for the data-access layer
//!
//! Structured, leveled JSON logging. Observability is read-only: it has
//! no side effects on execution and never fails an operation.
//!
//! ```ignore
//! use tableaccess::observability::{Logger, Severity};
//!
//! Logger::set_min_severity(Severity::Debug);
//! Logger::info("RECORD_INSERT", &[("table", "actors"), ("id", "u1")]);
//! ```

mod logger;

pub use logger::{Logger, Severity};

use thiserror::Error;

/// Observability error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObservabilityError {
    /// Log level name not recognized
    #[error("Unknown log level: {0}")]
    UnknownLevel(String),
}
