//! # Expression Errors

use thiserror::Error;

/// Result type for patch and expression construction
pub type ExpressionResult<T> = Result<T, ExpressionError>;

/// Invalid patch input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    #[error("Record must contain an id")]
    MissingId,

    #[error("Invalid id: {0}")]
    InvalidId(String),

    #[error("Field '{0}' is reserved and cannot be set directly")]
    ReservedField(String),

    #[error("Field name must not be empty")]
    EmptyFieldName,

    #[error("Field '{0}' must be an integer timestamp in milliseconds")]
    InvalidTimestamp(String),
}
