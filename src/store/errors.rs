//! # Store Errors

use thiserror::Error;

use crate::codec::WireRecord;

/// Result type for store calls
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures reported by the underlying store
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// A write guard did not hold. `old_item` is the item as it existed
    /// when the caller asked for it and it was present.
    #[error("The conditional request failed: {condition}")]
    ConditionalCheckFailed {
        condition: String,
        old_item: Option<WireRecord>,
    },

    #[error("Requested resource not found: table {0}")]
    TableNotFound(String),

    /// Request rejected as malformed by the store
    #[error("Invalid store request: {0}")]
    Validation(String),

    #[error("Request throttled: {0}")]
    Throttled(String),

    /// Network, permission or internal store failure
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// True for guard failures
    pub fn is_condition_failure(&self) -> bool {
        matches!(self, StoreError::ConditionalCheckFailed { .. })
    }

    /// Error name as reported on the wire
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::ConditionalCheckFailed { .. } => "ConditionalCheckFailedException",
            StoreError::TableNotFound(_) => "ResourceNotFoundException",
            StoreError::Validation(_) => "ValidationException",
            StoreError::Throttled(_) => "ThrottlingException",
            StoreError::Unavailable(_) => "InternalServerError",
        }
    }
}
