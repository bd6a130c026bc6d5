//! # Table Accessor Errors
//!
//! Validation, not-found and conflict are expected outcomes and map to
//! client statuses. Store and decode failures are unexpected and map
//! to 500.

use thiserror::Error;

use crate::codec::CodecError;
use crate::expression::ExpressionError;
use crate::store::StoreError;

/// Result type for table operations
pub type AccessResult<T> = Result<T, AccessError>;

/// Table accessor errors
#[derive(Debug, Clone, Error)]
pub enum AccessError {
    /// Table name rejected at construction
    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    /// Malformed caller input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Target record does not exist
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Record with the same id already exists
    #[error("Record already exists: {0}")]
    Conflict(String),

    /// Underlying store call failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Stored representation is malformed
    #[error("Decode error: {0}")]
    Decode(#[from] CodecError),
}

impl AccessError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            AccessError::Validation(_) => 400,
            AccessError::NotFound(_) => 404,
            AccessError::Conflict(_) => 409,
            AccessError::InvalidTableName(_) => 500,
            AccessError::Store(_) => 500,
            AccessError::Decode(_) => 500,
        }
    }

    /// Stable error code for response bodies
    pub fn code(&self) -> &'static str {
        match self {
            AccessError::InvalidTableName(_) => "INVALID_TABLE_NAME",
            AccessError::Validation(_) => "VALIDATION_ERROR",
            AccessError::NotFound(_) => "NOT_FOUND",
            AccessError::Conflict(_) => "CONFLICT",
            AccessError::Store(_) => "STORE_ERROR",
            AccessError::Decode(_) => "DECODE_ERROR",
        }
    }

    /// Expected outcomes are reported as results, never raised
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            AccessError::Validation(_) | AccessError::NotFound(_) | AccessError::Conflict(_)
        )
    }
}

impl From<ExpressionError> for AccessError {
    fn from(e: ExpressionError) -> Self {
        AccessError::Validation(e.to_string())
    }
}
