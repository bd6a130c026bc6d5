//! # Codec Errors

use thiserror::Error;

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Malformed stored representation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// `N` value that is not a decimal number
    #[error("Attribute '{path}' holds an invalid number: {value}")]
    InvalidNumber { path: String, value: String },

    /// `NULL` value other than `true`
    #[error("Attribute '{path}' holds a malformed null")]
    MalformedNull { path: String },
}

impl CodecError {
    /// Attribute path the error was found at
    pub fn path(&self) -> &str {
        match self {
            CodecError::InvalidNumber { path, .. } => path,
            CodecError::MalformedNull { path } => path,
        }
    }
}
