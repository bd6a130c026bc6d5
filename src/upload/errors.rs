//! # Upload URL Errors

use thiserror::Error;

/// Result type for upload URL operations
pub type UploadResult<T> = Result<T, UploadError>;

/// Upload URL errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UploadError {
    #[error("Upload URL expired")]
    UrlExpired,

    #[error("Invalid upload URL signature")]
    InvalidSignature,

    #[error("Invalid upload settings: {0}")]
    InvalidSettings(String),
}
