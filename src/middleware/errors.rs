//! # Pipeline Errors

use serde_json::{json, Value};
use thiserror::Error;

use crate::table::AccessError;

use super::envelope::TransportResponse;

/// Result type for pipeline stages and handlers
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors raised during before, handler or after
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    /// Request body is not usable
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// Body declared as JSON but does not parse
    #[error("{0}")]
    UnprocessableEntity(String),

    /// Table access failed
    #[error("{0}")]
    Access(#[from] AccessError),

    /// Anything else a handler raises
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            PipelineError::InvalidBody(_) => 400,
            PipelineError::UnprocessableEntity(_) => 422,
            PipelineError::Access(e) => e.status_code(),
            PipelineError::Internal(_) => 500,
        }
    }

    /// Client errors may be shown to the caller as-is
    pub fn is_exposed(&self) -> bool {
        self.status_code() < 500
    }

    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::InvalidBody(_) => "INVALID_BODY",
            PipelineError::UnprocessableEntity(_) => "UNPROCESSABLE_ENTITY",
            PipelineError::Access(e) => e.code(),
            PipelineError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Serialized form embedded in error responses
    pub fn to_json(&self) -> Value {
        json!({
            "code": self.code(),
            "message": self.to_string(),
        })
    }
}

/// A failed invocation: the response formatted by the error stages,
/// together with the error that caused it
#[derive(Debug, Clone, Error)]
#[error("{source}")]
pub struct HandledError {
    pub response: TransportResponse,
    pub source: PipelineError,
}
