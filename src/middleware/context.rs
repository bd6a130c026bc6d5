//! Invocation Context
//!
//! The single mutable value every pipeline stage operates on.

use std::time::Instant;

use uuid::Uuid;

use crate::codec::Record;

use super::envelope::{HandlerResponse, TransportRequest, TransportResponse};

/// Per-request metadata handed to the handler
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Request ID for tracing
    pub request_id: Uuid,

    /// Name of the wrapped handler
    pub function_name: String,

    started_at: Instant,
}

impl RequestContext {
    pub fn new(function_name: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            function_name: function_name.into(),
            started_at: Instant::now(),
        }
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u128 {
        self.started_at.elapsed().as_millis()
    }
}

/// State of one invocation as it moves through the stages
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Inbound envelope; stages may rewrite it
    pub request: TransportRequest,

    /// Merged body and query fields, set by the before phase
    pub payload: Record,

    /// Handler result, consumed by the after phase
    pub outcome: Option<HandlerResponse>,

    /// Final envelope, once a stage has produced it
    pub response: Option<TransportResponse>,

    pub context: RequestContext,
}

impl Invocation {
    pub fn new(request: TransportRequest, context: RequestContext) -> Self {
        Self {
            request,
            payload: Record::new(),
            outcome: None,
            response: None,
            context,
        }
    }
}
