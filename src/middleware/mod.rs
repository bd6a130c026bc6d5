//! # Middleware Pipeline
//!
//! Wraps a request handler so it never sees raw transport envelopes.
//! Stages operate on one mutable [`Invocation`]: `before` may rewrite
//! the request or end the invocation with a final response, `after`
//! shapes the handler result, `on_error` formats failures.

mod context;
mod convert;
mod envelope;
mod errors;
mod http;
mod pipeline;

pub use context::{Invocation, RequestContext};
pub use convert::{ConvertHandler, BODY_NOT_OBJECT, INTERNAL_ERROR_MESSAGE};
pub use envelope::{HandlerResponse, TransportRequest, TransportResponse, ABSENT_MARKER};
pub use errors::{HandledError, PipelineError, PipelineResult};
pub use http::{HeaderNormalizer, HttpErrorHandler, JsonBodyParser};
pub use pipeline::{Handler, HandlerFuture, Pipeline};

/// What a `before` stage decided
#[derive(Debug)]
pub enum Flow {
    /// Run the next stage
    Continue,
    /// Stop here and return this response; the handler is not called
    Respond(TransportResponse),
}

/// A pipeline stage. Every phase defaults to a no-op.
pub trait Middleware: Send + Sync {
    /// Stage name for diagnostics
    fn name(&self) -> &'static str;

    fn before(&self, _inv: &mut Invocation) -> PipelineResult<Flow> {
        Ok(Flow::Continue)
    }

    fn after(&self, _inv: &mut Invocation) -> PipelineResult<()> {
        Ok(())
    }

    /// Runs for any error raised in before, the handler, or after.
    /// The error keeps propagating after every stage has seen it.
    fn on_error(&self, _inv: &mut Invocation, _error: &PipelineError) {}
}
