//! Execution Pipeline
//!
//! before (registration order) → handler → after (reverse order).
//! Any error raised on the way runs on_error (reverse order) and is
//! returned together with the response the stages formatted.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::codec::Record;

use super::context::{Invocation, RequestContext};
use super::convert::ConvertHandler;
use super::envelope::{HandlerResponse, TransportRequest, TransportResponse};
use super::errors::{HandledError, PipelineError, PipelineResult};
use super::http::{HeaderNormalizer, HttpErrorHandler, JsonBodyParser};
use super::{Flow, Middleware};

/// Boxed future returned by handlers
pub type HandlerFuture = Pin<Box<dyn Future<Output = PipelineResult<HandlerResponse>> + Send>>;

/// The wrapped request-handling function: `(payload, context) -> result`
pub trait Handler: Send + Sync {
    fn call(&self, payload: Record, ctx: RequestContext) -> HandlerFuture;
}

impl<F, Fut> Handler for F
where
    F: Fn(Record, RequestContext) -> Fut + Send + Sync,
    Fut: Future<Output = PipelineResult<HandlerResponse>> + Send + 'static,
{
    fn call(&self, payload: Record, ctx: RequestContext) -> HandlerFuture {
        Box::pin(self(payload, ctx))
    }
}

/// A handler wrapped in its middleware stages
pub struct Pipeline {
    function_name: String,
    middleware: Vec<Arc<dyn Middleware>>,
    handler: Arc<dyn Handler>,
}

impl Pipeline {
    /// Create a pipeline with no stages
    pub fn new(function_name: impl Into<String>, handler: impl Handler + 'static) -> Self {
        Self {
            function_name: function_name.into(),
            middleware: Vec::new(),
            handler: Arc::new(handler),
        }
    }

    /// Header normalizer, JSON body parser, HTTP error handler, convert handler
    pub fn standard(function_name: impl Into<String>, handler: impl Handler + 'static) -> Self {
        Self::new(function_name, handler)
            .with_middleware(HeaderNormalizer)
            .with_middleware(JsonBodyParser)
            .with_middleware(HttpErrorHandler)
            .with_middleware(ConvertHandler)
    }

    /// Add middleware to the pipeline
    pub fn with_middleware(mut self, m: impl Middleware + 'static) -> Self {
        self.middleware.push(Arc::new(m));
        self
    }

    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    /// Stage names in registration order
    pub fn middleware_names(&self) -> Vec<&'static str> {
        self.middleware.iter().map(|m| m.name()).collect()
    }

    /// Run one request through every stage and the handler
    pub async fn invoke(&self, request: TransportRequest) -> Result<TransportResponse, HandledError> {
        let mut inv = Invocation::new(request, RequestContext::new(&self.function_name));

        for m in &self.middleware {
            match m.before(&mut inv) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Respond(response)) => return Ok(response),
                Err(e) => return Err(self.fail(&mut inv, e)),
            }
        }

        match self
            .handler
            .call(inv.payload.clone(), inv.context.clone())
            .await
        {
            Ok(outcome) => inv.outcome = Some(outcome),
            Err(e) => return Err(self.fail(&mut inv, e)),
        }

        for m in self.middleware.iter().rev() {
            if let Err(e) = m.after(&mut inv) {
                return Err(self.fail(&mut inv, e));
            }
        }

        Ok(match inv.response.take() {
            Some(response) => response,
            None => inv.outcome.take().unwrap_or_default().into_transport(),
        })
    }

    fn fail(&self, inv: &mut Invocation, error: PipelineError) -> HandledError {
        for m in self.middleware.iter().rev() {
            m.on_error(inv, &error);
        }

        let response = inv.response.take().unwrap_or_else(|| {
            TransportResponse::json(error.status_code(), &error.to_json())
        });
        HandledError {
            response,
            source: error,
        }
    }
}
