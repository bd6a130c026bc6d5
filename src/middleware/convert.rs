//! Envelope conversion stage
//!
//! - before: merge body fields and query fields into the payload
//!   (query wins on key collision); a body that is not a mapping ends
//!   the invocation with 400
//! - after: serialize the handler result into the outbound envelope
//! - on_error: uniform 500 envelope; the error keeps propagating

use serde_json::{json, Value};

use crate::codec::Record;
use crate::observability::Logger;

use super::context::Invocation;
use super::envelope::TransportResponse;
use super::errors::{PipelineError, PipelineResult};
use super::{Flow, Middleware};

/// Message returned when the body is not a mapping
pub const BODY_NOT_OBJECT: &str = "Data parameter must be object.";
/// Message of every error envelope
pub const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

/// Converts between transport envelopes and handler payloads
#[derive(Debug, Default, Clone, Copy)]
pub struct ConvertHandler;

impl Middleware for ConvertHandler {
    fn name(&self) -> &'static str {
        "convert_handler"
    }

    fn before(&self, inv: &mut Invocation) -> PipelineResult<Flow> {
        Logger::trace(
            "MIDDLEWARE_BEFORE",
            &[("function", &inv.context.function_name)],
        );

        let mut payload = Record::new();

        if !inv.request.body_is_absent() {
            match &inv.request.body {
                Some(Value::Object(body)) => {
                    payload.extend(body.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
                _ => {
                    Logger::warn(
                        "MIDDLEWARE_INVALID_BODY",
                        &[("request_id", &inv.context.request_id.to_string())],
                    );
                    return Ok(Flow::Respond(TransportResponse::json(
                        400,
                        &json!({ "message": BODY_NOT_OBJECT }),
                    )));
                }
            }
        }

        if let Some(query) = &inv.request.query_string_parameters {
            payload.extend(query.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        Logger::info(
            "MIDDLEWARE_PAYLOAD",
            &[
                ("payload", &Value::Object(payload.clone()).to_string()),
                ("request_id", &inv.context.request_id.to_string()),
            ],
        );
        inv.payload = payload;
        Ok(Flow::Continue)
    }

    fn after(&self, inv: &mut Invocation) -> PipelineResult<()> {
        Logger::trace(
            "MIDDLEWARE_AFTER",
            &[("function", &inv.context.function_name)],
        );

        let response = inv.outcome.take().unwrap_or_default().into_transport();
        Logger::debug(
            "MIDDLEWARE_RESULT",
            &[
                ("body", &response.body),
                ("elapsed_ms", &inv.context.elapsed_ms().to_string()),
            ],
        );
        inv.response = Some(response);
        Ok(())
    }

    fn on_error(&self, inv: &mut Invocation, error: &PipelineError) {
        Logger::trace(
            "MIDDLEWARE_ERROR",
            &[("function", &inv.context.function_name)],
        );
        Logger::error(
            "HANDLER_ERROR",
            &[
                ("error", &error.to_json().to_string()),
                ("request_id", &inv.context.request_id.to_string()),
            ],
        );

        inv.response = Some(TransportResponse::json(
            500,
            &json!({
                "message": INTERNAL_ERROR_MESSAGE,
                "error": error.to_json(),
            }),
        ));
    }
}
