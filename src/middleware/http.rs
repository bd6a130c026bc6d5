//! HTTP normalization stages: header names, JSON bodies, client errors

use std::collections::BTreeMap;

use serde_json::Value;

use super::context::Invocation;
use super::envelope::TransportResponse;
use super::errors::{PipelineError, PipelineResult};
use super::{Flow, Middleware};

/// Lower-cases every request header name
#[derive(Debug, Default, Clone, Copy)]
pub struct HeaderNormalizer;

impl Middleware for HeaderNormalizer {
    fn name(&self) -> &'static str {
        "header_normalizer"
    }

    fn before(&self, inv: &mut Invocation) -> PipelineResult<Flow> {
        if let Some(headers) = inv.request.headers.take() {
            let normalized: BTreeMap<String, String> = headers
                .into_iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v))
                .collect();
            inv.request.headers = Some(normalized);
        }
        Ok(Flow::Continue)
    }
}

/// Parses a string body when the request declares JSON content
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonBodyParser;

impl JsonBodyParser {
    fn is_json(content_type: &str) -> bool {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
    }
}

impl Middleware for JsonBodyParser {
    fn name(&self) -> &'static str {
        "json_body_parser"
    }

    fn before(&self, inv: &mut Invocation) -> PipelineResult<Flow> {
        let declared_json = inv
            .request
            .header_value("content-type")
            .is_some_and(Self::is_json);
        if !declared_json || inv.request.body_is_absent() {
            return Ok(Flow::Continue);
        }

        if let Some(Value::String(raw)) = &inv.request.body {
            let parsed: Value = serde_json::from_str(raw).map_err(|_| {
                PipelineError::UnprocessableEntity(
                    "Content type defined as JSON but an invalid JSON was provided".into(),
                )
            })?;
            inv.request.body = Some(parsed);
        }
        Ok(Flow::Continue)
    }
}

/// Replaces the error envelope with the client status and message for
/// errors that may be exposed to the caller
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpErrorHandler;

impl Middleware for HttpErrorHandler {
    fn name(&self) -> &'static str {
        "http_error_handler"
    }

    fn on_error(&self, inv: &mut Invocation, error: &PipelineError) {
        if error.is_exposed() {
            inv.response = Some(TransportResponse::text(error.status_code(), error.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::context::RequestContext;
    use crate::middleware::envelope::TransportRequest;
    use serde_json::json;

    fn invocation(request: TransportRequest) -> Invocation {
        Invocation::new(request, RequestContext::new("test"))
    }

    #[test]
    fn test_headers_lower_cased() {
        let mut inv = invocation(TransportRequest::default().header("Content-Type", "text/plain"));
        HeaderNormalizer.before(&mut inv).unwrap();

        let headers = inv.request.headers.unwrap();
        assert!(headers.contains_key("content-type"));
        assert!(!headers.contains_key("Content-Type"));
    }

    #[test]
    fn test_json_body_parsed() {
        let request = TransportRequest::with_body(json!(r#"{"id":"u1"}"#))
            .header("content-type", "application/json; charset=utf-8");
        let mut inv = invocation(request);

        JsonBodyParser.before(&mut inv).unwrap();
        assert_eq!(inv.request.body, Some(json!({"id": "u1"})));
    }

    #[test]
    fn test_invalid_json_is_unprocessable() {
        let request =
            TransportRequest::with_body(json!("{not json")).header("content-type", "application/json");
        let mut inv = invocation(request);

        let err = JsonBodyParser.before(&mut inv).unwrap_err();
        assert_eq!(err.status_code(), 422);
    }

    #[test]
    fn test_string_body_without_json_header_untouched() {
        let mut inv = invocation(TransportRequest::with_body(json!(r#"{"id":"u1"}"#)));
        JsonBodyParser.before(&mut inv).unwrap();
        assert_eq!(inv.request.body, Some(json!(r#"{"id":"u1"}"#)));
    }

    #[test]
    fn test_vendor_json_types() {
        assert!(JsonBodyParser::is_json("application/vnd.api+json"));
        assert!(!JsonBodyParser::is_json("text/html"));
    }

    #[test]
    fn test_error_handler_only_exposes_client_errors() {
        let mut inv = invocation(TransportRequest::default());
        HttpErrorHandler.on_error(&mut inv, &PipelineError::Internal("secret".into()));
        assert!(inv.response.is_none());

        HttpErrorHandler.on_error(&mut inv, &PipelineError::InvalidBody("bad".into()));
        assert_eq!(inv.response.unwrap().status_code, 400);
    }
}
