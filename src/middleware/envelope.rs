//! Transport envelopes and handler results
//!
//! Inbound: `{body, queryStringParameters, headers}`.
//! Outbound: `{statusCode, body, headers}` with `body` serialized.

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};

use crate::codec::Record;
use crate::table::AccessError;

/// String form of an absent body or query
pub const ABSENT_MARKER: &str = "null";

/// Request as delivered by the invoking transport
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportRequest {
    #[serde(default)]
    pub body: Option<Value>,
    #[serde(default, deserialize_with = "query_or_marker")]
    pub query_string_parameters: Option<Map<String, Value>>,
    #[serde(default)]
    pub headers: Option<BTreeMap<String, String>>,
}

impl TransportRequest {
    /// Request carrying a structured body
    pub fn with_body(body: Value) -> Self {
        Self {
            body: Some(body),
            ..Default::default()
        }
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_string_parameters
            .get_or_insert_with(Map::new)
            .insert(key.into(), Value::String(value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// True when the body is missing, JSON null, or the `"null"` marker
    pub fn body_is_absent(&self) -> bool {
        match &self.body {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s == ABSENT_MARKER,
            Some(_) => false,
        }
    }

    /// Header lookup, case-insensitive
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers.as_ref()?.iter().find_map(|(k, v)| {
            if k.eq_ignore_ascii_case(name) {
                Some(v.as_str())
            } else {
                None
            }
        })
    }
}

/// Query parameters, with null and the `"null"` marker read as absent
fn query_or_marker<'de, D>(deserializer: D) -> Result<Option<Map<String, Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s == ABSENT_MARKER => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(other) => Err(D::Error::custom(format!(
            "queryStringParameters must be an object, got {}",
            other
        ))),
    }
}

/// Response handed back to the invoking transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportResponse {
    pub status_code: u16,
    pub body: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl TransportResponse {
    /// Response with `value` serialized as the body
    pub fn json(status_code: u16, value: &Value) -> Self {
        Self {
            status_code,
            body: value.to_string(),
            headers: BTreeMap::new(),
        }
    }

    /// Response with a plain-text body
    pub fn text(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            body: body.into(),
            headers: BTreeMap::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Parse the body back into JSON
    pub fn body_json(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.body)
    }
}

/// What a handler returns: `{statusCode?, result?}`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub result: Option<Value>,
}

impl HandlerResponse {
    pub fn new(status_code: u16, result: Value) -> Self {
        Self {
            status_code: Some(status_code),
            result: Some(result),
        }
    }

    pub fn ok(result: Value) -> Self {
        Self::new(200, result)
    }

    /// Error-shaped result for an expected failure
    pub fn from_error(error: &AccessError) -> Self {
        Self::new(
            error.status_code(),
            json!({
                "code": error.code(),
                "message": error.to_string(),
            }),
        )
    }

    /// Transport form; status defaults to 500 and result to `{}`
    pub fn into_transport(self) -> TransportResponse {
        let status = self.status_code.unwrap_or(500);
        let result = self.result.unwrap_or_else(|| Value::Object(Record::new()));
        TransportResponse::json(status, &result)
    }
}
