//! Multi-key fetch input and per-id outcomes

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;

use crate::codec::Record;

use super::errors::{AccessError, AccessResult};

/// Message reported for ids that matched no record
pub const NOT_FOUND_MESSAGE: &str = "No Record Found";

/// Outcome for one id of a multi-key fetch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FetchEntry {
    Found(Record),
    /// Placeholder for an id with no record
    Missing { status: u16, message: String },
    /// Placeholder for an id whose lookup failed
    Failed { status: u16, message: String },
}

impl FetchEntry {
    pub fn missing() -> Self {
        FetchEntry::Missing {
            status: 400,
            message: NOT_FOUND_MESSAGE.to_string(),
        }
    }

    pub fn failed(error: &AccessError) -> Self {
        FetchEntry::Failed {
            status: error.status_code(),
            message: error.to_string(),
        }
    }

    pub fn record(&self) -> Option<&Record> {
        match self {
            FetchEntry::Found(record) => Some(record),
            _ => None,
        }
    }
}

/// Validated input for a multi-key fetch
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FetchManyRequest {
    pub ids: Vec<String>,
    pub fields: Vec<String>,
}

impl FetchManyRequest {
    /// Read `ids` and `fields` (both optional arrays of strings) from a
    /// payload; a missing `ids` fetches nothing
    pub fn from_payload(payload: &Record) -> AccessResult<Self> {
        let ids = match payload.get("ids") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => strings("ids", items)?,
            Some(_) => {
                return Err(AccessError::Validation(
                    "Invalid query parameter. Type should be array.".into(),
                ))
            }
        };

        let fields = match payload.get("fields") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => strings("fields", items)?,
            Some(_) => {
                return Err(AccessError::Validation(
                    "Invalid fields parameter. Type should be array.".into(),
                ))
            }
        };

        Ok(Self { ids, fields })
    }
}

fn strings(name: &str, items: &[Value]) -> AccessResult<Vec<String>> {
    items
        .iter()
        .map(|v| {
            v.as_str().map(str::to_string).ok_or_else(|| {
                AccessError::Validation(format!("Every entry of {} must be a string", name))
            })
        })
        .collect()
}

/// Remove duplicates, keeping first-seen order
pub fn dedup(values: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .iter()
        .filter(|v| seen.insert(v.as_str()))
        .cloned()
        .collect()
}
