//! # Record Codec
//!
//! Converts between native records (JSON objects) and the store's
//! attribute-typed wire representation. Supported value kinds are
//! string, number, boolean, null, list and map; the round trip is
//! lossless for all of them.

mod errors;
mod value;

pub use errors::{CodecError, CodecResult};
pub use value::{AttributeValue, WireRecord};

use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};

/// A record: field name to value. Every stored record carries a string `id`.
pub type Record = Map<String, Value>;

/// Encode a native record into its wire form
pub fn marshall(record: &Record) -> WireRecord {
    record
        .iter()
        .map(|(k, v)| (k.clone(), marshall_value(v)))
        .collect()
}

/// Encode a single native value
pub fn marshall_value(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(items) => AttributeValue::L(items.iter().map(marshall_value).collect()),
        Value::Object(map) => AttributeValue::M(
            map.iter()
                .map(|(k, v)| (k.clone(), marshall_value(v)))
                .collect::<BTreeMap<_, _>>(),
        ),
    }
}

/// Decode a wire record into a native record
pub fn unmarshall(wire: &WireRecord) -> CodecResult<Record> {
    let mut record = Record::new();
    for (name, attr) in wire {
        record.insert(name.clone(), decode_at(attr, name)?);
    }
    Ok(record)
}

/// Decode a single wire value
pub fn unmarshall_value(attr: &AttributeValue) -> CodecResult<Value> {
    decode_at(attr, "$")
}

fn decode_at(attr: &AttributeValue, path: &str) -> CodecResult<Value> {
    match attr {
        AttributeValue::S(s) => Ok(Value::String(s.clone())),
        AttributeValue::N(n) => parse_number(n)
            .map(Value::Number)
            .ok_or_else(|| CodecError::InvalidNumber {
                path: path.to_string(),
                value: n.clone(),
            }),
        AttributeValue::Bool(b) => Ok(Value::Bool(*b)),
        AttributeValue::Null(true) => Ok(Value::Null),
        AttributeValue::Null(false) => Err(CodecError::MalformedNull {
            path: path.to_string(),
        }),
        AttributeValue::L(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| decode_at(item, &format!("{}[{}]", path, i)))
            .collect::<CodecResult<Vec<_>>>()
            .map(Value::Array),
        AttributeValue::M(map) => {
            let mut out = Map::new();
            for (k, v) in map {
                out.insert(k.clone(), decode_at(v, &format!("{}.{}", path, k))?);
            }
            Ok(Value::Object(out))
        }
    }
}

fn parse_number(s: &str) -> Option<Number> {
    if let Ok(i) = s.parse::<i64>() {
        return Some(Number::from(i));
    }
    if let Ok(u) = s.parse::<u64>() {
        return Some(Number::from(u));
    }
    s.parse::<f64>().ok().and_then(Number::from_f64)
}
