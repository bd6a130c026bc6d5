//! Tagged attribute values
//!
//! The store keeps every attribute as a single-key object naming its
//! type: `{"S": "text"}`, `{"N": "42"}`, `{"BOOL": true}`,
//! `{"NULL": true}`, `{"L": [..]}`, `{"M": {..}}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A record in the store's wire representation
pub type WireRecord = BTreeMap<String, AttributeValue>;

/// One attribute in the store's wire representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// String
    #[serde(rename = "S")]
    S(String),
    /// Number, carried as its decimal string
    #[serde(rename = "N")]
    N(String),
    /// Boolean
    #[serde(rename = "BOOL")]
    Bool(bool),
    /// Null; only `true` is well-formed
    #[serde(rename = "NULL")]
    Null(bool),
    /// List of attribute values
    #[serde(rename = "L")]
    L(Vec<AttributeValue>),
    /// Nested map
    #[serde(rename = "M")]
    M(BTreeMap<String, AttributeValue>),
}

impl AttributeValue {
    /// Short type tag, as it appears on the wire
    pub fn type_tag(&self) -> &'static str {
        match self {
            AttributeValue::S(_) => "S",
            AttributeValue::N(_) => "N",
            AttributeValue::Bool(_) => "BOOL",
            AttributeValue::Null(_) => "NULL",
            AttributeValue::L(_) => "L",
            AttributeValue::M(_) => "M",
        }
    }

    /// Convenience constructor for the well-formed null
    pub fn null() -> Self {
        AttributeValue::Null(true)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::S(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::S(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(n: i64) -> Self {
        AttributeValue::N(n.to_string())
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_json_shape() {
        let json = serde_json::to_string(&AttributeValue::from("Ann")).unwrap();
        assert_eq!(json, r#"{"S":"Ann"}"#);

        let json = serde_json::to_string(&AttributeValue::from(42)).unwrap();
        assert_eq!(json, r#"{"N":"42"}"#);

        let json = serde_json::to_string(&AttributeValue::null()).unwrap();
        assert_eq!(json, r#"{"NULL":true}"#);
    }

    #[test]
    fn test_parse_nested_wire_value() {
        let json = r#"{"M": {"tags": {"L": [{"S": "a"}, {"BOOL": false}]}}}"#;
        let value: AttributeValue = serde_json::from_str(json).unwrap();

        match value {
            AttributeValue::M(map) => {
                assert_eq!(map["tags"].type_tag(), "L");
            }
            other => panic!("Expected map, got {:?}", other),
        }
    }
}
