//! Store request and response shapes

use serde::{Deserialize, Serialize};

use crate::codec::WireRecord;
use crate::expression::UpdateInstruction;

/// Existence guard evaluated atomically with a write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    AttributeExists(String),
    AttributeNotExists(String),
}

impl Condition {
    /// Condition expression in the store's query language
    pub fn expression(&self) -> String {
        match self {
            Condition::AttributeExists(name) => format!("attribute_exists({})", name),
            Condition::AttributeNotExists(name) => format!("attribute_not_exists({})", name),
        }
    }

    /// Evaluate against the current item, if any
    pub fn holds(&self, item: Option<&WireRecord>) -> bool {
        match self {
            Condition::AttributeExists(name) => item.is_some_and(|i| i.contains_key(name)),
            Condition::AttributeNotExists(name) => !item.is_some_and(|i| i.contains_key(name)),
        }
    }
}

/// Point lookup by primary key
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub table_name: String,
    pub key: String,
    pub limit: usize,
    /// Attribute names to return; `None` returns every attribute
    pub projection: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryOutput {
    pub count: usize,
    pub items: Vec<WireRecord>,
}

/// Single-item conditional put
#[derive(Debug, Clone, PartialEq)]
pub struct PutRequest {
    pub table_name: String,
    pub item: WireRecord,
    pub condition: Option<Condition>,
}

/// Single-item conditional transactional update
#[derive(Debug, Clone, PartialEq)]
pub struct TransactUpdateRequest {
    pub table_name: String,
    pub key: String,
    pub update: UpdateInstruction,
    pub condition: Option<Condition>,
    /// Return the item as it was when the guard fails
    pub return_old_on_failure: bool,
}

/// Single-item conditional delete
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteRequest {
    pub table_name: String,
    pub key: String,
    pub condition: Option<Condition>,
}

/// Capacity consumed by a write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConsumedCapacity {
    pub table_name: String,
    pub capacity_units: f64,
}

/// Store acknowledgment of a write
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WriteAck {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumed_capacity: Option<ConsumedCapacity>,
}

impl WriteAck {
    pub fn with_capacity(table_name: impl Into<String>, capacity_units: f64) -> Self {
        Self {
            consumed_capacity: Some(ConsumedCapacity {
                table_name: table_name.into(),
                capacity_units,
            }),
        }
    }
}
