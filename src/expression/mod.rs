//! # Update-Expression Builder
//!
//! Turns a partial record into the store's "set these fields" update
//! instruction: attribute-name aliases, attribute-value aliases and a
//! single composed `SET` directive. Aliases keep arbitrary field names
//! clear of the store's reserved words.
//!
//! Fields absent from the patch produce no clause and are left
//! untouched in the stored record.

mod errors;
mod patch;

pub use errors::{ExpressionError, ExpressionResult};
pub use patch::{RecordPatch, CREATED_AT, CREATED_BY, ID_FIELD, RESERVED_FIELDS, UPDATED_AT};

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::codec::{marshall_value, AttributeValue};

/// Directive keyword that prefixes every update expression
pub const SET_DIRECTIVE: &str = "SET";

/// Derived, transient update instruction. Built per update call, never stored.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct UpdateInstruction {
    #[serde(rename = "ExpressionAttributeNames")]
    pub attribute_names: BTreeMap<String, String>,
    #[serde(rename = "ExpressionAttributeValues")]
    pub attribute_values: BTreeMap<String, AttributeValue>,
    #[serde(rename = "UpdateExpression")]
    pub update_expression: String,
}

impl UpdateInstruction {
    /// Build the instruction for every assignment in `patch`
    pub fn from_patch(patch: &RecordPatch) -> Self {
        let mut builder = UpdateBuilder::new();
        for (field, value) in patch.assignments() {
            builder.set(field, &value);
        }
        builder.build()
    }

    /// True when no field qualified; the directive then has an empty clause list
    pub fn is_noop(&self) -> bool {
        self.attribute_names.is_empty()
    }

    /// Number of `alias = alias` clauses
    pub fn clause_count(&self) -> usize {
        self.attribute_names.len()
    }
}

/// Incremental builder for an [`UpdateInstruction`]
#[derive(Debug, Default)]
pub struct UpdateBuilder {
    names: BTreeMap<String, String>,
    values: BTreeMap<String, AttributeValue>,
    clauses: Vec<String>,
    aliases: BTreeMap<String, usize>,
}

impl UpdateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `value` to `field`. The primary key is skipped; setting the
    /// same field twice keeps the last value.
    pub fn set(&mut self, field: &str, value: &Value) -> &mut Self {
        if field == ID_FIELD {
            return self;
        }

        let index = match self.aliases.get(field) {
            Some(index) => *index,
            None => {
                let index = self.clauses.len();
                let (name_alias, value_alias) = aliases(index);
                self.names.insert(name_alias.clone(), field.to_string());
                self.clauses.push(format!("{} = {}", name_alias, value_alias));
                self.aliases.insert(field.to_string(), index);
                index
            }
        };

        let (_, value_alias) = aliases(index);
        self.values.insert(value_alias, marshall_value(value));
        self
    }

    pub fn build(self) -> UpdateInstruction {
        UpdateInstruction {
            attribute_names: self.names,
            attribute_values: self.values,
            update_expression: format!("{} {}", SET_DIRECTIVE, self.clauses.join(", ")),
        }
    }
}

fn aliases(index: usize) -> (String, String) {
    (format!("#updateExp_{}", index), format!(":updateExp_{}", index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builds_aliased_set_clauses() {
        let patch = RecordPatch::new("u1")
            .unwrap()
            .with("name", json!("Bea"))
            .unwrap()
            .with("status", json!(3))
            .unwrap();

        let instruction = UpdateInstruction::from_patch(&patch);

        assert_eq!(
            instruction.update_expression,
            "SET #updateExp_0 = :updateExp_0, #updateExp_1 = :updateExp_1"
        );
        assert_eq!(instruction.attribute_names["#updateExp_0"], "name");
        assert_eq!(instruction.attribute_names["#updateExp_1"], "status");
        assert_eq!(
            instruction.attribute_values[":updateExp_1"],
            AttributeValue::N("3".into())
        );
    }

    #[test]
    fn test_id_never_in_instruction() {
        let mut builder = UpdateBuilder::new();
        builder.set("id", &json!("u2")).set("name", &json!("Ann"));
        let instruction = builder.build();

        assert_eq!(instruction.clause_count(), 1);
        assert!(!instruction.attribute_names.values().any(|f| f == "id"));
    }

    #[test]
    fn test_empty_patch_is_noop() {
        let patch = RecordPatch::new("u1").unwrap();
        let instruction = UpdateInstruction::from_patch(&patch);

        assert!(instruction.is_noop());
        assert_eq!(instruction.update_expression, "SET ");
    }

    #[test]
    fn test_repeated_field_keeps_last_value() {
        let mut builder = UpdateBuilder::new();
        builder.set("name", &json!("Ann")).set("name", &json!("Bea"));
        let instruction = builder.build();

        assert_eq!(instruction.clause_count(), 1);
        assert_eq!(
            instruction.attribute_values[":updateExp_0"],
            AttributeValue::S("Bea".into())
        );
    }

    #[test]
    fn test_bookkeeping_fields_are_written() {
        let mut patch = RecordPatch::new("u1").unwrap();
        patch.set_updated_at(Some(200));
        patch.set_created_by(Some(json!("admin")));

        let instruction = UpdateInstruction::from_patch(&patch);
        let fields: Vec<&String> = instruction.attribute_names.values().collect();

        assert!(fields.contains(&&"updated_at".to_string()));
        assert!(fields.contains(&&"created_by".to_string()));
    }

    #[test]
    fn test_serializes_with_store_keys() {
        let patch = RecordPatch::new("u1").unwrap().with("a", json!(true)).unwrap();
        let json = serde_json::to_value(UpdateInstruction::from_patch(&patch)).unwrap();

        assert_eq!(json["UpdateExpression"], "SET #updateExp_0 = :updateExp_0");
        assert_eq!(json["ExpressionAttributeValues"][":updateExp_0"], json!({"BOOL": true}));
    }
}
