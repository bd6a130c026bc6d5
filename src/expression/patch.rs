//! Typed partial record
//!
//! A `RecordPatch` lists exactly the fields an update touches. The
//! primary key and the bookkeeping fields are held apart from ordinary
//! fields so they can only be written through their typed setters.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::codec::Record;

use super::errors::{ExpressionError, ExpressionResult};

/// Primary key field
pub const ID_FIELD: &str = "id";
/// Creation timestamp (milliseconds since epoch)
pub const CREATED_AT: &str = "created_at";
/// Last modification timestamp (milliseconds since epoch)
pub const UPDATED_AT: &str = "updated_at";
/// Creator of the record
pub const CREATED_BY: &str = "created_by";

/// Fields that only the accessor's bookkeeping may write
pub const RESERVED_FIELDS: [&str; 4] = [ID_FIELD, CREATED_AT, UPDATED_AT, CREATED_BY];

/// A partial record keyed by `id`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordPatch {
    id: String,
    fields: BTreeMap<String, Value>,
    created_at: Option<i64>,
    updated_at: Option<i64>,
    created_by: Option<Value>,
}

impl RecordPatch {
    /// Create an empty patch for `id`
    pub fn new(id: impl Into<String>) -> ExpressionResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(ExpressionError::InvalidId("id must be a non-empty string".into()));
        }
        Ok(Self {
            id,
            ..Default::default()
        })
    }

    /// Split a caller-supplied record into a patch.
    ///
    /// A `null` timestamp or creator counts as unset.
    pub fn from_record(record: &Record) -> ExpressionResult<Self> {
        let id = match record.get(ID_FIELD) {
            None | Some(Value::Null) => return Err(ExpressionError::MissingId),
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                return Err(ExpressionError::InvalidId(format!(
                    "id must be a string, got {}",
                    other
                )))
            }
        };

        let mut patch = Self::new(id)?;
        for (name, value) in record {
            match name.as_str() {
                ID_FIELD => {}
                CREATED_AT => patch.created_at = timestamp(CREATED_AT, value)?,
                UPDATED_AT => patch.updated_at = timestamp(UPDATED_AT, value)?,
                CREATED_BY => {
                    patch.created_by = if value.is_null() { None } else { Some(value.clone()) }
                }
                _ => patch.set(name.clone(), value.clone())?,
            }
        }
        Ok(patch)
    }

    /// Set an ordinary field
    pub fn set(&mut self, field: impl Into<String>, value: Value) -> ExpressionResult<()> {
        let field = field.into();
        if RESERVED_FIELDS.contains(&field.as_str()) {
            return Err(ExpressionError::ReservedField(field));
        }
        if field.is_empty() {
            return Err(ExpressionError::EmptyFieldName);
        }
        self.fields.insert(field, value);
        Ok(())
    }

    /// Builder-style `set`
    pub fn with(mut self, field: impl Into<String>, value: Value) -> ExpressionResult<Self> {
        self.set(field, value)?;
        Ok(self)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub fn created_at(&self) -> Option<i64> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<i64> {
        self.updated_at
    }

    pub fn created_by(&self) -> Option<&Value> {
        self.created_by.as_ref()
    }

    pub fn set_created_at(&mut self, millis: Option<i64>) {
        self.created_at = millis;
    }

    pub fn set_updated_at(&mut self, millis: Option<i64>) {
        self.updated_at = millis;
    }

    pub fn set_created_by(&mut self, creator: Option<Value>) {
        self.created_by = creator;
    }

    /// Every (field, value) the patch writes, `id` excluded
    pub fn assignments(&self) -> Vec<(&str, Value)> {
        let mut out: Vec<(&str, Value)> = self
            .fields
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect();
        if let Some(ts) = self.created_at {
            out.push((CREATED_AT, Value::from(ts)));
        }
        if let Some(ts) = self.updated_at {
            out.push((UPDATED_AT, Value::from(ts)));
        }
        if let Some(creator) = &self.created_by {
            out.push((CREATED_BY, creator.clone()));
        }
        out
    }

    /// Full record form, `id` included
    pub fn into_record(self) -> Record {
        let mut record = Record::new();
        for (k, v) in self.assignments() {
            record.insert(k.to_string(), v);
        }
        record.insert(ID_FIELD.to_string(), Value::String(self.id));
        record
    }
}

fn timestamp(field: &str, value: &Value) -> ExpressionResult<Option<i64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| ExpressionError::InvalidTimestamp(field.to_string())),
        _ => Err(ExpressionError::InvalidTimestamp(field.to_string())),
    }
}
