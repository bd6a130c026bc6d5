//! In-memory store
//!
//! Holds every table behind one lock so a guard and its write are
//! evaluated atomically.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use crate::codec::{AttributeValue, WireRecord};
use crate::expression::{UpdateInstruction, ID_FIELD, SET_DIRECTIVE};

use super::errors::{StoreError, StoreResult};
use super::types::{
    Condition, DeleteRequest, PutRequest, QueryOutput, QueryRequest, TransactUpdateRequest,
    WriteAck,
};
use super::{StoreFuture, TableStore};

type Table = BTreeMap<String, WireRecord>;

/// Capacity units charged per single-item write
const WRITE_CAPACITY_UNITS: f64 = 1.0;
/// Transactional writes are charged double
const TRANSACT_CAPACITY_UNITS: f64 = 2.0;

/// Store that keeps tables in process memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<HashMap<String, Table>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with the given (empty) tables
    pub fn with_tables<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tables = names
            .into_iter()
            .map(|name| (name.into(), Table::new()))
            .collect();
        Self {
            tables: RwLock::new(tables),
        }
    }

    /// Number of items in `table`, `None` if the table does not exist
    pub fn item_count(&self, table: &str) -> Option<usize> {
        self.tables.read().ok()?.get(table).map(|t| t.len())
    }

    /// Raw wire item, bypassing the protocol
    pub fn raw_item(&self, table: &str, key: &str) -> Option<WireRecord> {
        self.tables.read().ok()?.get(table)?.get(key).cloned()
    }

    fn read_lock(
        &self,
    ) -> StoreResult<std::sync::RwLockReadGuard<'_, HashMap<String, Table>>> {
        self.tables
            .read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    fn write_lock(
        &self,
    ) -> StoreResult<std::sync::RwLockWriteGuard<'_, HashMap<String, Table>>> {
        self.tables
            .write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    fn run_query(&self, request: &QueryRequest) -> StoreResult<QueryOutput> {
        if request.limit == 0 {
            return Err(StoreError::Validation("Limit must be greater than 0".into()));
        }

        let tables = self.read_lock()?;
        let table = tables
            .get(&request.table_name)
            .ok_or_else(|| StoreError::TableNotFound(request.table_name.clone()))?;

        let items: Vec<WireRecord> = table
            .get(&request.key)
            .into_iter()
            .take(request.limit)
            .map(|item| project(item, request.projection.as_deref()))
            .collect();

        Ok(QueryOutput {
            count: items.len(),
            items,
        })
    }

    fn run_put(&self, request: PutRequest) -> StoreResult<WriteAck> {
        let key = match request.item.get(ID_FIELD) {
            Some(AttributeValue::S(id)) if !id.is_empty() => id.clone(),
            _ => {
                return Err(StoreError::Validation(
                    "Item is missing a string primary key".into(),
                ))
            }
        };

        let mut tables = self.write_lock()?;
        let table = tables
            .get_mut(&request.table_name)
            .ok_or_else(|| StoreError::TableNotFound(request.table_name.clone()))?;

        check(request.condition.as_ref(), table.get(&key), false)?;
        table.insert(key, request.item);

        Ok(WriteAck::with_capacity(
            request.table_name,
            WRITE_CAPACITY_UNITS,
        ))
    }

    fn run_update(&self, request: TransactUpdateRequest) -> StoreResult<WriteAck> {
        let assignments = resolve_assignments(&request.update)?;

        let mut tables = self.write_lock()?;
        let table = tables
            .get_mut(&request.table_name)
            .ok_or_else(|| StoreError::TableNotFound(request.table_name.clone()))?;

        check(
            request.condition.as_ref(),
            table.get(&request.key),
            request.return_old_on_failure,
        )?;

        let item = table.entry(request.key.clone()).or_insert_with(|| {
            let mut fresh = WireRecord::new();
            fresh.insert(ID_FIELD.to_string(), AttributeValue::S(request.key.clone()));
            fresh
        });
        for (field, value) in assignments {
            item.insert(field, value);
        }

        Ok(WriteAck::with_capacity(
            request.table_name,
            TRANSACT_CAPACITY_UNITS,
        ))
    }

    fn run_delete(&self, request: DeleteRequest) -> StoreResult<WriteAck> {
        let mut tables = self.write_lock()?;
        let table = tables
            .get_mut(&request.table_name)
            .ok_or_else(|| StoreError::TableNotFound(request.table_name.clone()))?;

        check(request.condition.as_ref(), table.get(&request.key), false)?;
        table.remove(&request.key);

        Ok(WriteAck::with_capacity(
            request.table_name,
            WRITE_CAPACITY_UNITS,
        ))
    }
}

impl TableStore for InMemoryStore {
    fn query(&self, request: QueryRequest) -> StoreFuture<'_, QueryOutput> {
        let result = self.run_query(&request);
        Box::pin(async move { result })
    }

    fn put_item(&self, request: PutRequest) -> StoreFuture<'_, WriteAck> {
        let result = self.run_put(request);
        Box::pin(async move { result })
    }

    fn transact_update(&self, request: TransactUpdateRequest) -> StoreFuture<'_, WriteAck> {
        let result = self.run_update(request);
        Box::pin(async move { result })
    }

    fn delete_item(&self, request: DeleteRequest) -> StoreFuture<'_, WriteAck> {
        let result = self.run_delete(request);
        Box::pin(async move { result })
    }
}

fn check(
    condition: Option<&Condition>,
    current: Option<&WireRecord>,
    return_old: bool,
) -> StoreResult<()> {
    match condition {
        Some(condition) if !condition.holds(current) => Err(StoreError::ConditionalCheckFailed {
            condition: condition.expression(),
            old_item: if return_old { current.cloned() } else { None },
        }),
        _ => Ok(()),
    }
}

fn project(item: &WireRecord, projection: Option<&[String]>) -> WireRecord {
    match projection {
        None | Some([]) => item.clone(),
        Some(names) => item
            .iter()
            .filter(|(k, _)| names.iter().any(|n| n == *k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    }
}

/// Resolve `SET #name = :value, ...` against the instruction's alias maps
fn resolve_assignments(update: &UpdateInstruction) -> StoreResult<Vec<(String, AttributeValue)>> {
    let body = update
        .update_expression
        .strip_prefix(SET_DIRECTIVE)
        .ok_or_else(|| {
            StoreError::Validation(format!(
                "Unsupported update expression: {}",
                update.update_expression
            ))
        })?
        .trim();

    let mut assignments = Vec::new();
    for clause in body.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        let (name_alias, value_alias) = clause
            .split_once('=')
            .map(|(n, v)| (n.trim(), v.trim()))
            .ok_or_else(|| StoreError::Validation(format!("Malformed clause: {}", clause)))?;

        let field = update.attribute_names.get(name_alias).ok_or_else(|| {
            StoreError::Validation(format!("Undefined attribute name alias: {}", name_alias))
        })?;
        let value = update.attribute_values.get(value_alias).ok_or_else(|| {
            StoreError::Validation(format!("Undefined attribute value alias: {}", value_alias))
        })?;

        if field == ID_FIELD {
            return Err(StoreError::Validation(
                "Cannot update attribute id. This attribute is part of the key".into(),
            ));
        }
        assignments.push((field.clone(), value.clone()));
    }
    Ok(assignments)
}
