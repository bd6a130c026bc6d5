//! # Table Accessor
//!
//! Binds one table name to a shared store connection and exposes the
//! record operations: fetch one, fetch many, insert, update, delete.
//!
//! ## Consistency
//!
//! Insert, update and delete rely on existence guards the store checks
//! atomically with the write. Update is read-modify-write: it fetches
//! the stored record, merges bookkeeping fields, then writes guarded by
//! "record exists". Two concurrent updates of the same id can both pass
//! the guard and the later write wins; the guard only prevents writing
//! into a deleted record. No version token is used.

mod batch;
mod errors;

pub use batch::{dedup, FetchEntry, FetchManyRequest, NOT_FOUND_MESSAGE};
pub use errors::{AccessError, AccessResult};

use std::collections::BTreeMap;
use std::sync::Arc;

use futures_util::future::join_all;
use regex::Regex;
use serde_json::Value;

use crate::codec::{marshall, unmarshall, Record};
use crate::expression::{RecordPatch, UpdateInstruction, CREATED_AT, CREATED_BY, ID_FIELD};
use crate::observability::Logger;
use crate::store::{
    Condition, DeleteRequest, PutRequest, QueryRequest, StoreError, TableStore,
    TransactUpdateRequest, WriteAck,
};

/// Allowed table names
const TABLE_NAME_PATTERN: &str = r"^[A-Za-z0-9_.\-]{3,255}$";

/// Result of a single-record lookup
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    Found(Record),
    /// Zero rows matched; not an error
    NotFound,
}

impl Fetched {
    pub fn is_found(&self) -> bool {
        matches!(self, Fetched::Found(_))
    }

    pub fn into_record(self) -> Option<Record> {
        match self {
            Fetched::Found(record) => Some(record),
            Fetched::NotFound => None,
        }
    }
}

/// Result of an update
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// Write applied
    Updated(WriteAck),
    /// The patch named no field to change; the store was not written
    Unchanged,
    /// The existence guard failed while the store still held a record;
    /// `previous` is that record as it was
    Rejected { previous: Record },
}

/// Access to one table
#[derive(Clone)]
pub struct Table {
    name: String,
    store: Arc<dyn TableStore>,
    clock: fn() -> i64,
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table").field("name", &self.name).finish()
    }
}

impl Table {
    /// Bind `name` to a shared store connection
    pub fn new(name: impl Into<String>, store: Arc<dyn TableStore>) -> AccessResult<Self> {
        let name = name.into();
        let pattern = Regex::new(TABLE_NAME_PATTERN)
            .map_err(|e| AccessError::InvalidTableName(e.to_string()))?;
        if !pattern.is_match(&name) {
            return Err(AccessError::InvalidTableName(name));
        }

        Ok(Self {
            name,
            store,
            clock: now_millis,
        })
    }

    /// Replace the millisecond clock used for bookkeeping timestamps
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fetch one record by id, optionally restricted to `columns`
    pub async fn fetch_one(&self, id: &str, columns: Option<&[String]>) -> AccessResult<Fetched> {
        require_id(id)?;
        Logger::debug("RECORD_FETCH", &[("table", &self.name), ("id", id)]);

        let output = self
            .store
            .query(QueryRequest {
                table_name: self.name.clone(),
                key: id.to_string(),
                limit: 1,
                projection: columns.filter(|c| !c.is_empty()).map(|c| c.to_vec()),
            })
            .await
            .inspect_err(|e| {
                Logger::error(
                    "RECORD_FETCH_FAILED",
                    &[("table", &self.name), ("id", id), ("error", &e.to_string())],
                )
            })?;

        match output.items.into_iter().next() {
            Some(item) if output.count > 0 => Ok(Fetched::Found(unmarshall(&item)?)),
            _ => {
                Logger::debug("RECORD_NOT_FOUND", &[("table", &self.name), ("id", id)]);
                Ok(Fetched::NotFound)
            }
        }
    }

    /// Fetch every id concurrently. One id's failure never aborts the
    /// others: it is reported in place of that id's record.
    pub async fn fetch_many(
        &self,
        ids: &[String],
        fields: &[String],
    ) -> BTreeMap<String, FetchEntry> {
        let ids = dedup(ids);
        let fields = dedup(fields);
        let projection = if fields.is_empty() {
            None
        } else {
            Some(fields.as_slice())
        };

        let lookups = ids.iter().map(|id| async move {
            let entry = match self.fetch_one(id, projection).await {
                Ok(Fetched::Found(record)) => FetchEntry::Found(record),
                Ok(Fetched::NotFound) => FetchEntry::missing(),
                Err(e) => FetchEntry::failed(&e),
            };
            (id.clone(), entry)
        });

        join_all(lookups).await.into_iter().collect()
    }

    /// Insert a new record. Fails with `Conflict` if the id exists.
    pub async fn insert(&self, record: Record) -> AccessResult<WriteAck> {
        let mut patch = RecordPatch::from_record(&record)?;
        let now = (self.clock)();
        if patch.created_at().is_none() {
            patch.set_created_at(Some(now));
        }
        if patch.updated_at().is_none() {
            patch.set_updated_at(Some(now));
        }

        let id = patch.id().to_string();
        let request = PutRequest {
            table_name: self.name.clone(),
            item: marshall(&patch.into_record()),
            condition: Some(Condition::AttributeNotExists(ID_FIELD.to_string())),
        };

        match self.store.put_item(request).await {
            Ok(ack) => {
                Logger::info("RECORD_INSERT", &[("table", &self.name), ("id", &id)]);
                Ok(ack)
            }
            Err(e) if e.is_condition_failure() => {
                Logger::warn("RECORD_INSERT_CONFLICT", &[("table", &self.name), ("id", &id)]);
                Err(AccessError::Conflict(id))
            }
            Err(e) => {
                Logger::error(
                    "RECORD_INSERT_FAILED",
                    &[("table", &self.name), ("id", &id), ("error", &e.to_string())],
                );
                Err(e.into())
            }
        }
    }

    /// Update an existing record with the fields present in `record`.
    ///
    /// `created_by` always comes from the stored record; `created_at` is
    /// kept unless the caller supplies one; `updated_at` is stamped now
    /// unless the caller supplies one.
    pub async fn update(&self, record: Record) -> AccessResult<UpdateOutcome> {
        let mut patch = RecordPatch::from_record(&record)?;
        let id = patch.id().to_string();

        let existing = match self.fetch_one(&id, None).await? {
            Fetched::Found(existing) => existing,
            Fetched::NotFound => {
                Logger::warn("RECORD_UPDATE_NOT_FOUND", &[("table", &self.name), ("id", &id)]);
                return Err(AccessError::NotFound(id));
            }
        };

        if patch.fields().is_empty() && patch.created_at().is_none() && patch.updated_at().is_none()
        {
            Logger::debug("RECORD_UPDATE_UNCHANGED", &[("table", &self.name), ("id", &id)]);
            return Ok(UpdateOutcome::Unchanged);
        }

        let now = (self.clock)();
        patch.set_created_by(existing.get(CREATED_BY).filter(|v| !v.is_null()).cloned());
        if patch.created_at().is_none() {
            let stored = existing.get(CREATED_AT).and_then(Value::as_i64);
            patch.set_created_at(Some(stored.unwrap_or(now)));
        }
        if patch.updated_at().is_none() {
            patch.set_updated_at(Some(now));
        }

        let request = TransactUpdateRequest {
            table_name: self.name.clone(),
            key: id.clone(),
            update: UpdateInstruction::from_patch(&patch),
            condition: Some(Condition::AttributeExists(ID_FIELD.to_string())),
            return_old_on_failure: true,
        };

        match self.store.transact_update(request).await {
            Ok(ack) => {
                Logger::info("RECORD_UPDATE", &[("table", &self.name), ("id", &id)]);
                Ok(UpdateOutcome::Updated(ack))
            }
            Err(StoreError::ConditionalCheckFailed {
                old_item: Some(old),
                ..
            }) => {
                Logger::warn("RECORD_UPDATE_REJECTED", &[("table", &self.name), ("id", &id)]);
                Ok(UpdateOutcome::Rejected {
                    previous: unmarshall(&old)?,
                })
            }
            Err(StoreError::ConditionalCheckFailed { old_item: None, .. }) => {
                Logger::warn("RECORD_UPDATE_NOT_FOUND", &[("table", &self.name), ("id", &id)]);
                Err(AccessError::NotFound(id))
            }
            Err(e) => {
                Logger::error(
                    "RECORD_UPDATE_FAILED",
                    &[("table", &self.name), ("id", &id), ("error", &e.to_string())],
                );
                Err(e.into())
            }
        }
    }

    /// Delete a record. Fails with `NotFound` if the id does not exist.
    pub async fn delete(&self, id: &str) -> AccessResult<WriteAck> {
        require_id(id)?;

        let request = DeleteRequest {
            table_name: self.name.clone(),
            key: id.to_string(),
            condition: Some(Condition::AttributeExists(ID_FIELD.to_string())),
        };

        match self.store.delete_item(request).await {
            Ok(ack) => {
                Logger::info("RECORD_DELETE", &[("table", &self.name), ("id", id)]);
                Ok(ack)
            }
            Err(e) if e.is_condition_failure() => {
                Logger::warn("RECORD_DELETE_NOT_FOUND", &[("table", &self.name), ("id", id)]);
                Err(AccessError::NotFound(id.to_string()))
            }
            Err(e) => {
                Logger::error(
                    "RECORD_DELETE_FAILED",
                    &[("table", &self.name), ("id", id), ("error", &e.to_string())],
                );
                Err(e.into())
            }
        }
    }
}

fn require_id(id: &str) -> AccessResult<()> {
    if id.is_empty() {
        return Err(AccessError::Validation("id must be a non-empty string".into()));
    }
    Ok(())
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
