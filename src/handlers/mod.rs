//! # Record Handlers
//!
//! Request handlers over one shared [`Table`]. Each receives the merged
//! payload from the pipeline and returns a `{statusCode, result}` value.
//! Expected failures (validation, not found, conflict) are returned as
//! error-shaped results; store and decode failures are raised and left
//! to the pipeline's error stages.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};

use crate::codec::Record;
use crate::middleware::{HandlerResponse, Pipeline, PipelineError, PipelineResult, RequestContext};
use crate::observability::Logger;
use crate::table::{
    AccessError, AccessResult, FetchManyRequest, Fetched, Table, UpdateOutcome,
    NOT_FOUND_MESSAGE,
};

/// Message returned when an update guard rejects the write
pub const UPDATE_REJECTED_MESSAGE: &str = "Record changed before the update was applied";

/// The record operations exposed as handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    Get,
    GetMany,
    Insert,
    Update,
    Delete,
}

impl HandlerKind {
    pub const ALL: [HandlerKind; 5] = [
        HandlerKind::Get,
        HandlerKind::GetMany,
        HandlerKind::Insert,
        HandlerKind::Update,
        HandlerKind::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HandlerKind::Get => "get",
            HandlerKind::GetMany => "get-many",
            HandlerKind::Insert => "insert",
            HandlerKind::Update => "update",
            HandlerKind::Delete => "delete",
        }
    }

    /// Wrap this handler in the standard middleware stack
    pub fn pipeline(&self, table: Arc<Table>) -> Pipeline {
        let name = self.as_str();
        match self {
            HandlerKind::Get => Pipeline::standard(name, move |payload: Record, ctx: RequestContext| {
                get_record(table.clone(), payload, ctx)
            }),
            HandlerKind::GetMany => {
                Pipeline::standard(name, move |payload: Record, ctx: RequestContext| {
                    get_records(table.clone(), payload, ctx)
                })
            }
            HandlerKind::Insert => {
                Pipeline::standard(name, move |payload: Record, ctx: RequestContext| {
                    insert_record(table.clone(), payload, ctx)
                })
            }
            HandlerKind::Update => {
                Pipeline::standard(name, move |payload: Record, ctx: RequestContext| {
                    update_record(table.clone(), payload, ctx)
                })
            }
            HandlerKind::Delete => {
                Pipeline::standard(name, move |payload: Record, ctx: RequestContext| {
                    delete_record(table.clone(), payload, ctx)
                })
            }
        }
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HandlerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HandlerKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = HandlerKind::ALL.iter().map(|k| k.as_str()).collect();
                format!("unknown handler '{}', expected one of: {}", s, known.join(", "))
            })
    }
}

/// `{id, columns?}` → the record, or 404 when absent
pub async fn get_record(
    table: Arc<Table>,
    payload: Record,
    _ctx: RequestContext,
) -> PipelineResult<HandlerResponse> {
    let id = match required_id(&payload) {
        Ok(id) => id,
        Err(e) => return Ok(HandlerResponse::from_error(&e)),
    };
    let columns = match columns(&payload) {
        Ok(columns) => columns,
        Err(e) => return Ok(HandlerResponse::from_error(&e)),
    };

    respond(table.fetch_one(&id, columns.as_deref()).await, |fetched| match fetched {
        Fetched::Found(record) => Ok(HandlerResponse::ok(Value::Object(record))),
        Fetched::NotFound => Ok(HandlerResponse::new(
            404,
            json!({ "message": NOT_FOUND_MESSAGE }),
        )),
    })
}

/// `{ids?, fields?}` → id to record or placeholder
pub async fn get_records(
    table: Arc<Table>,
    payload: Record,
    _ctx: RequestContext,
) -> PipelineResult<HandlerResponse> {
    let request = match FetchManyRequest::from_payload(&payload) {
        Ok(request) => request,
        Err(e) => {
            Logger::warn(
                "RECORD_FETCH_MANY_INVALID",
                &[("table", table.name()), ("error", &e.to_string())],
            );
            return Ok(HandlerResponse::from_error(&e));
        }
    };

    let results = table.fetch_many(&request.ids, &request.fields).await;
    Ok(HandlerResponse::ok(to_json(&results)?))
}

/// The record to create → store acknowledgment
pub async fn insert_record(
    table: Arc<Table>,
    payload: Record,
    _ctx: RequestContext,
) -> PipelineResult<HandlerResponse> {
    respond(table.insert(payload).await, |ack| {
        Ok(HandlerResponse::ok(to_json(&ack)?))
    })
}

/// The fields to change, keyed by `id` → store acknowledgment
pub async fn update_record(
    table: Arc<Table>,
    payload: Record,
    _ctx: RequestContext,
) -> PipelineResult<HandlerResponse> {
    respond(table.update(payload).await, |outcome| match outcome {
        UpdateOutcome::Updated(ack) => Ok(HandlerResponse::ok(to_json(&ack)?)),
        UpdateOutcome::Unchanged => Ok(HandlerResponse::ok(json!({}))),
        UpdateOutcome::Rejected { previous } => Ok(HandlerResponse::new(
            409,
            json!({
                "message": UPDATE_REJECTED_MESSAGE,
                "previous": previous,
            }),
        )),
    })
}

/// `{id}` → store acknowledgment
pub async fn delete_record(
    table: Arc<Table>,
    payload: Record,
    _ctx: RequestContext,
) -> PipelineResult<HandlerResponse> {
    let id = match required_id(&payload) {
        Ok(id) => id,
        Err(e) => return Ok(HandlerResponse::from_error(&e)),
    };

    respond(table.delete(&id).await, |ack| {
        Ok(HandlerResponse::ok(to_json(&ack)?))
    })
}

fn respond<T>(
    result: AccessResult<T>,
    on_success: impl FnOnce(T) -> PipelineResult<HandlerResponse>,
) -> PipelineResult<HandlerResponse> {
    match result {
        Ok(value) => on_success(value),
        Err(e) if e.is_expected() => Ok(HandlerResponse::from_error(&e)),
        Err(e) => Err(PipelineError::Access(e)),
    }
}

fn required_id(payload: &Record) -> AccessResult<String> {
    match payload.get("id") {
        Some(Value::String(id)) if !id.is_empty() => Ok(id.clone()),
        _ => Err(AccessError::Validation("id must be a non-empty string".into())),
    }
}

/// `columns` may be an array of names or a comma-separated string
fn columns(payload: &Record) -> AccessResult<Option<Vec<String>>> {
    match payload.get("columns") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(list)) => Ok(Some(
            list.split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect(),
        )),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_str().map(str::to_string).ok_or_else(|| {
                    AccessError::Validation("Every column must be a string".into())
                })
            })
            .collect::<AccessResult<Vec<_>>>()
            .map(Some),
        Some(_) => Err(AccessError::Validation(
            "columns must be an array or a comma-separated string".into(),
        )),
    }
}

fn to_json<T: Serialize>(value: &T) -> PipelineResult<Value> {
    serde_json::to_value(value).map_err(|e| PipelineError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::TransportRequest;
    use crate::store::InMemoryStore;

    fn table() -> Arc<Table> {
        let store = Arc::new(InMemoryStore::with_tables(["actors"]));
        Arc::new(Table::new("actors", store).unwrap())
    }

    #[test]
    fn test_handler_kind_parse() {
        assert_eq!("get-many".parse::<HandlerKind>().unwrap(), HandlerKind::GetMany);
        let err = "list".parse::<HandlerKind>().unwrap_err();
        assert!(err.contains("get, get-many, insert, update, delete"));
    }

    #[test]
    fn test_columns_forms() {
        let payload = json!({"columns": "name, age"});
        assert_eq!(
            columns(payload.as_object().unwrap()).unwrap(),
            Some(vec!["name".to_string(), "age".to_string()])
        );

        let payload = json!({"columns": ["name"]});
        assert_eq!(
            columns(payload.as_object().unwrap()).unwrap(),
            Some(vec!["name".to_string()])
        );

        let payload = json!({"columns": 3});
        assert!(columns(payload.as_object().unwrap()).is_err());
    }

    #[tokio::test]
    async fn test_insert_then_get_through_pipelines() {
        let table = table();
        let insert = HandlerKind::Insert.pipeline(table.clone());
        let get = HandlerKind::Get.pipeline(table);

        let response = insert
            .invoke(TransportRequest::with_body(json!({"id": "u1", "name": "Ann"})))
            .await
            .unwrap();
        assert_eq!(response.status_code, 200);

        let response = get
            .invoke(TransportRequest::default().query("id", "u1"))
            .await
            .unwrap();
        let body = response.body_json().unwrap();
        assert_eq!(response.status_code, 200);
        assert_eq!(body["name"], "Ann");
        assert!(body["created_at"].is_i64());
    }

    #[tokio::test]
    async fn test_get_missing_record() {
        let get = HandlerKind::Get.pipeline(table());
        let response = get
            .invoke(TransportRequest::with_body(json!({"id": "ghost"})))
            .await
            .unwrap();

        assert_eq!(response.status_code, 404);
        assert_eq!(response.body_json().unwrap()["message"], NOT_FOUND_MESSAGE);
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_conflict() {
        let insert = HandlerKind::Insert.pipeline(table());
        let request = TransportRequest::with_body(json!({"id": "u1"}));

        insert.invoke(request.clone()).await.unwrap();
        let response = insert.invoke(request).await.unwrap();

        assert_eq!(response.status_code, 409);
        assert_eq!(response.body_json().unwrap()["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_delete_requires_id() {
        let delete = HandlerKind::Delete.pipeline(table());
        let response = delete.invoke(TransportRequest::default()).await.unwrap();
        assert_eq!(response.status_code, 400);
    }

    #[tokio::test]
    async fn test_get_many_rejects_non_array_ids() {
        let get_many = HandlerKind::GetMany.pipeline(table());
        let response = get_many
            .invoke(TransportRequest::default().query("ids", "a,b"))
            .await
            .unwrap();

        assert_eq!(response.status_code, 400);
    }

    #[tokio::test]
    async fn test_get_many_without_ids_is_empty() {
        let get_many = HandlerKind::GetMany.pipeline(table());

        for body in [json!({}), json!({"fields": ["name"]})] {
            let response = get_many
                .invoke(TransportRequest::with_body(body))
                .await
                .unwrap();
            assert_eq!(response.status_code, 200);
            assert_eq!(response.body_json().unwrap(), json!({}));
        }
    }
}
