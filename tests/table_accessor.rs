//! Table accessor behavior against the store protocol
//!
//! Covers:
//! - insert then fetch returns the record with bookkeeping timestamps
//! - duplicate insert conflicts and leaves the store as it was
//! - update of a missing id fails and writes nothing
//! - update preserves untouched fields and creation bookkeeping
//! - delete guard and removal
//! - multi-key fetch aggregates partial failures

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};

use tableaccess::codec::{marshall, Record};
use tableaccess::store::{
    DeleteRequest, InMemoryStore, PutRequest, QueryOutput, QueryRequest, StoreError, StoreFuture,
    TableStore, TransactUpdateRequest, WriteAck,
};
use tableaccess::table::{AccessError, FetchEntry, Fetched, Table, UpdateOutcome};

static TICKS: AtomicI64 = AtomicI64::new(1_700_000_000_000);

/// Advances one second per reading
fn ticking_clock() -> i64 {
    TICKS.fetch_add(1_000, Ordering::SeqCst)
}

fn record(value: Value) -> Record {
    value.as_object().cloned().unwrap()
}

fn setup() -> (Table, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::with_tables(["workflow-actors"]));
    let table = Table::new("workflow-actors", store.clone())
        .unwrap()
        .with_clock(ticking_clock);
    (table, store)
}

async fn fetch(table: &Table, id: &str) -> Record {
    table
        .fetch_one(id, None)
        .await
        .unwrap()
        .into_record()
        .expect("record should exist")
}

#[tokio::test]
async fn test_insert_then_fetch() {
    let (table, _) = setup();
    table
        .insert(record(json!({"id": "u1", "name": "Ann", "tags": ["a", "b"], "active": true})))
        .await
        .unwrap();

    let fetched = fetch(&table, "u1").await;
    let created_at = fetched["created_at"].as_i64().unwrap();

    assert_eq!(fetched["name"], "Ann");
    assert_eq!(fetched["tags"], json!(["a", "b"]));
    assert_eq!(fetched["active"], json!(true));
    assert_eq!(fetched["updated_at"].as_i64(), Some(created_at));
}

#[tokio::test]
async fn test_duplicate_insert_conflicts() {
    let (table, store) = setup();
    table.insert(record(json!({"id": "u1", "name": "Ann"}))).await.unwrap();
    let before = store.raw_item("workflow-actors", "u1");

    let err = table
        .insert(record(json!({"id": "u1", "name": "Other"})))
        .await
        .unwrap_err();

    assert!(matches!(err, AccessError::Conflict(ref id) if id == "u1"));
    assert_eq!(err.status_code(), 409);
    assert_eq!(store.raw_item("workflow-actors", "u1"), before);
    assert_eq!(store.item_count("workflow-actors"), Some(1));
}

#[tokio::test]
async fn test_update_missing_record_writes_nothing() {
    let (table, store) = setup();
    let err = table
        .update(record(json!({"id": "ghost", "name": "x"})))
        .await
        .unwrap_err();

    assert!(matches!(err, AccessError::NotFound(_)));
    assert_eq!(store.item_count("workflow-actors"), Some(0));
}

#[tokio::test]
async fn test_update_preserves_untouched_fields() {
    let (table, _) = setup();
    table
        .insert(record(json!({
            "id": "u1",
            "name": "Ann",
            "team": "blue",
            "created_by": "admin"
        })))
        .await
        .unwrap();
    let original = fetch(&table, "u1").await;

    let outcome = table
        .update(record(json!({"id": "u1", "name": "Bea"})))
        .await
        .unwrap();
    assert!(matches!(outcome, UpdateOutcome::Updated(_)));

    let updated = fetch(&table, "u1").await;
    assert_eq!(updated["name"], "Bea");
    assert_eq!(updated["team"], "blue");
    assert_eq!(updated["id"], "u1");
    assert_eq!(updated["created_at"], original["created_at"]);
    assert_eq!(updated["created_by"], "admin");
    assert!(updated["updated_at"].as_i64().unwrap() > original["updated_at"].as_i64().unwrap());
}

#[tokio::test]
async fn test_update_with_null_field_stores_null() {
    let (table, _) = setup();
    table.insert(record(json!({"id": "u1", "nickname": "A"}))).await.unwrap();

    table
        .update(record(json!({"id": "u1", "nickname": null})))
        .await
        .unwrap();

    assert_eq!(fetch(&table, "u1").await["nickname"], Value::Null);
}

#[tokio::test]
async fn test_delete() {
    let (table, _) = setup();
    assert!(matches!(
        table.delete("u1").await,
        Err(AccessError::NotFound(_))
    ));

    table.insert(record(json!({"id": "u1"}))).await.unwrap();
    table.delete("u1").await.unwrap();

    assert_eq!(table.fetch_one("u1", None).await.unwrap(), Fetched::NotFound);
}

#[tokio::test]
async fn test_fetch_many_with_missing_id() {
    let (table, _) = setup();
    table.insert(record(json!({"id": "a", "n": 1}))).await.unwrap();
    table.insert(record(json!({"id": "b", "n": 2}))).await.unwrap();

    let ids: Vec<String> = ["a", "b", "missing"].iter().map(|s| s.to_string()).collect();
    let results = table.fetch_many(&ids, &[]).await;

    assert_eq!(results.len(), 3);
    assert_eq!(results["a"].record().unwrap()["n"], 1);
    assert_eq!(results["b"].record().unwrap()["n"], 2);
    assert_eq!(
        serde_json::to_value(&results["missing"]).unwrap(),
        json!({"status": 400, "message": "No Record Found"})
    );
}

#[tokio::test]
async fn test_fetch_many_projection() {
    let (table, _) = setup();
    table
        .insert(record(json!({"id": "a", "name": "Ann", "secret": "x"})))
        .await
        .unwrap();

    let fields = vec!["name".to_string(), "name".to_string()];
    let results = table.fetch_many(&["a".to_string()], &fields).await;

    assert_eq!(
        results["a"],
        FetchEntry::Found(record(json!({"name": "Ann"})))
    );
}

#[tokio::test]
async fn test_fetch_many_empty_ids() {
    let (table, _) = setup();
    assert!(table.fetch_many(&[], &[]).await.is_empty());
}

/// Fails every lookup of the key "boom"; delegates everything else
struct FlakyStore {
    inner: InMemoryStore,
}

impl TableStore for FlakyStore {
    fn query(&self, request: QueryRequest) -> StoreFuture<'_, QueryOutput> {
        if request.key == "boom" {
            return Box::pin(async { Err(StoreError::Unavailable("connection reset".into())) });
        }
        self.inner.query(request)
    }

    fn put_item(&self, request: PutRequest) -> StoreFuture<'_, WriteAck> {
        self.inner.put_item(request)
    }

    fn transact_update(&self, request: TransactUpdateRequest) -> StoreFuture<'_, WriteAck> {
        self.inner.transact_update(request)
    }

    fn delete_item(&self, request: DeleteRequest) -> StoreFuture<'_, WriteAck> {
        self.inner.delete_item(request)
    }
}

#[tokio::test]
async fn test_fetch_many_partial_failure() {
    let store = Arc::new(FlakyStore {
        inner: InMemoryStore::with_tables(["actors"]),
    });
    let table = Table::new("actors", store).unwrap();
    table.insert(record(json!({"id": "ok"}))).await.unwrap();

    let ids = vec!["ok".to_string(), "boom".to_string()];
    let results = table.fetch_many(&ids, &[]).await;

    assert!(results["ok"].record().is_some());
    match &results["boom"] {
        FetchEntry::Failed { status, message } => {
            assert_eq!(*status, 500);
            assert!(message.contains("connection reset"));
        }
        other => panic!("Expected failure entry, got {:?}", other),
    }
}

/// Holds one record but rejects every update guard, reporting the
/// record as it was
struct RacingStore {
    inner: InMemoryStore,
}

impl TableStore for RacingStore {
    fn query(&self, request: QueryRequest) -> StoreFuture<'_, QueryOutput> {
        self.inner.query(request)
    }

    fn put_item(&self, request: PutRequest) -> StoreFuture<'_, WriteAck> {
        self.inner.put_item(request)
    }

    fn transact_update(&self, request: TransactUpdateRequest) -> StoreFuture<'_, WriteAck> {
        let old_item = Some(marshall(&record(json!({"id": request.key, "name": "Concurrent"}))));
        Box::pin(async move {
            Err(StoreError::ConditionalCheckFailed {
                condition: "attribute_exists(id)".into(),
                old_item,
            })
        })
    }

    fn delete_item(&self, request: DeleteRequest) -> StoreFuture<'_, WriteAck> {
        self.inner.delete_item(request)
    }
}

#[tokio::test]
async fn test_rejected_update_returns_previous_record() {
    let store = Arc::new(RacingStore {
        inner: InMemoryStore::with_tables(["actors"]),
    });
    let table = Table::new("actors", store).unwrap();
    table.insert(record(json!({"id": "u1", "name": "Ann"}))).await.unwrap();

    let outcome = table
        .update(record(json!({"id": "u1", "name": "Bea"})))
        .await
        .unwrap();

    match outcome {
        UpdateOutcome::Rejected { previous } => assert_eq!(previous["name"], "Concurrent"),
        other => panic!("Expected rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn test_store_failure_is_unexpected() {
    let store = Arc::new(FlakyStore {
        inner: InMemoryStore::with_tables(["actors"]),
    });
    let table = Table::new("actors", store).unwrap();

    let err = table.fetch_one("boom", None).await.unwrap_err();
    assert!(matches!(err, AccessError::Store(StoreError::Unavailable(_))));
    assert!(!err.is_expected());
    assert_eq!(err.status_code(), 500);
}

#[tokio::test]
async fn test_unknown_table() {
    let store = Arc::new(InMemoryStore::new());
    let table = Table::new("nowhere", store).unwrap();

    let err = table.insert(record(json!({"id": "u1"}))).await.unwrap_err();
    assert!(matches!(err, AccessError::Store(StoreError::TableNotFound(_))));
}
