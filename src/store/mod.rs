//! # Store Protocol
//!
//! The operations the data-access layer consumes from the key-value
//! store. Every operation addresses one table by name and one item by
//! its primary key; consistency rests entirely on the guards the store
//! evaluates atomically with each write.

mod errors;
mod memory;
mod types;

pub use errors::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use types::{
    Condition, ConsumedCapacity, DeleteRequest, PutRequest, QueryOutput, QueryRequest,
    TransactUpdateRequest, WriteAck,
};

use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by store calls
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = StoreResult<T>> + Send + 'a>>;

/// Connection to the key-value store.
///
/// Implementations are shared read-only across every table accessor in
/// the process.
pub trait TableStore: Send + Sync {
    /// Point lookup by primary key
    fn query(&self, request: QueryRequest) -> StoreFuture<'_, QueryOutput>;

    /// Conditional single-item put
    fn put_item(&self, request: PutRequest) -> StoreFuture<'_, WriteAck>;

    /// Conditional single-item transactional update
    fn transact_update(&self, request: TransactUpdateRequest) -> StoreFuture<'_, WriteAck>;

    /// Conditional single-item delete
    fn delete_item(&self, request: DeleteRequest) -> StoreFuture<'_, WriteAck>;
}
