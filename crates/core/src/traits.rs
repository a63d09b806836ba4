//! Store client abstraction
//!
//! The core never talks to a store directly. Everything it persists or reads
//! goes through `StoreClient`, so a network client, a local emulator or the
//! in-memory store can be swapped without touching the mapping layer.

use crate::error::Result;
use crate::request::{
    BatchWriteOutput, BatchWriteRequest, DeleteRequest, GetRequest, PutRequest, QueryOutput,
    QueryRequest, UpdateRequest,
};
use crate::value::Item;

/// Operations required from the underlying wide-row store
///
/// Each call is a single round trip. Callers get no retries from the core;
/// retry, backoff and deadlines belong to the implementation.
///
/// Thread safety: implementations must be safe to call concurrently
/// (requires Send + Sync).
pub trait StoreClient: Send + Sync {
    /// Unconditional upsert of one item
    fn put_item(&self, request: PutRequest) -> Result<()>;

    /// Best-effort, non-atomic write of up to 25 items
    ///
    /// Items the store could not write are returned in `unprocessed`.
    fn batch_write(&self, request: BatchWriteRequest) -> Result<BatchWriteOutput>;

    /// Fetch by full primary key
    ///
    /// Returns `None` when the item does not exist; that is not an error.
    fn get_item(&self, request: GetRequest) -> Result<Option<Item>>;

    /// Unconditional delete by full primary key
    fn delete_item(&self, request: DeleteRequest) -> Result<()>;

    /// Apply a partial update and return the requested post-update values
    fn update_item(&self, request: UpdateRequest) -> Result<Item>;

    /// Range query returning one page plus a continuation token
    fn query(&self, request: QueryRequest) -> Result<QueryOutput>;
}
