//! Store request and response descriptions
//!
//! Built by the engine's `Table` and executed by a `StoreClient`.

use crate::expression::{Condition, KeyCondition, UpdateExpression};
use crate::value::Item;

/// Unconditional upsert of one item
#[derive(Debug, Clone, PartialEq)]
pub struct PutRequest {
    /// Target table
    pub table_name: String,
    /// Item to store
    pub item: Item,
}

/// Non-atomic write of up to `MAX_BATCH_SIZE` items
#[derive(Debug, Clone, PartialEq)]
pub struct BatchWriteRequest {
    /// Target table
    pub table_name: String,
    /// Items to store, in order
    pub items: Vec<Item>,
}

/// Items a store could not write in a batch call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchWriteOutput {
    /// Unwritten items; empty on full success
    pub unprocessed: Vec<Item>,
}

/// Fetch by full primary key
#[derive(Debug, Clone, PartialEq)]
pub struct GetRequest {
    /// Target table
    pub table_name: String,
    /// `hk` + `sk`
    pub key: Item,
}

/// Delete by full primary key
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteRequest {
    /// Target table
    pub table_name: String,
    /// `hk` + `sk`
    pub key: Item,
}

/// Attributes returned from an update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReturnValues {
    /// Nothing
    None,
    /// Only the attributes written by the update, post-update
    #[default]
    UpdatedNew,
    /// The whole item, post-update
    AllNew,
}

/// Partial update of one item
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRequest {
    /// Target table
    pub table_name: String,
    /// `hk` + `sk`
    pub key: Item,
    /// Actions to apply
    pub update: UpdateExpression,
    /// Optional condition the current item must satisfy
    pub condition: Option<Condition>,
    /// What to return
    pub return_values: ReturnValues,
}

/// Range query over the table or the ref index
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    /// Target table
    pub table_name: String,
    /// Secondary index to query; `None` for the primary key schema
    pub index_name: Option<String>,
    /// Partition equality plus optional sort-key condition
    pub key_condition: KeyCondition,
    /// Optional post-read filter
    pub filter: Option<Condition>,
    /// Maximum number of items evaluated
    pub limit: Option<u32>,
    /// Continue after this key
    pub exclusive_start_key: Option<Item>,
    /// Ascending sort-key order when true
    pub scan_forward: bool,
}

/// One page of query results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutput {
    /// Matching items in sort-key order
    pub items: Vec<Item>,
    /// Continuation token; `None` when exhausted
    pub last_evaluated_key: Option<Item>,
}
