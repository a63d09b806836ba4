//! Core types and traits for dynamap
//!
//! This crate defines the foundational types used throughout the system:
//! - Value / Item: store-native attribute values and records
//! - label: composite key and label codec
//! - Relationship / Ref: the persisted record shape
//! - Clock: injectable time source
//! - expression: key conditions, filters and update expressions
//! - request: store request/response descriptions
//! - StoreClient: the contract required from the underlying store
//! - Error: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod error;
pub mod expression;
pub mod label;
pub mod relationship;
pub mod request;
pub mod traits;
pub mod value;

pub use clock::{fixed_clock, system_clock, Clock};
pub use error::{Error, Result};
pub use expression::{
    attr, AttributePath, Comparison, Condition, KeyCondition, SortKeyCondition, UpdateAction,
    UpdateExpression,
};
pub use label::{
    relationship_label, source_key, split_key, split_label, validate_part, LabelParts,
    DEFAULT_KEY_DELIMITER, DEFAULT_LABEL_DELIMITER,
};
pub use relationship::{
    table_key, unmarshal_table_key, Ref, Relationship, ATTR_CREATED, ATTR_DATA, ATTR_EXPIRES,
    ATTR_LABEL, ATTR_REF_SORT_KEY, ATTR_SOURCE, ATTR_TARGET, ATTR_UPDATED, DEFAULT_REF_INDEX_NAME,
};
pub use request::{
    BatchWriteOutput, BatchWriteRequest, DeleteRequest, GetRequest, PutRequest, QueryOutput,
    QueryRequest, ReturnValues, UpdateRequest,
};
pub use traits::StoreClient;
pub use value::{from_value, to_value, Item, Value};
