//! dynamap - entity-relationship mapping for single-table wide-row stores
//!
//! An entity graph is persisted as relationship records sharing one table:
//! one self record per entity, plus one record per outgoing relationship,
//! all in the entity's partition. Records are read back with a partition
//! query (entity plus relationships) or through the ref index (every record
//! with a given label).
//!
//! # Quick Start
//!
//! ```ignore
//! use dynamap::{MemoryStore, Table, QueryEntity, unmarshal_entity};
//!
//! let store = MemoryStore::new();
//! let table = Table::new("shop");
//!
//! // Write the order and its product relationships
//! table.write_entity(&store, &order)?;
//!
//! // Read them back in one query
//! let output = store.query(table.marshal_query(&QueryEntity::new(&order))?)?;
//! let mut loaded = Order::default();
//! unmarshal_entity(&output.items, &mut loaded, &table.options())?;
//! ```
//!
//! # Architecture
//!
//! - `dynamap-core`: values, label codec, records, expressions, `StoreClient`
//! - `dynamap-engine`: marshal/unmarshal, query planning, table builders
//! - `dynamap-storage`: `MemoryStore`, an in-process `StoreClient`
//! - `dynamap-pagination`: cursor ids for continuation tokens

pub use dynamap_core::*;
pub use dynamap_engine::{
    data_attribute, filters, marshal_relationships, new_relationship, slice_of, unmarshal_entity,
    unmarshal_list, unmarshal_self, write_batches, Descriptor, MarshalOptions, Marshaler,
    QueryEntity, QueryList, QueryMarshaler, RefMarshaler, RefUnmarshaler, RelationshipContext,
    Table, TableConfig, Unmarshaler, Updater, DEFAULT_PAGINATION_TTL_SECS, MAX_BATCH_SIZE,
};
pub use dynamap_pagination::{
    generate_cursor, PageCursor, Paginator, TablePaginator, TokenCodec, CURSOR_PREFIX,
};
pub use dynamap_storage::{MemoryStore, MAX_BATCH_ITEMS};
