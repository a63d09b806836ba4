//! Mapping engine for dynamap
//!
//! Turns entity graphs into relationship records and back, and plans the
//! queries that read them:
//! - options: immutable marshal context and entity descriptors
//! - marshal: `Marshaler` / `RefMarshaler` and the relationship context
//! - unmarshal: rebuilding entities from returned records
//! - query: partition-scoped and label-indexed query planning
//! - filters: time-window filter helpers
//! - table: request builders and batch writes
//! - config: TOML table configuration

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod filters;
pub mod marshal;
pub mod options;
pub mod query;
pub mod table;
pub mod unmarshal;

pub use config::{TableConfig, DEFAULT_PAGINATION_TTL_SECS, DEFAULT_REF_INDEX_NAME};
pub use marshal::{
    marshal_relationships, new_relationship, slice_of, Marshaler, RefMarshaler,
    RelationshipContext,
};
pub use options::{Descriptor, MarshalOptions};
pub use query::{QueryEntity, QueryList, QueryMarshaler};
pub use table::{data_attribute, write_batches, Table, Updater, MAX_BATCH_SIZE};
pub use unmarshal::{unmarshal_entity, unmarshal_list, unmarshal_self, RefUnmarshaler, Unmarshaler};
