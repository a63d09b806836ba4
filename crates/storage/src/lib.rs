//! Storage layer for dynamap
//!
//! An in-process store with the key schema dynamap expects:
//! - MemoryStore: `StoreClient` over ordered maps
//! - LabelIndex: the sparse ref index (`label` + `gsi1_sk`)
//! - TtlIndex: expiry tracking for sweeps

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod index;
pub mod memory;
pub mod ttl;

pub use index::{IndexEntry, LabelIndex, PrimaryKey};
pub use memory::{MemoryStore, MAX_BATCH_ITEMS};
pub use ttl::TtlIndex;
