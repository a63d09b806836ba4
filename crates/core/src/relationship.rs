//! Relationship records: the only persisted shape
//!
//! A `Relationship` associates a source entity with a target entity under a
//! label. A *self* relationship has equal source and target keys and carries
//! the entity's own state; every other relationship carries a small `Ref`
//! descriptor.
//!
//! For an order `O1` with products `P1` and `P2`:
//!
//! ```text
//! | hk       | sk         | label             |
//! | -------- | ---------- | ----------------- |
//! | order#O1 | order#O1   | order             |
//! | order#O1 | product#P1 | order/O1/products |
//! | order#O1 | product#P2 | order/O1/products |
//! ```
//!
//! - partition `order#O1` returns the order and everything it relates to
//! - label `order` on the ref index returns all orders
//! - label `order/O1/products` on the ref index returns the order's products

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::{format_timestamp, from_unix_secs, parse_timestamp};
use crate::error::{Error, Result};
use crate::value::{Item, Value};

/// Partition key attribute (source composite key)
pub const ATTR_SOURCE: &str = "hk";
/// Sort key attribute (target composite key)
pub const ATTR_TARGET: &str = "sk";
/// Label attribute; partition key of the ref index
pub const ATTR_LABEL: &str = "label";
/// Creation timestamp attribute
pub const ATTR_CREATED: &str = "created_at";
/// Modification timestamp attribute
pub const ATTR_UPDATED: &str = "updated_at";
/// Time-to-live attribute (Unix seconds)
pub const ATTR_EXPIRES: &str = "expires";
/// Payload attribute
pub const ATTR_DATA: &str = "data";
/// Sort key attribute of the ref index
pub const ATTR_REF_SORT_KEY: &str = "gsi1_sk";

/// Default name of the secondary index keyed on `label` + `gsi1_sk`
pub const DEFAULT_REF_INDEX_NAME: &str = "ref-index";

/// Reference descriptor stored as the payload of non-self relationships
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ref {
    /// Relationship name (e.g. "products")
    pub name: String,
    /// Identifier of the source entity
    pub source_id: String,
    /// Identifier of the target entity
    pub target_id: String,
}

/// A single stored association between two entities
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    /// Source composite key (`prefix#id`)
    pub source: String,
    /// Target composite key; equal to `source` for self records
    pub target: String,
    /// Entity type, or `prefix/id/name` for relationship records
    pub label: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Modification timestamp
    pub updated_at: DateTime<Utc>,
    /// Absolute expiry, when the record is ephemeral
    pub expires: Option<DateTime<Utc>>,
    /// Payload: entity state or a `Ref` descriptor
    pub data: Value,
    /// Sort key on the ref index; empty when unset
    pub ref_sort_key: String,
}

impl Relationship {
    /// True when source and target are the same entity
    pub fn is_self(&self) -> bool {
        self.source == self.target
    }

    /// Primary key of this record
    pub fn key(&self) -> Item {
        table_key(&self.source, &self.target)
    }

    /// Convert to a storable item
    ///
    /// `data`, `expires` and `gsi1_sk` are omitted when unset.
    pub fn to_item(&self) -> Item {
        let mut item = self.key();
        item.insert(ATTR_LABEL.to_string(), Value::from(self.label.as_str()));
        item.insert(
            ATTR_CREATED.to_string(),
            Value::String(format_timestamp(&self.created_at)),
        );
        item.insert(
            ATTR_UPDATED.to_string(),
            Value::String(format_timestamp(&self.updated_at)),
        );
        if let Some(expires) = self.expires {
            item.insert(ATTR_EXPIRES.to_string(), Value::Int(expires.timestamp()));
        }
        if !self.data.is_null() {
            item.insert(ATTR_DATA.to_string(), self.data.clone());
        }
        if !self.ref_sort_key.is_empty() {
            item.insert(
                ATTR_REF_SORT_KEY.to_string(),
                Value::from(self.ref_sort_key.as_str()),
            );
        }
        item
    }

    /// Read a record back from a stored item
    ///
    /// The key attributes are required; the others default when absent.
    pub fn from_item(item: &Item) -> Result<Self> {
        let (source, target) = unmarshal_table_key(item)?;
        let record = format!("{} -> {}", source, target);

        let label = optional_string(item, ATTR_LABEL, &record)?.unwrap_or_default();
        let created_at = match optional_string(item, ATTR_CREATED, &record)? {
            Some(raw) => parse_timestamp(&raw)?,
            None => DateTime::<Utc>::default(),
        };
        let updated_at = match optional_string(item, ATTR_UPDATED, &record)? {
            Some(raw) => parse_timestamp(&raw)?,
            None => DateTime::<Utc>::default(),
        };
        let expires = match item.get(ATTR_EXPIRES) {
            None | Some(Value::Null) => None,
            Some(Value::Int(secs)) => Some(from_unix_secs(*secs)?),
            Some(other) => {
                return Err(Error::decode(format!(
                    "record {}: {} should be Int, found {}",
                    record,
                    ATTR_EXPIRES,
                    other.type_name()
                )))
            }
        };
        let ref_sort_key = optional_string(item, ATTR_REF_SORT_KEY, &record)?.unwrap_or_default();

        Ok(Relationship {
            source,
            target,
            label,
            created_at,
            updated_at,
            expires,
            data: item.get(ATTR_DATA).cloned().unwrap_or(Value::Null),
            ref_sort_key,
        })
    }
}

/// Build a primary key item from source and target composite keys
pub fn table_key(source: &str, target: &str) -> Item {
    let mut key = Item::new();
    key.insert(ATTR_SOURCE.to_string(), Value::from(source));
    key.insert(ATTR_TARGET.to_string(), Value::from(target));
    key
}

/// Extract `(source, target)` from an item's primary key attributes
pub fn unmarshal_table_key(item: &Item) -> Result<(String, String)> {
    match (item.get(ATTR_SOURCE), item.get(ATTR_TARGET)) {
        (Some(Value::String(source)), Some(Value::String(target))) => {
            Ok((source.clone(), target.clone()))
        }
        (Some(_), Some(_)) => Err(Error::decode("source and target keys must be strings")),
        _ => Err(Error::decode("source and target keys not found")),
    }
}

fn optional_string(item: &Item, attr: &str, record: &str) -> Result<Option<String>> {
    match item.get(attr) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(Error::decode(format!(
            "record {}: {} should be String, found {}",
            record,
            attr,
            other.type_name()
        ))),
    }
}
