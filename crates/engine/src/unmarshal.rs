//! Unmarshaling engine
//!
//! Rebuilds entities from the records a query returned. The self record is
//! applied before any relationship record, whatever the order the store
//! returned them in, so `unmarshal_ref` always sees a populated entity.

use serde::de::DeserializeOwned;
use tracing::debug;

use dynamap_core::{
    from_value, split_label, Error, Item, Ref, Relationship, Result, ATTR_DATA,
};

use crate::options::MarshalOptions;

/// An entity that can be rebuilt from its self record
pub trait Unmarshaler {
    /// Called after the payload was decoded, with the full record
    ///
    /// Use it to pick up metadata such as timestamps.
    fn unmarshal_self(&mut self, _record: &Relationship) -> Result<()> {
        Ok(())
    }
}

/// An entity that can absorb its relationship records
pub trait RefUnmarshaler: Unmarshaler {
    /// Apply one relationship `name` pointing at the target `id`
    fn unmarshal_ref(&mut self, name: &str, id: &str, record: &Relationship) -> Result<()>;
}

impl Unmarshaler for Ref {}

/// Decode a self record into a new `T`
pub fn unmarshal_self<T>(item: &Item) -> Result<(T, Relationship)>
where
    T: DeserializeOwned + Unmarshaler,
{
    let record = Relationship::from_item(item)?;
    let mut entity = decode_data::<T>(&record)?;
    entity
        .unmarshal_self(&record)
        .map_err(|e| Error::unmarshal(format!("self {}", record.source), e))?;
    Ok((entity, record))
}

/// Rebuild one entity and its relationships from a partition's records
///
/// Fails with `Error::NotFound` when `items` is empty. Relationships are
/// returned in input order.
pub fn unmarshal_entity<T>(
    items: &[Item],
    out: &mut T,
    opts: &MarshalOptions,
) -> Result<Vec<Relationship>>
where
    T: DeserializeOwned + RefUnmarshaler,
{
    if items.is_empty() {
        return Err(Error::NotFound);
    }

    let mut records = Vec::with_capacity(items.len());
    let mut pending = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let record = Relationship::from_item(item)?;
        if record.is_self() {
            let mut entity = decode_data::<T>(&record)?;
            entity
                .unmarshal_self(&record)
                .map_err(|e| Error::unmarshal(format!("self {}", record.source), e))?;
            *out = entity;
        } else {
            let parts = split_label(&record.label, &opts.label_delimiter).map_err(|e| {
                Error::unmarshal(format!("record {} -> {}", record.source, record.target), e)
            })?;
            let reference = decode_data::<Ref>(&record)?;
            pending.push((index, parts.name, reference.target_id));
        }
        records.push(record);
    }

    // the relationship name is the label's, not the payload's
    for (index, name, target_id) in &pending {
        let record = &records[*index];
        out.unmarshal_ref(name, target_id, record).map_err(|e| {
            Error::unmarshal(
                format!("ref {} of {} -> {}", name, record.source, record.target),
                e,
            )
        })?;
    }

    debug!(
        target: "dynamap::unmarshal",
        records = records.len(),
        refs = pending.len(),
        "Unmarshaled entity"
    );
    Ok(records)
}

/// Decode every item as a self record, appending to `out`
///
/// On failure `out` is left untouched and the error names the item index.
pub fn unmarshal_list<T>(items: &[Item], out: &mut Vec<T>) -> Result<Vec<Relationship>>
where
    T: DeserializeOwned + Unmarshaler,
{
    let mut entities = Vec::with_capacity(items.len());
    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let (entity, record) =
            unmarshal_self::<T>(item).map_err(|e| Error::unmarshal(format!("item {}", index), e))?;
        entities.push(entity);
        records.push(record);
    }
    out.extend(entities);
    Ok(records)
}

fn decode_data<T: DeserializeOwned>(record: &Relationship) -> Result<T> {
    if record.data.is_null() {
        return Err(Error::decode(format!(
            "record {} -> {}: {} attribute is missing",
            record.source, record.target, ATTR_DATA
        )));
    }
    from_value(&record.data).map_err(|e| {
        Error::decode(format!(
            "record {} -> {}: {}",
            record.source, record.target, e
        ))
    })
}
