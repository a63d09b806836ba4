//! Table request builders
//!
//! `Table` carries the settings every request needs (table name, ref index,
//! delimiters, clock) and turns entities into store requests. Executing the
//! requests is the `StoreClient`'s job; `write_entity` and `write_batches` are
//! thin sequential drivers on top.

use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

use dynamap_core::clock::format_timestamp;
use dynamap_core::{
    system_clock, table_key, BatchWriteOutput, BatchWriteRequest, Clock, Condition,
    DeleteRequest, Error, GetRequest, Item, PutRequest, QueryRequest, Relationship, Result,
    ReturnValues, StoreClient, UpdateExpression, UpdateRequest, ATTR_DATA, ATTR_UPDATED,
    DEFAULT_KEY_DELIMITER, DEFAULT_LABEL_DELIMITER,
};

use crate::config::{TableConfig, DEFAULT_PAGINATION_TTL_SECS, DEFAULT_REF_INDEX_NAME};
use crate::marshal::{marshal_relationships, Marshaler};
use crate::options::MarshalOptions;
use crate::query::QueryMarshaler;

/// Maximum number of items in one batch write
pub const MAX_BATCH_SIZE: usize = 25;

/// Path of a field inside the `data` payload, for filters and updates
///
/// # Examples
///
/// ```
/// use dynamap_engine::data_attribute;
///
/// assert_eq!(data_attribute("category"), "data.category");
/// ```
pub fn data_attribute(suffix: &str) -> String {
    format!("{}.{}", ATTR_DATA, suffix)
}

/// Supplies the actions of a partial update
pub trait Updater {
    /// Append actions to `update`, which already sets `updated_at`
    fn update_relationship(&self, update: UpdateExpression) -> UpdateExpression;

    /// Condition the stored record must satisfy for the update to apply
    fn condition(&self) -> Option<Condition> {
        None
    }
}

impl<F> Updater for F
where
    F: Fn(UpdateExpression) -> UpdateExpression,
{
    fn update_relationship(&self, update: UpdateExpression) -> UpdateExpression {
        self(update)
    }
}

/// A single table and its key schema
#[derive(Clone)]
pub struct Table {
    /// Store table name
    pub table_name: String,
    /// Name of the index keyed on `label` + `gsi1_sk`
    pub ref_index_name: String,
    /// Separator between prefix and id in composite keys
    pub key_delimiter: String,
    /// Separator between label segments
    pub label_delimiter: String,
    /// Lifetime of pagination cursors
    pub pagination_ttl: Duration,
    clock: Clock,
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("table_name", &self.table_name)
            .field("ref_index_name", &self.ref_index_name)
            .field("key_delimiter", &self.key_delimiter)
            .field("label_delimiter", &self.label_delimiter)
            .field("pagination_ttl", &self.pagination_ttl)
            .finish_non_exhaustive()
    }
}

impl Table {
    /// Table `table_name` with default index, delimiters and cursor TTL
    pub fn new(table_name: impl Into<String>) -> Self {
        Table {
            table_name: table_name.into(),
            ref_index_name: DEFAULT_REF_INDEX_NAME.to_string(),
            key_delimiter: DEFAULT_KEY_DELIMITER.to_string(),
            label_delimiter: DEFAULT_LABEL_DELIMITER.to_string(),
            pagination_ttl: Duration::from_secs(DEFAULT_PAGINATION_TTL_SECS),
            clock: system_clock(),
        }
    }

    /// Build a table from a validated config
    pub fn from_config(config: &TableConfig) -> Result<Self> {
        config.validate()?;
        Ok(Table {
            table_name: config.table_name.clone(),
            ref_index_name: config.ref_index_name.clone(),
            key_delimiter: config.key_delimiter.clone(),
            label_delimiter: config.label_delimiter.clone(),
            pagination_ttl: Duration::from_secs(config.pagination_ttl_secs),
            clock: system_clock(),
        })
    }

    /// Use a different ref index
    pub fn with_ref_index_name(mut self, name: impl Into<String>) -> Self {
        self.ref_index_name = name.into();
        self
    }

    /// Use different key and label delimiters
    pub fn with_delimiters(mut self, key: impl Into<String>, label: impl Into<String>) -> Self {
        self.key_delimiter = key.into();
        self.label_delimiter = label.into();
        self
    }

    /// Use a different cursor lifetime
    pub fn with_pagination_ttl(mut self, ttl: Duration) -> Self {
        self.pagination_ttl = ttl;
        self
    }

    /// Use a different time source
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Time source used for record timestamps
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Marshal options matching this table's key schema
    pub fn options(&self) -> MarshalOptions {
        MarshalOptions::new()
            .with_delimiters(self.key_delimiter.clone(), self.label_delimiter.clone())
            .with_clock(self.clock.clone())
    }

    /// Put request for the entity's self record
    pub fn marshal_put<M>(&self, entity: &M) -> Result<PutRequest>
    where
        M: Marshaler + Serialize + ?Sized,
    {
        self.marshal_put_with(entity, self.options())
    }

    /// Put request for the entity's self record, under caller-built options
    ///
    /// Relationships are always skipped.
    pub fn marshal_put_with<M>(&self, entity: &M, opts: MarshalOptions) -> Result<PutRequest>
    where
        M: Marshaler + Serialize + ?Sized,
    {
        let opts = opts.with_skip_refs(true);
        let mut records = marshal_relationships(entity, &opts)?;
        if records.len() != 1 {
            return Err(Error::InvalidOperation(format!(
                "put expects exactly one record, marshaled {}",
                records.len()
            )));
        }
        let record = records.remove(0);
        Ok(PutRequest {
            table_name: self.table_name.clone(),
            item: record.to_item(),
        })
    }

    /// Batch write requests for the entity and all of its relationships
    pub fn marshal_batch<M>(&self, entity: &M) -> Result<Vec<BatchWriteRequest>>
    where
        M: Marshaler + Serialize + ?Sized,
    {
        self.marshal_batch_with(entity, self.options())
    }

    /// Batch write requests under caller-built options
    pub fn marshal_batch_with<M>(
        &self,
        entity: &M,
        opts: MarshalOptions,
    ) -> Result<Vec<BatchWriteRequest>>
    where
        M: Marshaler + Serialize + ?Sized,
    {
        let records = marshal_relationships(entity, &opts)?;
        Ok(self.batch_requests(&records))
    }

    /// Split records into batches of at most `MAX_BATCH_SIZE`, keeping order
    pub fn batch_requests(&self, records: &[Relationship]) -> Vec<BatchWriteRequest> {
        let batches: Vec<BatchWriteRequest> = records
            .chunks(MAX_BATCH_SIZE)
            .map(|chunk| BatchWriteRequest {
                table_name: self.table_name.clone(),
                items: chunk.iter().map(Relationship::to_item).collect(),
            })
            .collect();
        debug!(
            target: "dynamap::table",
            records = records.len(),
            batches = batches.len(),
            "Chunked records into batches"
        );
        batches
    }

    /// Get request for the entity's self record
    pub fn marshal_get(&self, entity: &dyn Marshaler) -> Result<GetRequest> {
        Ok(GetRequest {
            table_name: self.table_name.clone(),
            key: self.self_key(entity)?,
        })
    }

    /// Delete request for the entity's self record
    pub fn marshal_delete(&self, entity: &dyn Marshaler) -> Result<DeleteRequest> {
        Ok(DeleteRequest {
            table_name: self.table_name.clone(),
            key: self.self_key(entity)?,
        })
    }

    /// Update request for the entity's self record
    ///
    /// The update always stamps `updated_at` with the table clock, followed
    /// by whatever the updater adds.
    pub fn marshal_update(
        &self,
        entity: &dyn Marshaler,
        updater: Option<&dyn Updater>,
    ) -> Result<UpdateRequest> {
        let updater =
            updater.ok_or_else(|| Error::Configuration("updater is required".to_string()))?;
        let key = self.self_key(entity)?;
        let base =
            UpdateExpression::new().set(ATTR_UPDATED, format_timestamp(&(self.clock)()));
        Ok(UpdateRequest {
            table_name: self.table_name.clone(),
            key,
            update: updater.update_relationship(base),
            condition: updater.condition(),
            return_values: ReturnValues::UpdatedNew,
        })
    }

    /// Query request for a planned query, routed to the index it selects
    pub fn marshal_query(&self, query: &dyn QueryMarshaler) -> Result<QueryRequest> {
        let mut request = query.marshal_query(&self.options())?;
        request.table_name = self.table_name.clone();
        request.index_name = query.use_index(self);
        debug!(
            target: "dynamap::query",
            table = %request.table_name,
            index = request.index_name.as_deref().unwrap_or("<primary>"),
            limit = ?request.limit,
            "Planned query"
        );
        Ok(request)
    }

    /// Marshal an entity with its relationships and write every batch
    pub fn write_entity<M>(&self, client: &dyn StoreClient, entity: &M) -> Result<BatchWriteOutput>
    where
        M: Marshaler + Serialize + ?Sized,
    {
        write_batches(client, self.marshal_batch(entity)?)
    }

    fn self_key(&self, entity: &dyn Marshaler) -> Result<Item> {
        let opts = self.options().with_skip_refs(true);
        let descriptor = entity
            .marshal_self(&opts)
            .and_then(|d| d.validate(&opts).map(|_| d))
            .map_err(|e| Error::marshal("self", e))?;
        Ok(table_key(
            &descriptor.source_key(&opts),
            &descriptor.target_key(&opts),
        ))
    }
}

/// Issue batch writes one after another
///
/// Stops at the first failing call; batches already written stay written.
/// Items the store reported as unprocessed are collected and returned.
pub fn write_batches(
    client: &dyn StoreClient,
    batches: Vec<BatchWriteRequest>,
) -> Result<BatchWriteOutput> {
    let total = batches.len();
    let mut output = BatchWriteOutput::default();
    for (index, batch) in batches.into_iter().enumerate() {
        let size = batch.items.len();
        match client.batch_write(batch) {
            Ok(result) => output.unprocessed.extend(result.unprocessed),
            Err(e) => {
                warn!(
                    target: "dynamap::table",
                    batch = index,
                    of = total,
                    items = size,
                    error = %e,
                    "Batch write failed"
                );
                return Err(e);
            }
        }
    }
    if !output.unprocessed.is_empty() {
        warn!(
            target: "dynamap::table",
            unprocessed = output.unprocessed.len(),
            "Store left items unprocessed"
        );
    }
    Ok(output)
}
