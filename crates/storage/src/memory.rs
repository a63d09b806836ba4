//! MemoryStore: in-process wide-row store
//!
//! This module implements `StoreClient` using:
//! - `BTreeMap<(hk, sk), Item>` per table, ordered by partition then sort key
//! - a sparse `LabelIndex` standing in for the ref index
//! - a `TtlIndex` for expiry sweeps
//! - `parking_lot::RwLock` for thread-safe access
//!
//! # Design Notes
//!
//! - **Logical TTL expiration**: items whose `expires` (Unix seconds) is at or
//!   before the store clock are invisible to every read; `sweep_expired`
//!   deletes them.
//! - **Limit before filter**: a query's limit counts evaluated items, so a
//!   filtered page can be short or empty while a continuation key is still
//!   returned.
//! - **Continuation keys**: emitted only when the limit stopped the scan
//!   with candidates remaining; they carry the primary key, plus `label` and
//!   `gsi1_sk` for index queries.
//! - All indices are updated under the same write lock as the items.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use dynamap_core::{
    system_clock, BatchWriteOutput, BatchWriteRequest, Clock, DeleteRequest, Error, GetRequest,
    Item, PutRequest, QueryOutput, QueryRequest, Result, ReturnValues, StoreClient,
    UpdateAction, UpdateRequest, Value, ATTR_EXPIRES, ATTR_LABEL, ATTR_REF_SORT_KEY,
    ATTR_SOURCE, ATTR_TARGET, DEFAULT_REF_INDEX_NAME,
};

use crate::index::{LabelIndex, PrimaryKey};
use crate::ttl::TtlIndex;

/// Maximum number of items accepted by one `batch_write`
pub const MAX_BATCH_ITEMS: usize = 25;

/// Ordering position of a query candidate
type Position = (String, String, String);

#[derive(Debug, Default)]
struct TableState {
    items: BTreeMap<PrimaryKey, Item>,
    labels: LabelIndex,
    ttl: TtlIndex,
}

impl TableState {
    fn insert(&mut self, key: PrimaryKey, item: Item) {
        self.remove(&key);
        if let Some((label, sort_key)) = index_position(&item) {
            self.labels.insert(label, sort_key, &key);
        }
        if let Some(expires) = expires_of(&item) {
            self.ttl.insert(expires, key.clone());
        }
        self.items.insert(key, item);
    }

    fn remove(&mut self, key: &PrimaryKey) -> Option<Item> {
        let old = self.items.remove(key)?;
        if let Some((label, sort_key)) = index_position(&old) {
            self.labels.remove(label, sort_key, key);
        }
        if let Some(expires) = expires_of(&old) {
            self.ttl.remove(expires, key);
        }
        Some(old)
    }
}

/// In-memory store with a primary key schema `hk` + `sk` and one sparse
/// secondary index `label` + `gsi1_sk`
///
/// Cloning shares the underlying state, so clones can be handed to other
/// threads.
#[derive(Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<BTreeMap<String, TableState>>>,
    ref_index_name: String,
    clock: Clock,
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("tables", &self.tables.read().len())
            .field("ref_index_name", &self.ref_index_name)
            .finish_non_exhaustive()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a new empty store using the system clock
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(BTreeMap::new())),
            ref_index_name: DEFAULT_REF_INDEX_NAME.to_string(),
            clock: system_clock(),
        }
    }

    /// Serve the ref index under a different name
    pub fn with_ref_index_name(mut self, name: impl Into<String>) -> Self {
        self.ref_index_name = name.into();
        self
    }

    /// Judge expiry against a different time source
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Number of stored items in `table`, expired ones included
    pub fn len(&self, table: &str) -> usize {
        self.tables
            .read()
            .get(table)
            .map_or(0, |state| state.items.len())
    }

    /// True when `table` holds no items
    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }

    /// Visible items of `table` in primary key order
    pub fn items(&self, table: &str) -> Vec<Item> {
        let now = self.now_secs();
        self.tables
            .read()
            .get(table)
            .map(|state| {
                state
                    .items
                    .values()
                    .filter(|item| !is_expired(item, now))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Delete every expired item; returns how many were removed
    pub fn sweep_expired(&self) -> usize {
        let now = self.now_secs();
        let mut tables = self.tables.write();
        let mut removed = 0;
        for (name, state) in tables.iter_mut() {
            let expired = state.ttl.find_expired(now);
            for key in &expired {
                if state.remove(key).is_some() {
                    removed += 1;
                }
            }
            if !expired.is_empty() {
                debug!(
                    target: "dynamap::storage",
                    table = %name,
                    removed = expired.len(),
                    "Swept expired items"
                );
            }
        }
        removed
    }

    fn now_secs(&self) -> i64 {
        (self.clock)().timestamp()
    }

    fn position_of(item: &Item, indexed: bool) -> Result<Position> {
        let field = |name: &str| -> Result<String> {
            item.get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    Error::store(format!("exclusive start key is missing {}", name))
                })
        };
        if indexed {
            Ok((field(ATTR_REF_SORT_KEY)?, field(ATTR_SOURCE)?, field(ATTR_TARGET)?))
        } else {
            Ok((field(ATTR_TARGET)?, field(ATTR_SOURCE)?, String::new()))
        }
    }
}

impl StoreClient for MemoryStore {
    fn put_item(&self, request: PutRequest) -> Result<()> {
        let key = primary_key(&request.item)?;
        let mut tables = self.tables.write();
        tables
            .entry(request.table_name)
            .or_default()
            .insert(key, request.item);
        Ok(())
    }

    fn batch_write(&self, request: BatchWriteRequest) -> Result<BatchWriteOutput> {
        if request.items.len() > MAX_BATCH_ITEMS {
            warn!(
                target: "dynamap::storage",
                items = request.items.len(),
                limit = MAX_BATCH_ITEMS,
                "Rejected oversize batch"
            );
            return Err(Error::InvalidOperation(format!(
                "batch of {} items exceeds the limit of {}",
                request.items.len(),
                MAX_BATCH_ITEMS
            )));
        }
        let keys = request
            .items
            .iter()
            .map(primary_key)
            .collect::<Result<Vec<_>>>()?;

        let mut tables = self.tables.write();
        let state = tables.entry(request.table_name).or_default();
        for (key, item) in keys.into_iter().zip(request.items) {
            state.insert(key, item);
        }
        Ok(BatchWriteOutput::default())
    }

    fn get_item(&self, request: GetRequest) -> Result<Option<Item>> {
        let key = primary_key(&request.key)?;
        let now = self.now_secs();
        let tables = self.tables.read();
        Ok(tables
            .get(&request.table_name)
            .and_then(|state| state.items.get(&key))
            .filter(|item| !is_expired(item, now))
            .cloned())
    }

    fn delete_item(&self, request: DeleteRequest) -> Result<()> {
        let key = primary_key(&request.key)?;
        let mut tables = self.tables.write();
        if let Some(state) = tables.get_mut(&request.table_name) {
            state.remove(&key);
        }
        Ok(())
    }

    fn update_item(&self, request: UpdateRequest) -> Result<Item> {
        let key = primary_key(&request.key)?;
        for action in request.update.actions() {
            let root = action.path().root();
            if root == ATTR_SOURCE || root == ATTR_TARGET {
                return Err(Error::InvalidOperation(format!(
                    "cannot update key attribute {}",
                    root
                )));
            }
        }

        let now = self.now_secs();
        let mut tables = self.tables.write();
        let state = tables.entry(request.table_name.clone()).or_default();
        let current = state
            .items
            .get(&key)
            .filter(|item| !is_expired(item, now))
            .cloned();

        if let Some(condition) = &request.condition {
            let subject = current.clone().unwrap_or_default();
            if !condition.evaluate(&subject) {
                return Err(Error::ConditionFailed(format!(
                    "update of {} -> {}",
                    key.0, key.1
                )));
            }
        }

        let mut item = current.unwrap_or_else(|| request.key.clone());
        request.update.apply(&mut item)?;
        state.insert(key, item.clone());

        Ok(match request.return_values {
            ReturnValues::None => Item::new(),
            ReturnValues::AllNew => item,
            ReturnValues::UpdatedNew => request
                .update
                .actions()
                .iter()
                .filter_map(|action| match action {
                    UpdateAction::Set { path, .. } => Some(path.root()),
                    UpdateAction::Remove(_) => None,
                })
                .filter_map(|root| item.get(root).map(|v| (root.to_string(), v.clone())))
                .collect(),
        })
    }

    fn query(&self, request: QueryRequest) -> Result<QueryOutput> {
        let indexed = match &request.index_name {
            None => false,
            Some(name) if *name == self.ref_index_name => true,
            Some(name) => return Err(Error::store(format!("unknown index {}", name))),
        };
        let (partition_attribute, sort_attribute) = if indexed {
            (ATTR_LABEL, ATTR_REF_SORT_KEY)
        } else {
            (ATTR_SOURCE, ATTR_TARGET)
        };

        let key_condition = &request.key_condition;
        if key_condition.partition_attribute != partition_attribute {
            return Err(Error::store(format!(
                "key condition must be on {}, found {}",
                partition_attribute, key_condition.partition_attribute
            )));
        }
        if let Some((attribute, _)) = &key_condition.sort {
            if attribute != sort_attribute {
                return Err(Error::store(format!(
                    "sort condition must be on {}, found {}",
                    sort_attribute, attribute
                )));
            }
        }
        let partition = key_condition
            .partition_value
            .as_str()
            .ok_or_else(|| Error::store("partition key value must be a string"))?;
        let limit = match request.limit {
            Some(0) => return Err(Error::store("limit must be positive")),
            Some(limit) => limit as usize,
            None => usize::MAX,
        };
        let start = request
            .exclusive_start_key
            .as_ref()
            .map(|key| Self::position_of(key, indexed))
            .transpose()?;

        let now = self.now_secs();
        let tables = self.tables.read();
        let state = match tables.get(&request.table_name) {
            Some(state) => state,
            None => return Ok(QueryOutput::default()),
        };

        let mut candidates: Vec<(Position, &Item)> = if indexed {
            state
                .labels
                .get(partition)
                .map(|entries| {
                    entries
                        .iter()
                        .filter_map(|(sort_key, hk, sk)| {
                            state
                                .items
                                .get(&(hk.clone(), sk.clone()))
                                .map(|item| ((sort_key.clone(), hk.clone(), sk.clone()), item))
                        })
                        .collect()
                })
                .unwrap_or_default()
        } else {
            state
                .items
                .range((partition.to_string(), String::new())..)
                .take_while(|((hk, _), _)| hk == partition)
                .map(|((hk, sk), item)| ((sk.clone(), hk.clone(), String::new()), item))
                .collect()
        };

        candidates.retain(|(_, item)| !is_expired(item, now) && key_condition.matches(item));
        if !request.scan_forward {
            candidates.reverse();
        }
        if let Some(start) = &start {
            candidates.retain(|(position, _)| {
                if request.scan_forward {
                    position > start
                } else {
                    position < start
                }
            });
        }

        let items: Vec<Item> = candidates
            .iter()
            .take(limit)
            .filter(|(_, item)| {
                request
                    .filter
                    .as_ref()
                    .map_or(true, |filter| filter.evaluate(item))
            })
            .map(|(_, item)| (*item).clone())
            .collect();

        let last_evaluated_key = if candidates.len() > limit {
            Some(continuation_key(candidates[limit - 1].1, indexed))
        } else {
            None
        };

        debug!(
            target: "dynamap::storage",
            table = %request.table_name,
            indexed,
            evaluated = candidates.len().min(limit),
            returned = items.len(),
            more = last_evaluated_key.is_some(),
            "Query"
        );
        Ok(QueryOutput {
            items,
            last_evaluated_key,
        })
    }
}

fn primary_key(item: &Item) -> Result<PrimaryKey> {
    match (item.get(ATTR_SOURCE), item.get(ATTR_TARGET)) {
        (Some(Value::String(hk)), Some(Value::String(sk))) => Ok((hk.clone(), sk.clone())),
        _ => Err(Error::InvalidKey(format!(
            "item must carry string {} and {} attributes",
            ATTR_SOURCE, ATTR_TARGET
        ))),
    }
}

fn index_position(item: &Item) -> Option<(&str, &str)> {
    match (item.get(ATTR_LABEL), item.get(ATTR_REF_SORT_KEY)) {
        (Some(Value::String(label)), Some(Value::String(sort_key))) => {
            Some((label.as_str(), sort_key.as_str()))
        }
        _ => None,
    }
}

fn expires_of(item: &Item) -> Option<i64> {
    item.get(ATTR_EXPIRES).and_then(Value::as_int)
}

fn is_expired(item: &Item, now: i64) -> bool {
    expires_of(item).map_or(false, |expires| expires <= now)
}

fn continuation_key(item: &Item, indexed: bool) -> Item {
    let mut attributes = vec![ATTR_SOURCE, ATTR_TARGET];
    if indexed {
        attributes.extend([ATTR_LABEL, ATTR_REF_SORT_KEY]);
    }
    attributes
        .into_iter()
        .filter_map(|name| item.get(name).map(|v| (name.to_string(), v.clone())))
        .collect()
}
