//! TTL index for expiration sweeps
//!
//! Maps an `expires` value (Unix seconds) to the primary keys expiring then,
//! so a sweep visits only expired records instead of the whole table.

use std::collections::{BTreeMap, BTreeSet};

use crate::index::PrimaryKey;

/// TTL index: expiry second → keys
#[derive(Debug, Default)]
pub struct TtlIndex {
    index: BTreeMap<i64, BTreeSet<PrimaryKey>>,
}

impl TtlIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `key` as expiring at `expires`
    pub fn insert(&mut self, expires: i64, key: PrimaryKey) {
        self.index.entry(expires).or_default().insert(key);
    }

    /// Stop tracking `key`
    ///
    /// If the set becomes empty, the timestamp entry is dropped.
    pub fn remove(&mut self, expires: i64, key: &PrimaryKey) {
        if let Some(keys) = self.index.get_mut(&expires) {
            keys.remove(key);
            if keys.is_empty() {
                self.index.remove(&expires);
            }
        }
    }

    /// Keys whose expiry is at or before `now`
    pub fn find_expired(&self, now: i64) -> Vec<PrimaryKey> {
        self.index
            .range(..=now)
            .flat_map(|(_, keys)| keys.iter().cloned())
            .collect()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Total number of tracked keys
    pub fn len(&self) -> usize {
        self.index.values().map(|keys| keys.len()).sum()
    }
}
