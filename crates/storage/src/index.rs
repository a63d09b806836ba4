//! Ref index: label → (ref sort key, primary key)
//!
//! Mirrors a sparse secondary index keyed on `label` + `gsi1_sk`. Only
//! records carrying both attributes are indexed; entries in one label are
//! ordered by ref sort key, then by primary key.

use std::collections::{BTreeMap, BTreeSet};

/// Primary key of a stored item: `(hk, sk)`
pub type PrimaryKey = (String, String);

/// Position of an item inside one label: `(gsi1_sk, hk, sk)`
pub type IndexEntry = (String, String, String);

/// Secondary index over labels
#[derive(Debug, Default)]
pub struct LabelIndex {
    index: BTreeMap<String, BTreeSet<IndexEntry>>,
}

impl LabelIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Index `key` under `label` at `sort_key`
    pub fn insert(&mut self, label: &str, sort_key: &str, key: &PrimaryKey) {
        self.index
            .entry(label.to_string())
            .or_default()
            .insert((sort_key.to_string(), key.0.clone(), key.1.clone()));
    }

    /// Remove `key` from `label`
    ///
    /// If the label becomes empty, the label entry is dropped.
    pub fn remove(&mut self, label: &str, sort_key: &str, key: &PrimaryKey) {
        if let Some(entries) = self.index.get_mut(label) {
            entries.remove(&(sort_key.to_string(), key.0.clone(), key.1.clone()));
            if entries.is_empty() {
                self.index.remove(label);
            }
        }
    }

    /// Entries under `label` in ascending order
    pub fn get(&self, label: &str) -> Option<&BTreeSet<IndexEntry>> {
        self.index.get(label)
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of distinct labels
    pub fn len(&self) -> usize {
        self.index.len()
    }
}
