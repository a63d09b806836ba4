//! Query planner
//!
//! Two access patterns are supported:
//!
//! - `QueryEntity`: one partition, i.e. an entity and everything it relates
//!   to, optionally narrowed on the target key.
//! - `QueryList`: one label on the ref index, i.e. every entity of a type or
//!   every target of a named relationship, optionally narrowed on the ref
//!   sort key.
//!
//! Which index a query uses follows from the pattern alone.

use dynamap_core::label::relationship_label;
use dynamap_core::{
    Condition, Error, Item, KeyCondition, QueryRequest, Result, SortKeyCondition, ATTR_LABEL,
    ATTR_REF_SORT_KEY, ATTR_SOURCE, ATTR_TARGET,
};

use crate::marshal::Marshaler;
use crate::options::MarshalOptions;
use crate::table::Table;

/// A query pattern that can be planned into a `QueryRequest`
pub trait QueryMarshaler {
    /// Key condition, filters, paging and order; table and index are left
    /// for `Table::marshal_query` to fill in
    fn marshal_query(&self, opts: &MarshalOptions) -> Result<QueryRequest>;

    /// Index the query runs against; `None` for the table's primary key
    fn use_index(&self, table: &Table) -> Option<String>;
}

/// All records carrying one label, via the ref index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryList {
    /// Label to match
    pub label: String,
    /// Condition on `gsi1_sk`
    pub ref_sort_filter: Option<SortKeyCondition>,
    /// Post-read filter
    pub condition_filter: Option<Condition>,
    /// Maximum number of items evaluated
    pub limit: Option<u32>,
    /// Continue after this key
    pub start_key: Option<Item>,
    /// Order newest/highest first
    pub sort_descending: bool,
}

impl QueryList {
    /// Every record labeled `label`
    pub fn new(label: impl Into<String>) -> Self {
        QueryList {
            label: label.into(),
            ..Default::default()
        }
    }

    /// Every target of relationship `name` from the given source entity
    pub fn relationship(
        source_prefix: &str,
        source_id: &str,
        name: &str,
        opts: &MarshalOptions,
    ) -> Self {
        Self::new(relationship_label(
            source_prefix,
            source_id,
            name,
            &opts.label_delimiter,
        ))
    }

    /// Narrow on the ref sort key
    pub fn with_ref_sort(mut self, condition: SortKeyCondition) -> Self {
        self.ref_sort_filter = Some(condition);
        self
    }

    /// Filter after reading
    pub fn with_filter(mut self, condition: Condition) -> Self {
        self.condition_filter = Some(condition);
        self
    }

    /// Evaluate at most `limit` items; zero means no limit
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = (limit > 0).then_some(limit);
        self
    }

    /// Resume from a continuation key
    pub fn with_start_key(mut self, start_key: Option<Item>) -> Self {
        self.start_key = start_key;
        self
    }

    /// Return results in descending ref sort key order
    pub fn descending(mut self) -> Self {
        self.sort_descending = true;
        self
    }
}

impl QueryMarshaler for QueryList {
    fn marshal_query(&self, _opts: &MarshalOptions) -> Result<QueryRequest> {
        if self.label.is_empty() {
            return Err(Error::InvalidOperation(
                "list query requires a label".to_string(),
            ));
        }
        let mut key_condition = KeyCondition::equal(ATTR_LABEL, self.label.as_str());
        if let Some(condition) = &self.ref_sort_filter {
            key_condition = key_condition.and_sort(ATTR_REF_SORT_KEY, condition.clone());
        }
        Ok(QueryRequest {
            table_name: String::new(),
            index_name: None,
            key_condition,
            filter: self.condition_filter.clone(),
            limit: self.limit,
            exclusive_start_key: self.start_key.clone(),
            scan_forward: !self.sort_descending,
        })
    }

    fn use_index(&self, table: &Table) -> Option<String> {
        Some(table.ref_index_name.clone())
    }
}

/// One entity's partition: its self record and all relationship records
#[derive(Clone)]
pub struct QueryEntity<'a> {
    /// Entity whose partition is read
    pub source: &'a dyn Marshaler,
    /// Condition on the target key (`sk`)
    pub target_filter: Option<SortKeyCondition>,
    /// Post-read filter
    pub condition_filter: Option<Condition>,
    /// Maximum number of items evaluated
    pub limit: Option<u32>,
    /// Continue after this key
    pub start_key: Option<Item>,
    /// Order by descending target key
    pub sort_descending: bool,
}

impl<'a> QueryEntity<'a> {
    /// Every record in `source`'s partition
    pub fn new(source: &'a dyn Marshaler) -> Self {
        QueryEntity {
            source,
            target_filter: None,
            condition_filter: None,
            limit: None,
            start_key: None,
            sort_descending: false,
        }
    }

    /// Narrow on the target key
    pub fn with_target(mut self, condition: SortKeyCondition) -> Self {
        self.target_filter = Some(condition);
        self
    }

    /// Only targets of entity type `prefix`
    pub fn with_target_prefix(self, prefix: &str, opts: &MarshalOptions) -> Self {
        let prefix = format!("{}{}", prefix, opts.key_delimiter);
        self.with_target(SortKeyCondition::BeginsWith(prefix))
    }

    /// Filter after reading
    pub fn with_filter(mut self, condition: Condition) -> Self {
        self.condition_filter = Some(condition);
        self
    }

    /// Evaluate at most `limit` items; zero means no limit
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = (limit > 0).then_some(limit);
        self
    }

    /// Resume from a continuation key
    pub fn with_start_key(mut self, start_key: Option<Item>) -> Self {
        self.start_key = start_key;
        self
    }

    /// Return results in descending target key order
    pub fn descending(mut self) -> Self {
        self.sort_descending = true;
        self
    }
}

impl QueryMarshaler for QueryEntity<'_> {
    fn marshal_query(&self, opts: &MarshalOptions) -> Result<QueryRequest> {
        let opts = opts.clone().with_skip_refs(true);
        let descriptor = self
            .source
            .marshal_self(&opts)
            .and_then(|d| d.validate(&opts).map(|_| d))
            .map_err(|e| Error::marshal("self", e))?;

        let mut key_condition = KeyCondition::equal(ATTR_SOURCE, descriptor.source_key(&opts));
        if let Some(condition) = &self.target_filter {
            key_condition = key_condition.and_sort(ATTR_TARGET, condition.clone());
        }
        Ok(QueryRequest {
            table_name: String::new(),
            index_name: None,
            key_condition,
            filter: self.condition_filter.clone(),
            limit: self.limit,
            exclusive_start_key: self.start_key.clone(),
            scan_forward: !self.sort_descending,
        })
    }

    fn use_index(&self, _table: &Table) -> Option<String> {
        None
    }
}
