//! Marshal options and entity descriptors
//!
//! `MarshalOptions` is the immutable context a marshal call runs under.
//! Entities never mutate it; they answer with a `Descriptor` value that says
//! where their self record lives and which overrides apply to it.

use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

use dynamap_core::label::{source_key, validate_part};
use dynamap_core::{system_clock, Clock, Result, DEFAULT_KEY_DELIMITER, DEFAULT_LABEL_DELIMITER};

/// Context for one marshal call
#[derive(Clone)]
pub struct MarshalOptions {
    /// Separator between prefix and id in composite keys
    pub key_delimiter: String,
    /// Separator between label segments
    pub label_delimiter: String,
    /// Time source for record timestamps
    pub clock: Clock,
    /// Creation time applied when the entity leaves it unset
    pub created: Option<DateTime<Utc>>,
    /// Modification time applied when the entity leaves it unset
    pub updated: Option<DateTime<Utc>>,
    /// TTL applied when the entity leaves it unset
    pub time_to_live: Option<Duration>,
    /// Emit only the self record
    pub skip_refs: bool,
}

impl Default for MarshalOptions {
    fn default() -> Self {
        MarshalOptions {
            key_delimiter: DEFAULT_KEY_DELIMITER.to_string(),
            label_delimiter: DEFAULT_LABEL_DELIMITER.to_string(),
            clock: system_clock(),
            created: None,
            updated: None,
            time_to_live: None,
            skip_refs: false,
        }
    }
}

impl fmt::Debug for MarshalOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarshalOptions")
            .field("key_delimiter", &self.key_delimiter)
            .field("label_delimiter", &self.label_delimiter)
            .field("created", &self.created)
            .field("updated", &self.updated)
            .field("time_to_live", &self.time_to_live)
            .field("skip_refs", &self.skip_refs)
            .finish_non_exhaustive()
    }
}

impl MarshalOptions {
    /// Default options: `#` and `/` delimiters, system clock
    pub fn new() -> Self {
        Self::default()
    }

    /// Use different key and label delimiters
    pub fn with_delimiters(mut self, key: impl Into<String>, label: impl Into<String>) -> Self {
        self.key_delimiter = key.into();
        self.label_delimiter = label.into();
        self
    }

    /// Use a different time source
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Fall back to this creation time
    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }

    /// Fall back to this modification time
    pub fn with_updated(mut self, updated: DateTime<Utc>) -> Self {
        self.updated = Some(updated);
        self
    }

    /// Fall back to this TTL
    pub fn with_time_to_live(mut self, ttl: Duration) -> Self {
        self.time_to_live = Some(ttl);
        self
    }

    /// Emit only the self record when `skip` is true
    pub fn with_skip_refs(mut self, skip: bool) -> Self {
        self.skip_refs = skip;
        self
    }

    /// Current time according to the configured clock
    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Options for the relationships of an entity described by `parent`
    ///
    /// Timestamps and TTL the parent chose become the fallbacks for its
    /// relationship records.
    pub(crate) fn inherit(&self, parent: &Descriptor) -> MarshalOptions {
        MarshalOptions {
            created: parent.created.or(self.created),
            updated: parent.updated.or(self.updated),
            time_to_live: parent.time_to_live.or(self.time_to_live),
            ..self.clone()
        }
    }
}

/// How an entity describes itself for one marshal call
///
/// Source fields locate the partition, target fields the sort key. For a
/// self record both pairs are equal; `Descriptor::self_target` builds that.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Descriptor {
    /// Entity type of the source
    pub source_prefix: String,
    /// Identifier of the source
    pub source_id: String,
    /// Entity type of the target
    pub target_prefix: String,
    /// Identifier of the target
    pub target_id: String,
    /// Label of the self record, normally the target prefix
    pub label: String,
    /// Ref index sort key applied wherever this entity is a target
    pub ref_sort_key: String,
    /// Creation time; falls back to the options, then the clock
    pub created: Option<DateTime<Utc>>,
    /// Modification time; falls back to the options, then the clock
    pub updated: Option<DateTime<Utc>>,
    /// Lifetime of the record; none means it never expires
    pub time_to_live: Option<Duration>,
}

impl Descriptor {
    /// Self-describing entity of type `label` with identifier `id`
    pub fn self_target(label: impl Into<String>, id: impl Into<String>) -> Self {
        let label = label.into();
        let id = id.into();
        Descriptor {
            source_prefix: label.clone(),
            source_id: id.clone(),
            target_prefix: label.clone(),
            target_id: id,
            label,
            ..Default::default()
        }
    }

    /// Set the ref index sort key
    pub fn with_ref_sort_key(mut self, key: impl Into<String>) -> Self {
        self.ref_sort_key = key.into();
        self
    }

    /// Set the creation time when one is known
    pub fn with_created(mut self, created: Option<DateTime<Utc>>) -> Self {
        self.created = created;
        self
    }

    /// Set the modification time when one is known
    pub fn with_updated(mut self, updated: Option<DateTime<Utc>>) -> Self {
        self.updated = updated;
        self
    }

    /// Expire the record `ttl` after its creation time
    pub fn with_time_to_live(mut self, ttl: Duration) -> Self {
        self.time_to_live = Some(ttl);
        self
    }

    /// Source composite key
    pub fn source_key(&self, opts: &MarshalOptions) -> String {
        source_key(&self.source_prefix, &self.source_id, &opts.key_delimiter)
    }

    /// Target composite key
    pub fn target_key(&self, opts: &MarshalOptions) -> String {
        source_key(&self.target_prefix, &self.target_id, &opts.key_delimiter)
    }

    /// Reject parts that would not survive a round trip through the label codec
    pub fn validate(&self, opts: &MarshalOptions) -> Result<()> {
        for part in [
            &self.source_prefix,
            &self.source_id,
            &self.target_prefix,
            &self.target_id,
            &self.label,
        ] {
            validate_part(part, &opts.key_delimiter, &opts.label_delimiter)?;
        }
        Ok(())
    }
}
