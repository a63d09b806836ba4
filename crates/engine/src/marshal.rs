//! Marshaling engine
//!
//! Walks an entity's self description and, optionally, its declared
//! relationships into a flat list of `Relationship` records: the self record
//! first, then relationship records in the order they were added.

use serde::Serialize;
use tracing::debug;

use dynamap_core::label::{relationship_label, validate_part};
use dynamap_core::{to_value, Error, Ref, Relationship, Result, Value};

use crate::options::{Descriptor, MarshalOptions};

/// An entity that knows where it lives in the table
pub trait Marshaler {
    /// Describe the entity's own record
    fn marshal_self(&self, opts: &MarshalOptions) -> Result<Descriptor>;

    /// Capability cast for entities that also declare relationships
    ///
    /// Implementors of `RefMarshaler` return `Some(self)`.
    fn as_ref_marshaler(&self) -> Option<&dyn RefMarshaler> {
        None
    }
}

/// An entity with outgoing relationships
pub trait RefMarshaler {
    /// Add every relationship to `ctx`
    fn marshal_refs(&self, ctx: &mut RelationshipContext<'_>) -> Result<()>;
}

impl<T: Marshaler + ?Sized> Marshaler for &T {
    fn marshal_self(&self, opts: &MarshalOptions) -> Result<Descriptor> {
        (**self).marshal_self(opts)
    }

    fn as_ref_marshaler(&self) -> Option<&dyn RefMarshaler> {
        (**self).as_ref_marshaler()
    }
}

/// View a slice of entities as marshalers, for `RelationshipContext::add_many`
pub fn slice_of<T: Marshaler>(items: &[T]) -> Vec<&dyn Marshaler> {
    items.iter().map(|item| item as &dyn Marshaler).collect()
}

/// Accumulates the relationship records of one source entity
///
/// The first failure is kept and every later call becomes a no-op, so an
/// entity can add all of its relationships without checking each call.
pub struct RelationshipContext<'a> {
    parent: &'a Descriptor,
    opts: &'a MarshalOptions,
    records: Vec<Relationship>,
    error: Option<Error>,
}

impl<'a> RelationshipContext<'a> {
    /// Context for relationships whose source is `parent`
    pub fn new(parent: &'a Descriptor, opts: &'a MarshalOptions) -> Self {
        RelationshipContext {
            parent,
            opts,
            records: Vec::new(),
            error: None,
        }
    }

    /// Source composite key shared by every record in this context
    pub fn source(&self) -> String {
        self.parent.source_key(self.opts)
    }

    /// Records added so far
    pub fn records(&self) -> &[Relationship] {
        &self.records
    }

    /// The recorded failure, if any
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Add a relationship named `name` to `related`
    pub fn add_one(&mut self, name: &str, related: &dyn Marshaler) {
        if self.error.is_some() {
            return;
        }
        match self.relate(name, related) {
            Ok(record) => self.records.push(record),
            Err(e) => self.error = Some(Error::reference(name, e)),
        }
    }

    /// Add a relationship named `name` to each of `related`, in order
    pub fn add_many<'m, M, I>(&mut self, name: &str, related: I)
    where
        M: Marshaler + ?Sized + 'm,
        I: IntoIterator<Item = &'m M>,
    {
        for item in related {
            if self.error.is_some() {
                return;
            }
            self.add_one(name, &item);
        }
    }

    fn relate(&self, name: &str, related: &dyn Marshaler) -> Result<Relationship> {
        let opts = self.opts;
        validate_part(name, &opts.key_delimiter, &opts.label_delimiter)?;

        let target = related.marshal_self(opts)?;
        validate_part(&target.target_prefix, &opts.key_delimiter, &opts.label_delimiter)?;
        validate_part(&target.target_id, &opts.key_delimiter, &opts.label_delimiter)?;

        let label = relationship_label(
            &self.parent.source_prefix,
            &self.parent.source_id,
            name,
            &opts.label_delimiter,
        );
        let data = to_value(&Ref {
            name: name.to_string(),
            source_id: self.parent.source_id.clone(),
            target_id: target.target_id.clone(),
        })?;
        let descriptor = Descriptor {
            source_prefix: self.parent.source_prefix.clone(),
            source_id: self.parent.source_id.clone(),
            label,
            ..target
        };
        new_relationship(data, &descriptor, opts)
    }

    fn finish(self) -> Result<Vec<Relationship>> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.records),
        }
    }
}

/// Build one record from a descriptor
///
/// Timestamps come from the descriptor, then the options, then the clock.
/// `expires` is `created + ttl` for a non-zero TTL.
pub fn new_relationship(
    data: Value,
    descriptor: &Descriptor,
    opts: &MarshalOptions,
) -> Result<Relationship> {
    let now = opts.now();
    let created_at = descriptor.created.or(opts.created).unwrap_or(now);
    let updated_at = descriptor.updated.or(opts.updated).unwrap_or(now);

    let expires = match descriptor.time_to_live.or(opts.time_to_live) {
        Some(ttl) if !ttl.is_zero() => {
            let ttl = chrono::Duration::from_std(ttl)
                .map_err(|e| Error::InvalidOperation(format!("time to live out of range: {}", e)))?;
            let expires = created_at.checked_add_signed(ttl).ok_or_else(|| {
                Error::InvalidOperation("time to live overflows the expiry".to_string())
            })?;
            Some(expires)
        }
        _ => None,
    };

    Ok(Relationship {
        source: descriptor.source_key(opts),
        target: descriptor.target_key(opts),
        label: descriptor.label.clone(),
        created_at,
        updated_at,
        expires,
        data,
        ref_sort_key: descriptor.ref_sort_key.clone(),
    })
}

/// Marshal an entity into its self record followed by its relationships
///
/// Relationships are skipped when `opts.skip_refs` is set or the entity does
/// not declare any.
pub fn marshal_relationships<M>(entity: &M, opts: &MarshalOptions) -> Result<Vec<Relationship>>
where
    M: Marshaler + Serialize + ?Sized,
{
    let descriptor = entity
        .marshal_self(opts)
        .and_then(|d| d.validate(opts).map(|_| d))
        .map_err(|e| Error::marshal("self", e))?;
    let data = to_value(entity).map_err(|e| Error::marshal("self", e))?;

    let mut records = vec![new_relationship(data, &descriptor, opts)?];

    if !opts.skip_refs {
        if let Some(refs) = entity.as_ref_marshaler() {
            let ref_opts = opts.inherit(&descriptor);
            let mut ctx = RelationshipContext::new(&descriptor, &ref_opts);
            refs.marshal_refs(&mut ctx)
                .map_err(|e| Error::marshal("refs", e))?;
            records.extend(ctx.finish()?);
        }
    }

    debug!(
        target: "dynamap::marshal",
        label = %descriptor.label,
        records = records.len(),
        skip_refs = opts.skip_refs,
        "Marshaled entity"
    );
    Ok(records)
}
