//! Key conditions, filter conditions and update expressions
//!
//! These are abstract descriptions handed to a `StoreClient`; they carry no
//! store-specific syntax. Each type can also evaluate itself against an
//! `Item`, which is how the in-memory store executes them.
//!
//! Attribute paths use `.` to address nested map attributes, e.g.
//! `data.category` reaches into the record payload.

use std::cmp::Ordering;
use std::fmt;

use crate::error::{Error, Result};
use crate::value::{Item, Value};

/// Dotted path to a (possibly nested) attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributePath(Vec<String>);

impl AttributePath {
    /// Parse a dotted path such as `data.category`
    pub fn parse(path: &str) -> Self {
        AttributePath(path.split('.').map(str::to_string).collect())
    }

    /// Path segments, outermost first
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Top-level attribute name
    pub fn root(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or_default()
    }

    /// Look up the value at this path
    pub fn resolve<'a>(&self, item: &'a Item) -> Option<&'a Value> {
        let (first, rest) = self.0.split_first()?;
        rest.iter()
            .try_fold(item.get(first)?, |value, segment| value.as_map()?.get(segment))
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl From<&str> for AttributePath {
    fn from(path: &str) -> Self {
        AttributePath::parse(path)
    }
}

/// Binary comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `=`
    Eq,
    /// `<>`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl Comparison {
    fn holds(self, left: &Value, right: &Value) -> bool {
        let ordering = left.compare(right);
        match self {
            Comparison::Eq => ordering == Some(Ordering::Equal) || left == right,
            Comparison::Ne => !(ordering == Some(Ordering::Equal) || left == right),
            Comparison::Lt => ordering == Some(Ordering::Less),
            Comparison::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
            Comparison::Gt => ordering == Some(Ordering::Greater),
            Comparison::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        }
    }
}

/// Filter or write condition over item attributes
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `path <op> value`
    Compare {
        /// Attribute being compared
        path: AttributePath,
        /// Operator
        op: Comparison,
        /// Right-hand operand
        value: Value,
    },
    /// `low <= path <= high`
    Between {
        /// Attribute being compared
        path: AttributePath,
        /// Inclusive lower bound
        low: Value,
        /// Inclusive upper bound
        high: Value,
    },
    /// String attribute starts with `prefix`
    BeginsWith {
        /// Attribute being tested
        path: AttributePath,
        /// Required prefix
        prefix: String,
    },
    /// Attribute is present
    Exists(AttributePath),
    /// Attribute is absent
    NotExists(AttributePath),
    /// All conditions hold
    And(Vec<Condition>),
    /// At least one condition holds
    Or(Vec<Condition>),
    /// Condition does not hold
    Not(Box<Condition>),
}

impl Condition {
    /// Both `self` and `other` hold
    pub fn and(self, other: Condition) -> Condition {
        match self {
            Condition::And(mut all) => {
                all.push(other);
                Condition::And(all)
            }
            first => Condition::And(vec![first, other]),
        }
    }

    /// Either `self` or `other` holds
    pub fn or(self, other: Condition) -> Condition {
        match self {
            Condition::Or(mut any) => {
                any.push(other);
                Condition::Or(any)
            }
            first => Condition::Or(vec![first, other]),
        }
    }

    /// Negation of `self`
    pub fn negate(self) -> Condition {
        Condition::Not(Box::new(self))
    }

    /// Evaluate against an item; missing attributes never satisfy comparisons
    pub fn evaluate(&self, item: &Item) -> bool {
        match self {
            Condition::Compare { path, op, value } => path
                .resolve(item)
                .map_or(false, |found| op.holds(found, value)),
            Condition::Between { path, low, high } => path.resolve(item).map_or(false, |found| {
                Comparison::Ge.holds(found, low) && Comparison::Le.holds(found, high)
            }),
            Condition::BeginsWith { path, prefix } => path
                .resolve(item)
                .and_then(Value::as_str)
                .map_or(false, |s| s.starts_with(prefix.as_str())),
            Condition::Exists(path) => path.resolve(item).is_some(),
            Condition::NotExists(path) => path.resolve(item).is_none(),
            Condition::And(all) => all.iter().all(|c| c.evaluate(item)),
            Condition::Or(any) => any.iter().any(|c| c.evaluate(item)),
            Condition::Not(inner) => !inner.evaluate(item),
        }
    }
}

/// Builder entry point for conditions on one attribute
///
/// # Examples
///
/// ```
/// use dynamap_core::expression::attr;
///
/// let filter = attr("data.category").eq("books").and(attr("data.stock").gt(0));
/// ```
pub fn attr(path: &str) -> AttributeRef {
    AttributeRef(AttributePath::parse(path))
}

/// An attribute awaiting a condition
#[derive(Debug, Clone)]
pub struct AttributeRef(AttributePath);

impl AttributeRef {
    fn compare(self, op: Comparison, value: impl Into<Value>) -> Condition {
        Condition::Compare {
            path: self.0,
            op,
            value: value.into(),
        }
    }

    /// `attr = value`
    pub fn eq(self, value: impl Into<Value>) -> Condition {
        self.compare(Comparison::Eq, value)
    }

    /// `attr <> value`
    pub fn ne(self, value: impl Into<Value>) -> Condition {
        self.compare(Comparison::Ne, value)
    }

    /// `attr < value`
    pub fn lt(self, value: impl Into<Value>) -> Condition {
        self.compare(Comparison::Lt, value)
    }

    /// `attr <= value`
    pub fn le(self, value: impl Into<Value>) -> Condition {
        self.compare(Comparison::Le, value)
    }

    /// `attr > value`
    pub fn gt(self, value: impl Into<Value>) -> Condition {
        self.compare(Comparison::Gt, value)
    }

    /// `attr >= value`
    pub fn ge(self, value: impl Into<Value>) -> Condition {
        self.compare(Comparison::Ge, value)
    }

    /// `low <= attr <= high`
    pub fn between(self, low: impl Into<Value>, high: impl Into<Value>) -> Condition {
        Condition::Between {
            path: self.0,
            low: low.into(),
            high: high.into(),
        }
    }

    /// `begins_with(attr, prefix)`
    pub fn begins_with(self, prefix: impl Into<String>) -> Condition {
        Condition::BeginsWith {
            path: self.0,
            prefix: prefix.into(),
        }
    }

    /// `attribute_exists(attr)`
    pub fn exists(self) -> Condition {
        Condition::Exists(self.0)
    }

    /// `attribute_not_exists(attr)`
    pub fn not_exists(self) -> Condition {
        Condition::NotExists(self.0)
    }
}

/// Condition on a sort key attribute
///
/// The attribute itself is chosen by the query pattern (`sk` for entity
/// queries, `gsi1_sk` for label queries).
#[derive(Debug, Clone, PartialEq)]
pub enum SortKeyCondition {
    /// `= value`
    Eq(Value),
    /// `< value`
    Lt(Value),
    /// `<= value`
    Le(Value),
    /// `> value`
    Gt(Value),
    /// `>= value`
    Ge(Value),
    /// `BETWEEN low AND high`
    Between(Value, Value),
    /// `begins_with(prefix)`
    BeginsWith(String),
}

impl SortKeyCondition {
    /// Test a sort key value
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            SortKeyCondition::Eq(v) => Comparison::Eq.holds(value, v),
            SortKeyCondition::Lt(v) => Comparison::Lt.holds(value, v),
            SortKeyCondition::Le(v) => Comparison::Le.holds(value, v),
            SortKeyCondition::Gt(v) => Comparison::Gt.holds(value, v),
            SortKeyCondition::Ge(v) => Comparison::Ge.holds(value, v),
            SortKeyCondition::Between(low, high) => {
                Comparison::Ge.holds(value, low) && Comparison::Le.holds(value, high)
            }
            SortKeyCondition::BeginsWith(prefix) => value
                .as_str()
                .map_or(false, |s| s.starts_with(prefix.as_str())),
        }
    }
}

/// Key condition of a query: partition equality plus an optional sort condition
#[derive(Debug, Clone, PartialEq)]
pub struct KeyCondition {
    /// Partition key attribute name
    pub partition_attribute: String,
    /// Required partition key value
    pub partition_value: Value,
    /// Optional `(sort attribute, condition)`
    pub sort: Option<(String, SortKeyCondition)>,
}

impl KeyCondition {
    /// `attribute = value`
    pub fn equal(attribute: &str, value: impl Into<Value>) -> Self {
        KeyCondition {
            partition_attribute: attribute.to_string(),
            partition_value: value.into(),
            sort: None,
        }
    }

    /// Constrain the sort key as well
    pub fn and_sort(mut self, attribute: &str, condition: SortKeyCondition) -> Self {
        self.sort = Some((attribute.to_string(), condition));
        self
    }

    /// Test an item against the key condition
    pub fn matches(&self, item: &Item) -> bool {
        let partition_ok = item
            .get(&self.partition_attribute)
            .map_or(false, |v| v == &self.partition_value);
        if !partition_ok {
            return false;
        }
        match &self.sort {
            None => true,
            Some((attribute, condition)) => item
                .get(attribute)
                .map_or(false, |v| condition.matches(v)),
        }
    }
}

/// One action of an update expression
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateAction {
    /// `SET path = value`
    Set {
        /// Target attribute
        path: AttributePath,
        /// New value
        value: Value,
    },
    /// `REMOVE path`
    Remove(AttributePath),
}

impl UpdateAction {
    /// Path touched by this action
    pub fn path(&self) -> &AttributePath {
        match self {
            UpdateAction::Set { path, .. } => path,
            UpdateAction::Remove(path) => path,
        }
    }
}

/// Ordered list of update actions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateExpression {
    actions: Vec<UpdateAction>,
}

impl UpdateExpression {
    /// Create an empty expression
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `SET path = value`
    pub fn set(mut self, path: &str, value: impl Into<Value>) -> Self {
        self.actions.push(UpdateAction::Set {
            path: AttributePath::parse(path),
            value: value.into(),
        });
        self
    }

    /// Append `REMOVE path`
    pub fn remove(mut self, path: &str) -> Self {
        self.actions.push(UpdateAction::Remove(AttributePath::parse(path)));
        self
    }

    /// Actions in application order
    pub fn actions(&self) -> &[UpdateAction] {
        &self.actions
    }

    /// True when no actions are present
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Apply all actions to `item` in order
    ///
    /// Intermediate path segments must already exist as maps.
    pub fn apply(&self, item: &mut Item) -> Result<()> {
        for action in &self.actions {
            let segments = action.path().segments();
            let (last, parents) = segments
                .split_last()
                .ok_or_else(|| Error::InvalidOperation("empty update path".to_string()))?;

            let mut container: &mut Item = &mut *item;
            for segment in parents {
                container = container
                    .get_mut(segment)
                    .and_then(Value::as_map_mut)
                    .ok_or_else(|| {
                        Error::InvalidOperation(format!(
                            "update path {} does not resolve to a map",
                            action.path()
                        ))
                    })?;
            }

            match action {
                UpdateAction::Set { value, .. } => {
                    container.insert(last.clone(), value.clone());
                }
                UpdateAction::Remove(_) => {
                    container.remove(last);
                }
            }
        }
        Ok(())
    }
}
