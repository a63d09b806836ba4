//! Composite key and label codec
//!
//! Entity identity and relationship membership are encoded into plain strings:
//!
//! - composite key: `<prefix><key_delimiter><id>` (e.g. `order#O1`)
//! - self label: `<prefix>` (e.g. `order`)
//! - relationship label: `<prefix><label_delimiter><id><label_delimiter><name>`
//!   (e.g. `order/O1/products`)
//!
//! ## Contract
//!
//! No escaping is performed. Prefixes, ids and relationship names must not
//! contain either delimiter; `validate_part` enforces this at encode time.
//! Decoding is only correct with the delimiters used at write time.

use crate::error::{Error, Result};

/// Default delimiter joining prefix and id into a composite key
pub const DEFAULT_KEY_DELIMITER: &str = "#";

/// Default delimiter joining label segments
pub const DEFAULT_LABEL_DELIMITER: &str = "/";

/// Build a composite key from a prefix and id
///
/// # Examples
///
/// ```
/// use dynamap_core::label::source_key;
///
/// assert_eq!(source_key("order", "O1", "#"), "order#O1");
/// ```
pub fn source_key(prefix: &str, id: &str, delimiter: &str) -> String {
    let mut key = String::with_capacity(prefix.len() + delimiter.len() + id.len());
    key.push_str(prefix);
    key.push_str(delimiter);
    key.push_str(id);
    key
}

/// Build the collection label for a named relationship
///
/// # Examples
///
/// ```
/// use dynamap_core::label::relationship_label;
///
/// assert_eq!(relationship_label("order", "O1", "products", "/"), "order/O1/products");
/// ```
pub fn relationship_label(
    source_prefix: &str,
    source_id: &str,
    name: &str,
    label_delimiter: &str,
) -> String {
    [source_prefix, source_id, name].join(label_delimiter)
}

/// Segments recovered from a label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelParts {
    /// Entity type (self label) or source prefix (relationship label)
    pub prefix: String,
    /// Source id; empty for self labels
    pub id: String,
    /// Relationship name; empty for self labels
    pub name: String,
}

impl LabelParts {
    /// True when the label had a single segment
    pub fn is_self(&self) -> bool {
        self.id.is_empty() && self.name.is_empty()
    }
}

/// Split a label into its segments
///
/// One segment yields `(prefix, "", "")`; three segments yield
/// `(prefix, id, name)`. Any other count, including the empty label, fails
/// with `Error::InvalidLabel`.
pub fn split_label(label: &str, label_delimiter: &str) -> Result<LabelParts> {
    if label.is_empty() {
        return Err(Error::InvalidLabel {
            label: String::new(),
            segments: 0,
        });
    }

    let parts: Vec<&str> = label.split(label_delimiter).collect();
    match parts.as_slice() {
        [prefix] => Ok(LabelParts {
            prefix: (*prefix).to_string(),
            id: String::new(),
            name: String::new(),
        }),
        [prefix, id, name] => Ok(LabelParts {
            prefix: (*prefix).to_string(),
            id: (*id).to_string(),
            name: (*name).to_string(),
        }),
        other => Err(Error::InvalidLabel {
            label: label.to_string(),
            segments: other.len(),
        }),
    }
}

/// Split a composite key back into `(prefix, id)`
pub fn split_key<'a>(key: &'a str, delimiter: &str) -> Result<(&'a str, &'a str)> {
    let mut parts = key.split(delimiter);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(prefix), Some(id), None) => Ok((prefix, id)),
        _ => Err(Error::InvalidKey(format!(
            "composite key {:?} should be <prefix>{}<id>",
            key, delimiter
        ))),
    }
}

/// Reject a prefix, id or name that would corrupt key or label parsing
pub fn validate_part(part: &str, key_delimiter: &str, label_delimiter: &str) -> Result<()> {
    for delimiter in [key_delimiter, label_delimiter] {
        if !delimiter.is_empty() && part.contains(delimiter) {
            return Err(Error::InvalidKey(format!(
                "{:?} contains reserved delimiter {:?}",
                part, delimiter
            )));
        }
    }
    Ok(())
}
