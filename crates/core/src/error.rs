//! Error types for dynamap
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Errors are grouped by kind rather than by call site:
//! - describe failures raised while an entity explains itself (`Marshal`)
//! - the first failure recorded by a relationship context (`Reference`)
//! - malformed records coming back from the store (`Decode`, `InvalidLabel`)
//! - the distinguished `NotFound` condition for empty entity reads

use thiserror::Error;

/// Result type alias for dynamap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for dynamap
#[derive(Debug, Error)]
pub enum Error {
    /// An entity failed to describe itself or its relationships
    #[error("failed to marshal {stage}: {source}")]
    Marshal {
        /// Which describe step failed ("self" or "refs")
        stage: &'static str,
        /// Underlying cause
        #[source]
        source: Box<Error>,
    },

    /// A named relationship could not be added to a relationship context
    #[error("failed to marshal reference {name}: {source}")]
    Reference {
        /// Relationship name passed to `add_one` / `add_many`
        name: String,
        /// Underlying cause
        #[source]
        source: Box<Error>,
    },

    /// A record decoded but an entity callback rejected it
    #[error("failed to unmarshal {record}: {source}")]
    Unmarshal {
        /// Which record or relationship was being applied
        record: String,
        /// Underlying cause
        #[source]
        source: Box<Error>,
    },

    /// A returned record could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// A label did not split into 1 or 3 segments
    #[error("invalid label format: {label:?} (should have 1 or 3 segments, found {segments})")]
    InvalidLabel {
        /// The offending label
        label: String,
        /// Number of segments found
        segments: usize,
    },

    /// A composite key or one of its parts is malformed
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// No records were returned for an entity read
    #[error("item not found")]
    NotFound,

    /// Required configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid operation or state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A conditional store write was rejected
    #[error("Condition failed: {0}")]
    ConditionFailed(String),

    /// Store client error
    #[error("Store error: {0}")]
    Store(String),

    /// Error raised by application entity callbacks
    #[error("{0}")]
    Entity(String),
}

impl Error {
    /// Wrap a describe failure for the given stage
    pub fn marshal(stage: &'static str, source: Error) -> Self {
        Error::Marshal {
            stage,
            source: Box::new(source),
        }
    }

    /// Wrap a failure raised while adding the named relationship
    pub fn reference(name: impl Into<String>, source: Error) -> Self {
        Error::Reference {
            name: name.into(),
            source: Box::new(source),
        }
    }

    /// Wrap a failure raised while applying a decoded record
    pub fn unmarshal(record: impl Into<String>, source: Error) -> Self {
        Error::Unmarshal {
            record: record.into(),
            source: Box::new(source),
        }
    }

    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Error::Decode(msg.into())
    }

    /// Create an error from an application entity callback
    pub fn entity(msg: impl Into<String>) -> Self {
        Error::Entity(msg.into())
    }

    /// Create a store client error
    pub fn store(msg: impl Into<String>) -> Self {
        Error::Store(msg.into())
    }

    /// True for the distinguished not-found condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound)
    }

    /// True for any failure to read back a stored record
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            Error::Decode(_) | Error::InvalidLabel { .. } | Error::Unmarshal { .. }
        )
    }
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
