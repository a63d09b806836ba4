//! Table configuration via TOML
//!
//! A `TableConfig` names the table and its ref index and fixes the key
//! schema delimiters. Records written with one set of delimiters must be read
//! back with the same set, so the delimiters belong in configuration rather
//! than in code.

use serde::{Deserialize, Serialize};
use std::path::Path;

use dynamap_core::{Error, Result, DEFAULT_KEY_DELIMITER, DEFAULT_LABEL_DELIMITER};

pub use dynamap_core::DEFAULT_REF_INDEX_NAME;

/// Default lifetime of a pagination cursor (24 hours)
pub const DEFAULT_PAGINATION_TTL_SECS: u64 = 24 * 60 * 60;

/// Configuration for one table.
///
/// # Example
///
/// ```toml
/// table_name = "shop"
/// ref_index_name = "ref-index"
/// key_delimiter = "#"
/// label_delimiter = "/"
/// pagination_ttl_secs = 86400
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableConfig {
    /// Store table name
    #[serde(default)]
    pub table_name: String,
    /// Name of the ref index
    #[serde(default = "default_ref_index_name")]
    pub ref_index_name: String,
    /// Separator between prefix and id in composite keys
    #[serde(default = "default_key_delimiter")]
    pub key_delimiter: String,
    /// Separator between label segments
    #[serde(default = "default_label_delimiter")]
    pub label_delimiter: String,
    /// Lifetime of pagination cursors, in seconds
    #[serde(default = "default_pagination_ttl_secs")]
    pub pagination_ttl_secs: u64,
}

fn default_ref_index_name() -> String {
    DEFAULT_REF_INDEX_NAME.to_string()
}

fn default_key_delimiter() -> String {
    DEFAULT_KEY_DELIMITER.to_string()
}

fn default_label_delimiter() -> String {
    DEFAULT_LABEL_DELIMITER.to_string()
}

fn default_pagination_ttl_secs() -> u64 {
    DEFAULT_PAGINATION_TTL_SECS
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            table_name: String::new(),
            ref_index_name: default_ref_index_name(),
            key_delimiter: default_key_delimiter(),
            label_delimiter: default_label_delimiter(),
            pagination_ttl_secs: default_pagination_ttl_secs(),
        }
    }
}

impl TableConfig {
    /// Config for `table_name` with every other setting at its default
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Default::default()
        }
    }

    /// Check that the config describes a usable table.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if a name is empty, a delimiter is not a
    /// single character, both delimiters are equal, or the cursor TTL is zero.
    pub fn validate(&self) -> Result<()> {
        if self.table_name.is_empty() {
            return Err(Error::Configuration("table_name is required".to_string()));
        }
        if self.ref_index_name.is_empty() {
            return Err(Error::Configuration(
                "ref_index_name must not be empty".to_string(),
            ));
        }
        for (field, delimiter) in [
            ("key_delimiter", &self.key_delimiter),
            ("label_delimiter", &self.label_delimiter),
        ] {
            if delimiter.chars().count() != 1 {
                return Err(Error::Configuration(format!(
                    "{} must be a single character, found {:?}",
                    field, delimiter
                )));
            }
        }
        if self.key_delimiter == self.label_delimiter {
            return Err(Error::Configuration(format!(
                "key_delimiter and label_delimiter are both {:?}",
                self.key_delimiter
            )));
        }
        if self.pagination_ttl_secs == 0 {
            return Err(Error::Configuration(
                "pagination_ttl_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r##"# dynamap table configuration
#
# Name of the store table (required)
table_name = "dynamap"

# Secondary index keyed on label + gsi1_sk
ref_index_name = "ref-index"

# Composite key delimiter: <prefix><key_delimiter><id>
key_delimiter = "#"

# Label delimiter: <prefix><label_delimiter><id><label_delimiter><name>
label_delimiter = "/"

# Lifetime of pagination cursors in seconds (default: 24 hours)
pagination_ttl_secs = 86400
"##
    }

    /// Parse and validate a config from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TableConfig = toml::from_str(content)
            .map_err(|e| Error::Configuration(format!("Failed to parse table config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::Configuration(msg) => {
                Error::Configuration(format!("{} ({})", msg, path.display()))
            }
            other => other,
        })
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Serialization(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::Configuration(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
