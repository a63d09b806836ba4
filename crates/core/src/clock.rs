//! Injectable clock and timestamp encoding
//!
//! Records carry UTC timestamps. `created_at` / `updated_at` are stored as
//! fixed-width RFC 3339 strings (microsecond precision, `Z` suffix) so they
//! order lexically; `expires` is stored as Unix seconds for the store's TTL sweep.

use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::Arc;

use crate::error::{Error, Result};

/// Function returning the current time
///
/// Shared and thread-safe so independent callers can stamp records
/// concurrently without coordination.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Clock backed by the system time (UTC)
pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// Clock that always returns `moment`
pub fn fixed_clock(moment: DateTime<Utc>) -> Clock {
    Arc::new(move || moment)
}

/// Encode a timestamp for storage and for filter comparisons
pub fn format_timestamp(moment: &DateTime<Utc>) -> String {
    moment.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Decode a stored RFC 3339 timestamp
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::decode(format!("invalid timestamp {:?}: {}", raw, e)))
}

/// Decode a stored Unix-seconds expiry
pub fn from_unix_secs(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| Error::decode(format!("expiry {} is out of range", secs)))
}
