//! PageCursor entity and cursor id generation

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use dynamap_core::Result;
use dynamap_engine::{Descriptor, MarshalOptions, Marshaler, Unmarshaler};

/// Prefix and label of cursor records
pub const CURSOR_PREFIX: &str = "page";

/// A persisted continuation token
///
/// Stored as the self record `page#<cursor>`, with the cursor as ref sort key
/// so cursors are listable through the ref index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor {
    /// Opaque cursor id handed to callers
    pub cursor: String,
    /// Encoded continuation token; empty when there is none
    pub key: String,
    /// Record lifetime
    #[serde(skip)]
    pub ttl: Duration,
}

impl PageCursor {
    /// Cursor `cursor` carrying the encoded token `key`
    pub fn new(cursor: impl Into<String>, key: impl Into<String>, ttl: Duration) -> Self {
        PageCursor {
            cursor: cursor.into(),
            key: key.into(),
            ttl,
        }
    }

    /// Cursor usable only to address its record
    pub fn lookup(cursor: impl Into<String>) -> Self {
        PageCursor {
            cursor: cursor.into(),
            ..Default::default()
        }
    }
}

impl Marshaler for PageCursor {
    fn marshal_self(&self, _opts: &MarshalOptions) -> Result<Descriptor> {
        let descriptor =
            Descriptor::self_target(CURSOR_PREFIX, &self.cursor).with_ref_sort_key(&self.cursor);
        Ok(if self.ttl.is_zero() {
            descriptor
        } else {
            descriptor.with_time_to_live(self.ttl)
        })
    }
}

impl Unmarshaler for PageCursor {}

/// Generate a cursor id from the current time and 8 random bytes
///
/// The id is `base64url("<unix nanos>_<base64url(random)>")`, so it contains
/// neither key nor label delimiters.
pub fn generate_cursor(now: DateTime<Utc>) -> String {
    let mut random = [0u8; 8];
    OsRng.fill_bytes(&mut random);
    let nanos = now.timestamp_nanos_opt().unwrap_or_else(|| now.timestamp_micros() * 1000);
    let raw = format!("{}_{}", nanos, URL_SAFE.encode(random));
    URL_SAFE.encode(raw)
}
