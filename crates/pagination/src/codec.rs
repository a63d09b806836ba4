//! Continuation token codec
//!
//! A store continuation token is an `Item`. It is persisted as bincode,
//! wrapped in URL-safe base64 so it fits in a string attribute.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;

use dynamap_core::{Error, Item, Result};

/// Encodes continuation tokens to strings and back
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenCodec;

impl TokenCodec {
    /// Encode a token
    pub fn encode(token: &Item) -> Result<String> {
        let bytes = bincode::serialize(token)?;
        Ok(URL_SAFE.encode(bytes))
    }

    /// Decode a token produced by `encode`
    ///
    /// # Errors
    ///
    /// Returns `Error::Decode` if the payload is not valid base64 or does not
    /// hold an `Item`.
    pub fn decode(payload: &str) -> Result<Item> {
        let bytes = URL_SAFE
            .decode(payload)
            .map_err(|e| Error::decode(format!("cursor payload is not base64: {}", e)))?;
        bincode::deserialize(&bytes)
            .map_err(|e| Error::decode(format!("cursor payload is not a token: {}", e)))
    }
}
