//! Pagination cursor codec
//!
//! A cursor is the store's last evaluated key, serialized as DynamoDB JSON and
//! base64 encoded. The content is passed back to the store verbatim and is
//! never interpreted here.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};

use super::error::QueryError;
use super::value::Item;

/// Encode a last evaluated key. An empty key means "no more data" and yields no cursor.
pub fn encode_cursor(key: &Item) -> Result<Option<String>, QueryError> {
    if key.is_empty() {
        return Ok(None);
    }
    // Item is a BTreeMap, so serialization order is stable
    let bytes = serde_json::to_vec(key).map_err(QueryError::CursorEncoding)?;
    Ok(Some(URL_SAFE_NO_PAD.encode(bytes)))
}

/// Decode a cursor back into the store's key structure.
///
/// Accepts URL-safe unpadded and standard base64. A cursor that decodes to an
/// empty key is treated as absent.
pub fn decode_cursor(token: &str) -> Result<Option<Item>, QueryError> {
    let token = token.trim();
    let bytes = URL_SAFE_NO_PAD
        .decode(token)
        .or_else(|_| STANDARD.decode(token))
        .map_err(|_| QueryError::CorruptCursor)?;

    let key: Item = serde_json::from_slice(&bytes).map_err(|e| {
        tracing::debug!(error = %e, "Pagination token is not a valid key");
        QueryError::CorruptCursor
    })?;

    Ok((!key.is_empty()).then_some(key))
}
