//! Pagination cursor codec.
//!
//! A cursor is `base64("<Kind>/<reference>")`, where `Kind` is the entity
//! kind of the first element of the page it was produced from and
//! `reference` is a decimal block number. Callers must treat cursors as
//! opaque; only this module produces or reads them.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::error::QueryError;
use crate::types::Paged;

const SEPARATOR: char = '/';

/// Encode a cursor for `reference`, tagged with the kind of `result_set[0]`.
///
/// The reference is passed already stringified; page builders pass block
/// numbers.
pub fn encode<T: Paged>(result_set: &[T], reference: &str) -> Result<String, QueryError> {
    let first = result_set
        .first()
        .ok_or_else(|| QueryError::codec("cannot encode a cursor for an empty result set"))?;
    encode_parts(first.kind(), reference)
}

/// Encode a cursor from an explicit kind tag.
pub fn encode_parts(kind: &str, reference: &str) -> Result<String, QueryError> {
    // A separator inside either field would not survive a decode.
    if kind.contains(SEPARATOR) || reference.contains(SEPARATOR) {
        return Err(QueryError::codec(format!(
            "cursor fields must not contain '{SEPARATOR}': {kind}{SEPARATOR}{reference}"
        )));
    }
    Ok(BASE64.encode(format!("{kind}{SEPARATOR}{reference}")))
}

/// Decode a cursor into its `(kind, reference)` fields.
///
/// The kind is carried through as-is; it is not checked against known
/// entity types.
pub fn decode(cursor: &str) -> Result<(String, String), QueryError> {
    if cursor.is_empty() {
        return Err(QueryError::codec("empty cursor"));
    }
    let bytes = BASE64
        .decode(cursor)
        .map_err(|e| QueryError::codec(format!("cursor is not valid base64: {e}")))?;
    let text = String::from_utf8(bytes)
        .map_err(|_| QueryError::codec("cursor does not decode to text"))?;

    let mut fields = text.split(SEPARATOR);
    match (fields.next(), fields.next(), fields.next()) {
        (Some(kind), Some(reference), None) => Ok((kind.to_string(), reference.to_string())),
        _ => Err(QueryError::codec(format!(
            "expected exactly two '{SEPARATOR}'-separated fields in cursor, got '{text}'"
        ))),
    }
}

/// Decode a cursor and parse its reference as a block number.
pub fn decode_position(cursor: &str) -> Result<u64, QueryError> {
    let (kind, reference) = decode(cursor)?;
    let position = reference.parse::<u64>().map_err(|_| {
        QueryError::codec(format!(
            "cursor reference '{reference}' (kind '{kind}') is not a block number"
        ))
    })?;
    tracing::trace!(%kind, position, "decoded cursor");
    Ok(position)
}
