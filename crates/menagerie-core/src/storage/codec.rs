//! Row encoding for storage.

use crate::error::Error;
use crate::value::Row;

/// Encode a row for storage.
pub fn encode_row(row: &Row) -> Result<Vec<u8>, Error> {
    Ok(serde_json::to_vec(row)?)
}

/// Decode a stored row.
pub fn decode_row(bytes: &[u8]) -> Result<Row, Error> {
    Ok(serde_json::from_slice(bytes)?)
}
