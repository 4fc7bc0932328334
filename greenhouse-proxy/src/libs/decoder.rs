//! Decodes framed serial records into [`Measurement`]s.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::{Measurement, error::Error};

/// Parse one record. The record must be a JSON object; unknown fields are ignored and missing
/// fields are zero.
pub fn decode(line: &[u8]) -> Result<Measurement, Error> {
    let malformed = |source| Error::MalformedRecord {
        raw: raw_text(line),
        source,
    };
    let object: Map<String, Value> = serde_json::from_slice(line).map_err(malformed)?;
    Measurement::deserialize(Value::Object(object)).map_err(malformed)
}

/// Printable form of a record for diagnostics. Non UTF-8 bytes are shown as hexadecimal.
pub fn raw_text(line: &[u8]) -> String {
    match std::str::from_utf8(line) {
        Err(_) => format!("0x{}", hex::encode(line)),
        Ok(text) => text.to_string(),
    }
}
