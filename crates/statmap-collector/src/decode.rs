use serde_json::Value;

use statmap_core::{value_kind, Document};

use crate::report::CollectError;

/// Decode a raw payload body into a [`Document`].
///
/// Failure is hard and surfaced unmodified — there is no partial decode.
pub fn decode_document(bytes: &[u8]) -> Result<Document, CollectError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|error| CollectError::Decode(error.to_string()))?;

    match value {
        Value::Object(map) => Ok(Document::from(map)),
        other => Err(CollectError::Decode(format!(
            "expected a document at the top level, found {}",
            value_kind(&other)
        ))),
    }
}
