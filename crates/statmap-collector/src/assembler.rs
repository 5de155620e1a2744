//! # Event assembly
//!
//! The second half of the mapping contract: merge the applier's normalized
//! output with a small set of manually extracted patches, stamp
//! capture/routing metadata, and produce the final event.
//!
//! Patches exist for data the schema language cannot express — a value
//! needing cross-field computation, or a rename outside the declarative
//! vocabulary. Unlike the applier's soft per-field errors, a patch that
//! cannot extract its value is a hard failure: an event whose
//! identity-bearing fields are absent is not worth shipping even partially.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use statmap_core::Document;

use crate::metadata::{EventMetadata, MetadataError};
use crate::routing::IndexRouter;

/// Hard assembly failure. No partial event is emitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    #[error("patch source '{path}' is missing or not extractable")]
    PatchFailure { path: String },
    #[error("patch target path cannot be empty")]
    EmptyPatchPath,
    #[error(transparent)]
    Metadata(#[from] MetadataError),
}

/// A manually supplied field written into the mapped document after schema
/// application. A later patch overwrites an earlier one (or a
/// schema-produced value) at the same path; callers own conflict-free
/// patch sets.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPatch {
    path: String,
    value: Value,
}

impl FieldPatch {
    pub fn new(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Extract a number at `source_path` from the raw document, truncate it
    /// to a 64-bit integer, and patch it in at `target_path`.
    pub fn int_at(
        source: &Document,
        source_path: &str,
        target_path: impl Into<String>,
    ) -> Result<Self, AssemblyError> {
        let number = required_f64(source, source_path)?;
        Ok(Self::new(target_path, number.trunc() as i64))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// Extract a required string from the raw document; absence or a
/// non-string value is a hard failure.
pub fn required_str(source: &Document, path: &str) -> Result<String, AssemblyError> {
    match source.get_path(path) {
        Some(Value::String(text)) => Ok(text.clone()),
        _ => Err(AssemblyError::PatchFailure {
            path: path.to_owned(),
        }),
    }
}

/// Extract a required number from the raw document; absence or a
/// non-numeric value is a hard failure.
pub fn required_f64(source: &Document, path: &str) -> Result<f64, AssemblyError> {
    match source.get_path(path) {
        Some(Value::Number(number)) => number.as_f64().ok_or(AssemblyError::PatchFailure {
            path: path.to_owned(),
        }),
        _ => Err(AssemblyError::PatchFailure {
            path: path.to_owned(),
        }),
    }
}

/// Final output document plus its destination index, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputEvent {
    pub root_fields: Document,
    pub index: String,
}

/// Merge the mapped payload with patches and metadata into an
/// [`OutputEvent`].
///
/// Metadata fields (`timestamp`, `interval_ms`, `type`, `cluster_uuid`) are
/// stamped at the document root, never inside the payload, keeping routing
/// metadata syntactically distinguishable from payload-derived data. The
/// payload itself lands under the metadata's event type key, with its own
/// capture timestamp.
pub fn assemble(
    mapped: Document,
    patches: &[FieldPatch],
    meta: &EventMetadata,
    router: &dyn IndexRouter,
) -> Result<OutputEvent, AssemblyError> {
    let mut payload = mapped;
    for patch in patches {
        if patch.path.is_empty() {
            return Err(AssemblyError::EmptyPatchPath);
        }
        payload.put_path(&patch.path, patch.value.clone());
    }
    payload.put_path("timestamp", meta.timestamp.format_rfc3339());

    let mut root_fields = Document::new();
    if let Some(cluster_uuid) = &meta.cluster_uuid {
        root_fields.insert("cluster_uuid", cluster_uuid.clone());
    }
    root_fields.insert("timestamp", meta.timestamp.format_rfc3339());
    root_fields.insert("interval_ms", meta.interval_ms);
    root_fields.insert("type", meta.event_type.clone());
    root_fields.insert(meta.event_type.clone(), Value::from(payload));

    Ok(OutputEvent {
        root_fields,
        index: router.route(meta),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::UtcDateTime;
    use crate::routing::StaticIndexRouter;
    use serde_json::json;

    fn raw() -> Document {
        let Value::Object(map) = json!({
            "cluster_uuid": "c1",
            "process": { "memory": { "resident_set_size_bytes": 123.9 } }
        }) else {
            panic!("raw payload must be an object");
        };
        Document::from(map)
    }

    fn meta() -> EventMetadata {
        EventMetadata::new(
            UtcDateTime::parse("2024-01-01T00:00:00Z").expect("must parse"),
            10_000,
            "kibana_stats",
        )
        .expect("metadata must be valid")
        .with_cluster_uuid("c1")
    }

    #[test]
    fn int_patch_truncates_extracted_number() {
        let patch = FieldPatch::int_at(
            &raw(),
            "process.memory.resident_set_size_bytes",
            "process.memory.resident_set_size_in_bytes",
        )
        .expect("patch must extract");
        assert_eq!(patch.value(), &json!(123));
    }

    #[test]
    fn int_patch_fails_on_missing_source() {
        let err = FieldPatch::int_at(&raw(), "process.cpu.total", "cpu_total")
            .expect_err("must fail");
        assert_eq!(
            err,
            AssemblyError::PatchFailure {
                path: "process.cpu.total".to_owned()
            }
        );
    }

    #[test]
    fn required_str_fails_on_wrong_kind() {
        let err = required_str(&raw(), "process.memory.resident_set_size_bytes")
            .expect_err("must fail");
        assert!(matches!(err, AssemblyError::PatchFailure { .. }));
    }

    #[test]
    fn assemble_stamps_metadata_at_root_only() {
        let mut mapped = Document::new();
        mapped.put_path("concurrent_connections", 12_i64);

        let event = assemble(mapped, &[], &meta(), &StaticIndexRouter::new("idx"))
            .expect("assembly must succeed");

        assert_eq!(event.index, "idx");
        assert_eq!(event.root_fields.get("cluster_uuid"), Some(&json!("c1")));
        assert_eq!(event.root_fields.get("interval_ms"), Some(&json!(10_000)));
        assert_eq!(event.root_fields.get("type"), Some(&json!("kibana_stats")));
        assert_eq!(
            event.root_fields.get_path("kibana_stats.concurrent_connections"),
            Some(&json!(12))
        );
        // Routing metadata is not duplicated inside the payload.
        assert!(!event.root_fields.contains_path("kibana_stats.interval_ms"));
    }

    #[test]
    fn assemble_applies_patches_last_write_wins() {
        let mut mapped = Document::new();
        mapped.put_path("status", "green");

        let patches = [
            FieldPatch::new("status", "yellow"),
            FieldPatch::new("status", "red"),
        ];
        let event = assemble(mapped, &patches, &meta(), &StaticIndexRouter::new("idx"))
            .expect("assembly must succeed");

        assert_eq!(
            event.root_fields.get_path("kibana_stats.status"),
            Some(&json!("red"))
        );
    }

    #[test]
    fn assemble_rejects_empty_patch_path() {
        let err = assemble(
            Document::new(),
            &[FieldPatch::new("", 1_i64)],
            &meta(),
            &StaticIndexRouter::new("idx"),
        )
        .expect_err("must fail");
        assert_eq!(err, AssemblyError::EmptyPatchPath);
    }

    #[test]
    fn payload_carries_its_own_capture_timestamp() {
        let event = assemble(Document::new(), &[], &meta(), &StaticIndexRouter::new("idx"))
            .expect("assembly must succeed");
        assert_eq!(
            event.root_fields.get_path("kibana_stats.timestamp"),
            Some(&json!("2024-01-01T00:00:00Z"))
        );
        assert_eq!(
            event.root_fields.get("timestamp"),
            Some(&json!("2024-01-01T00:00:00Z"))
        );
    }
}
