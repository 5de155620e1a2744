//! End-to-end collection-cycle suite: schema application, manual patching,
//! metadata stamping, routing, reporting, and dispatch composed together.

use std::sync::{Arc, LazyLock};

use serde_json::json;
use statmap_collector::{
    required_str, AssemblyError, CollectError, Collector, EventMetadata, FieldPatch,
    MemoryDispatcher, MonitoringIndexRouter, RecordingReporter, StatsModule, UtcDateTime,
};
use statmap_core::schema::{dict, int};
use statmap_core::{Document, Schema};
use statmap_tests::document;

/// Schema deliberately containing no rule for
/// `resident_set_size_bytes` — that field travels via a manual patch.
static KIBANA_STATS_SCHEMA: LazyLock<Schema> = LazyLock::new(|| {
    Schema::builder()
        .field(
            "process",
            dict(
                "process",
                Schema::builder()
                    .field(
                        "memory",
                        dict("memory", Schema::default()).optional(),
                    )
                    .build()
                    .expect("process schema must build"),
            )
            .optional(),
        )
        .field("concurrent_connections", int("concurrent_connections").optional())
        .build()
        .expect("kibana stats schema must build")
});

struct KibanaStatsModule;

impl StatsModule for KibanaStatsModule {
    fn schema(&self) -> &Schema {
        &KIBANA_STATS_SCHEMA
    }

    fn metadata(&self, raw: &Document) -> Result<EventMetadata, AssemblyError> {
        let cluster_uuid = required_str(raw, "cluster_uuid")?;
        Ok(EventMetadata::new(
            UtcDateTime::parse("2024-01-01T00:00:00Z").expect("timestamp must parse"),
            10_000,
            "kibana_stats",
        )?
        .with_cluster_uuid(cluster_uuid))
    }

    fn patches(&self, raw: &Document) -> Result<Vec<FieldPatch>, AssemblyError> {
        Ok(vec![FieldPatch::int_at(
            raw,
            "process.memory.resident_set_size_bytes",
            "process.memory.resident_set_size_in_bytes",
        )?])
    }
}

fn collector() -> (Collector, Arc<RecordingReporter>, Arc<MemoryDispatcher>) {
    let reporter = Arc::new(RecordingReporter::new());
    let dispatcher = Arc::new(MemoryDispatcher::new());
    let collector = Collector::new(
        reporter.clone(),
        dispatcher.clone(),
        Arc::new(MonitoringIndexRouter::new("kibana", 7)),
    );
    (collector, reporter, dispatcher)
}

#[test]
fn schema_patch_metadata_composition_contract() {
    let (collector, reporter, dispatcher) = collector();
    let body = json!({
        "cluster_uuid": "c1",
        "process": { "memory": { "resident_set_size_bytes": 123.0 } }
    })
    .to_string();

    let event = collector
        .collect(&KibanaStatsModule, body.as_bytes())
        .expect("cycle must succeed");

    let root = &event.root_fields;
    assert_eq!(root.get("cluster_uuid"), Some(&json!("c1")));
    assert_eq!(root.get("interval_ms"), Some(&json!(10_000)));
    assert_eq!(root.get("type"), Some(&json!("kibana_stats")));
    assert_eq!(
        root.get_path("kibana_stats.process.memory.resident_set_size_in_bytes"),
        Some(&json!(123))
    );
    assert_eq!(root.get("timestamp"), Some(&json!("2024-01-01T00:00:00Z")));
    assert_eq!(event.index, ".monitoring-kibana-7");

    assert!(reporter.is_empty());
    assert_eq!(dispatcher.take(), vec![event]);
}

#[test]
fn patch_overrides_schema_produced_value() {
    let (collector, _reporter, _dispatcher) = collector();
    // The schema maps process.memory as an (empty) sub-document; the patch
    // writes into the same subtree afterwards.
    let body = json!({
        "cluster_uuid": "c1",
        "concurrent_connections": 5,
        "process": { "memory": { "resident_set_size_bytes": 9.9 } }
    })
    .to_string();

    let event = collector
        .collect(&KibanaStatsModule, body.as_bytes())
        .expect("cycle must succeed");

    assert_eq!(
        event
            .root_fields
            .get_path("kibana_stats.process.memory.resident_set_size_in_bytes"),
        Some(&json!(9))
    );
    assert_eq!(
        event
            .root_fields
            .get_path("kibana_stats.concurrent_connections"),
        Some(&json!(5))
    );
}

#[test]
fn unextractable_patch_produces_no_event() {
    let (collector, reporter, dispatcher) = collector();
    let body = json!({ "cluster_uuid": "c1", "process": {} }).to_string();

    let err = collector
        .collect(&KibanaStatsModule, body.as_bytes())
        .expect_err("must fail");

    assert!(matches!(err, CollectError::Assembly(_)));
    assert!(err.is_hard());
    assert!(dispatcher.is_empty());
    let entries = reporter.take();
    assert_eq!(
        entries.last().map(|entry| entry.code),
        Some("collect.assembly_failure")
    );
}

#[test]
fn missing_cluster_uuid_produces_no_event() {
    let (collector, _reporter, dispatcher) = collector();
    let body = json!({
        "process": { "memory": { "resident_set_size_bytes": 123.0 } }
    })
    .to_string();

    let err = collector
        .collect(&KibanaStatsModule, body.as_bytes())
        .expect_err("must fail");

    assert!(matches!(err, CollectError::Assembly(_)));
    assert!(dispatcher.is_empty());
}

#[test]
fn malformed_body_fails_hard_before_any_mapping() {
    let (collector, reporter, dispatcher) = collector();

    let err = collector
        .collect(&KibanaStatsModule, b"not-json")
        .expect_err("must fail");

    assert!(matches!(err, CollectError::Decode(_)));
    assert_eq!(reporter.take().len(), 1);
    assert!(dispatcher.is_empty());
}

#[test]
fn failing_cycle_leaves_no_state_for_the_next() {
    let (collector, reporter, dispatcher) = collector();

    let _ = collector.collect(&KibanaStatsModule, b"not-json");
    reporter.take();

    let body = json!({
        "cluster_uuid": "c1",
        "process": { "memory": { "resident_set_size_bytes": 123.0 } }
    })
    .to_string();
    collector
        .collect(&KibanaStatsModule, body.as_bytes())
        .expect("subsequent cycle must succeed");

    assert!(reporter.is_empty());
    assert_eq!(dispatcher.len(), 1);
}

#[test]
fn assemble_standalone_matches_collector_output() {
    // Exercise the two public entry points directly, without the cycle.
    let raw = document(json!({
        "cluster_uuid": "c1",
        "process": { "memory": { "resident_set_size_bytes": 123.0 } }
    }));

    let mapping = KIBANA_STATS_SCHEMA.apply(&raw);
    assert!(mapping.is_complete());

    let module = KibanaStatsModule;
    let meta = module.metadata(&raw).expect("metadata must extract");
    let patches = module.patches(&raw).expect("patches must extract");

    let event = statmap_collector::assemble(
        mapping.output,
        &patches,
        &meta,
        &MonitoringIndexRouter::new("kibana", 7),
    )
    .expect("assembly must succeed");

    assert_eq!(
        event
            .root_fields
            .get_path("kibana_stats.process.memory.resident_set_size_in_bytes"),
        Some(&json!(123))
    );
}
