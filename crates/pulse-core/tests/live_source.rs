//! Live data-source tests against the mock HTTP source
//!
//! Needs the `test-utils` feature: `cargo test -p pulse-core --features test-utils`.

use chrono::{TimeZone, Utc};
use serde_json::{json, Value};

use pulse_core::{
    source::fetch_or_fallback, test_utils::MockLiveSource, Assembler, Domain, EngineConfig,
    HttpSource, RawRow, SourceTag, Timestamp,
};

fn now() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
}

fn raw_rows(value: Value) -> Vec<RawRow> {
    value
        .as_array()
        .expect("rows must be an array")
        .iter()
        .map(|v| v.as_object().expect("row must be an object").clone())
        .collect()
}

fn assembler() -> Assembler {
    Assembler::new(EngineConfig::embedded().expect("embedded config parses"))
        .expect("embedded taxonomy compiles")
}

// =============================================================================
// Data Sources
// =============================================================================

#[tokio::test]
async fn test_live_source_round_trip() {
    let rows = raw_rows(json!([
        { "id": "s1", "status": "completed", "trainer_id": "t1", "start_time": "2026-10-14T07:00:00Z" },
        { "id": "s2", "status": "cancelled", "trainer_id": "t1", "start_time": "2026-10-15T07:00:00Z" },
    ]));
    let mock = MockLiveSource::start(Domain::Sessions, rows).await;
    let source = HttpSource::new(&mock.url(), None);

    let batch = fetch_or_fallback(&source, Domain::Sessions).await;
    assert_eq!(batch.tag(), SourceTag::Live);
    assert_eq!(batch.len(), 2);
    assert_eq!(mock.hits(), 1);

    let asm = assembler();
    let envelope = asm.assemble(Domain::Sessions, &batch, &asm.request(now()));
    assert_eq!(envelope.source, SourceTag::Live);
    // 1 of 2 cancelled is above the 20% threshold
    assert!(envelope
        .highlights
        .iter()
        .any(|h| h.id == "sessions-cancellation-rate"));
}

#[tokio::test]
async fn test_failing_source_falls_back_to_reference_data() {
    let mock = MockLiveSource::start_failing().await;
    let source = HttpSource::new(&mock.url(), None);

    let batch = fetch_or_fallback(&source, Domain::Billing).await;
    assert_eq!(batch.tag(), SourceTag::Fallback);
    assert!(!batch.is_empty());

    let asm = assembler();
    let envelope = asm.assemble(Domain::Billing, &batch, &asm.request(now()));
    assert_eq!(envelope.source, SourceTag::Fallback);
    assert!(envelope.rows.total > 0);
}

#[tokio::test]
async fn test_api_key_is_sent() {
    let mock = MockLiveSource::builder()
        .with_rows(Domain::Plans, raw_rows(json!([{ "id": "p1" }])))
        .with_api_key("secret")
        .start()
        .await;

    let without = fetch_or_fallback(&HttpSource::new(&mock.url(), None), Domain::Plans).await;
    assert_eq!(without.tag(), SourceTag::Fallback);

    let with = fetch_or_fallback(&HttpSource::new(&mock.url(), Some("secret")), Domain::Plans).await;
    assert_eq!(with.tag(), SourceTag::Live);
    assert_eq!(with.len(), 1);
}
