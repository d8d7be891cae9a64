//! Integration tests for pulse-core
//!
//! These tests exercise the full fetch → normalize → assemble workflow.

use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};

use pulse_core::{
    bucket::bucket,
    highlights::NOTHING_NOTABLE,
    models::{Highlight, RawRow},
    normalize::{normalize_batch, tokenize},
    ranking::{rank, ScoringWeights},
    taxonomy::{StatusTaxonomy, UNKNOWN_KEY},
    Aggregates, Assembler, DashboardRequest, Domain, DomainRecord, EngineConfig, Formatter, Granularity,
    HighlightEngine, HighlightRule, PageRequest, SourceBatch, Timestamp,
    Tone, Window,
};

fn now() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
}

fn day(d: u32) -> Timestamp {
    Utc.with_ymd_and_hms(2026, 10, d, 0, 0, 0).unwrap()
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
// Worked Scenarios
// =============================================================================

#[test]
fn test_wallet_running_balance_reproduces_anchor() {
    let asm = assembler();
    let batch = SourceBatch::Live(raw_rows(json!([
        { "id": "w1", "type": "credit", "amount": "50.00", "status": "completed", "occurred_at": "2026-10-10T10:00:00Z" },
        { "id": "w2", "type": "debit", "amount": "20.00", "status": "completed", "occurred_at": "2026-10-11T10:00:00Z" },
        { "id": "w3", "type": "credit", "amount": "10.00", "status": "completed", "occurred_at": "2026-10-12T10:00:00Z" },
    ])));
    let window = Window::new(day(10), day(13), Granularity::Day);
    let request = DashboardRequest::new(day(12) + Duration::hours(12), window).with_balance(40.0);

    let envelope = asm.assemble(Domain::Wallet, &batch, &request);

    let balances: Vec<Option<f64>> = envelope.timeline.iter().map(|p| p.balance).collect();
    assert_eq!(balances, vec![Some(50.0), Some(30.0), Some(40.0)]);

    let debits: Vec<f64> = envelope.timeline.iter().map(|p| p.metric("debit")).collect();
    assert_eq!(debits, vec![0.0, 20.0, 0.0]);

    // 40 is below the default low-balance threshold of 50
    assert_eq!(envelope.highlights[0].id, "wallet-low-balance");
    assert_eq!(envelope.highlights[0].tone, Tone::Critical);
}

#[test]
fn test_unrecognized_status_lands_in_unknown() {
    let taxonomy = StatusTaxonomy::new()
        .entry("scheduled", "Scheduled", Tone::Neutral, &[])
        .entry("confirmed", "Confirmed", Tone::Positive, &[])
        .entry("cancelled", "Cancelled", Tone::Warning, &[]);

    let segments = taxonomy.summarize([Some("scheduled"), Some("Scheduled"), Some("AGENDADO-TYPO")]);

    let counts: Vec<(&str, usize)> = segments.iter().map(|s| (s.key.as_str(), s.count)).collect();
    assert_eq!(counts, vec![("scheduled", 2), (UNKNOWN_KEY, 1)]);
    assert_eq!(segments.iter().map(|s| s.percentage).sum::<u32>(), 100);
}

#[test]
fn test_empty_batch_for_every_domain() {
    let asm = assembler();
    let request = asm.request(now());
    let expected_buckets = request.window.bucket_count();

    for domain in Domain::all() {
        let envelope = asm.assemble(*domain, &SourceBatch::Live(vec![]), &request);

        assert_eq!(envelope.timeline.len(), expected_buckets, "{}", domain);
        assert!(envelope
            .timeline
            .iter()
            .all(|p| !p.metrics.is_empty() && p.metrics.values().all(|v| *v == 0.0)));

        assert_eq!(envelope.statuses.len(), 1, "{}", domain);
        assert_eq!(envelope.statuses[0].key, UNKNOWN_KEY);
        assert_eq!(envelope.statuses[0].count, 0);

        assert_eq!(envelope.highlights.len(), 1, "{}", domain);
        assert_eq!(envelope.highlights[0].id, NOTHING_NOTABLE);

        assert!(!envelope.hero.is_empty());
        assert_eq!(envelope.rows.total, 0);
    }
}

// =============================================================================
// Pipeline Properties
// =============================================================================

#[test]
fn test_assembly_is_idempotent() {
    let asm = assembler();
    for domain in Domain::all() {
        let batch = SourceBatch::Fallback(pulse_core::fallback_rows(*domain));
        let request = asm.request(now()).with_query("ana");

        let first = asm.assemble(*domain, &batch, &request);
        let second = asm.assemble(*domain, &batch, &request);

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}

#[test]
fn test_grid_is_complete_regardless_of_records() {
    let formatter = Formatter::default();
    let records = normalize_batch(
        &raw_rows(json!([
            { "id": "far-past", "start_time": "2020-01-01T00:00:00Z" },
            { "id": "far-future", "start_time": "2030-01-01T00:00:00Z" },
            { "id": "undated" },
        ])),
        pulse_core::profile_for(Domain::Sessions).fields(),
        &Default::default(),
    );

    let cases = [
        (day(1), day(16), Granularity::Day, 15),
        (day(1), day(16) + Duration::hours(1), Granularity::Day, 16),
        (day(1), day(29), Granularity::Week, 4),
        (day(1), day(30), Granularity::Week, 5),
        (day(5), day(5), Granularity::Day, 1),
    ];

    let empty: Vec<DomainRecord> = vec![];

    for (start, end, granularity, expected) in cases {
        let window = Window::new(start, end, granularity);
        for batch in [records.as_slice(), empty.as_slice()] {
            let points = bucket(batch, &window, &["total"], &formatter, |_| vec![("total", 1.0)]);
            assert_eq!(points.len(), expected);
            assert!(points.iter().all(|p| p.metric("total") == 0.0));
        }
    }
}

#[test]
fn test_status_percentages_close_to_100() {
    let asm = assembler();
    let batch = SourceBatch::Live(raw_rows(json!([
        { "id": "1", "status": "paid" },
        { "id": "2", "status": "paid" },
        { "id": "3", "status": "pending" },
        { "id": "4", "status": "overdue" },
        { "id": "5", "status": "void" },
        { "id": "6", "status": "???" },
        { "id": "7", "status": "refunded" },
    ])));
    let envelope = asm.assemble(Domain::Billing, &batch, &asm.request(now()));

    let total: usize = envelope.statuses.iter().map(|s| s.count).sum();
    let pct: u32 = envelope.statuses.iter().map(|s| s.percentage).sum();
    assert_eq!(total, 7);
    assert_eq!(pct, 100);
    assert_eq!(envelope.statuses.last().unwrap().key, UNKNOWN_KEY);
}

#[test]
fn test_ranking_is_deterministic_with_tie_breaks() {
    let records = normalize_batch(
        &raw_rows(json!([
            { "id": "b", "entity_type": "client", "name": "Ana Beatriz", "updated_at": "2026-10-01T00:00:00Z" },
            { "id": "a", "entity_type": "client", "name": "Ana Alves", "updated_at": "2026-10-01T00:00:00Z" },
            { "id": "c", "entity_type": "client", "name": "Ana Costa", "updated_at": "2026-10-14T00:00:00Z" },
            { "id": "d", "entity_type": "plan", "name": "Banana bread", "updated_at": "2026-10-15T00:00:00Z" },
        ])),
        pulse_core::profile_for(Domain::Search).fields(),
        &Default::default(),
    );
    let weights = ScoringWeights::default();

    let first: Vec<&str> = rank(&records, "ana", now(), &weights)
        .iter()
        .map(|s| s.record.id.as_str())
        .collect();
    for _ in 0..5 {
        let again: Vec<&str> = rank(&records, "ana", now(), &weights)
            .iter()
            .map(|s| s.record.id.as_str())
            .collect();
        assert_eq!(first, again);
    }

    // c is more recent; a and b tie on score and activity, so title decides
    assert_eq!(&first[..3], &["c", "a", "b"]);
    assert_eq!(tokenize("Ana"), vec!["ana"]);
}

#[test]
fn test_equal_priorities_keep_declaration_order() {
    struct Always(&'static str);

    impl HighlightRule for Always {
        fn id(&self) -> &'static str {
            self.0
        }

        fn priority(&self) -> u8 {
            50
        }

        fn evaluate(&self, _ctx: &Aggregates<'_>) -> Option<Highlight> {
            Some(Highlight::new(self.0, Tone::Neutral, self.0, ""))
        }
    }

    let rules: Vec<Box<dyn HighlightRule>> = ["first", "second", "third", "fourth", "fifth"]
        .into_iter()
        .map(|id| Box::new(Always(id)) as Box<dyn HighlightRule>)
        .collect();
    let engine = HighlightEngine::with_rules(rules, 4);

    let config = EngineConfig::default();
    let formatter = Formatter::default();
    let window = Window::trailing(now(), 7, Granularity::Day);
    let ctx = Aggregates {
        domain: Domain::Billing,
        now: now(),
        window: &window,
        formatter: &formatter,
        thresholds: &config.thresholds,
        batch_size: 0,
        timeline: &[],
        statuses: &[],
        rows: &[],
        actors: &[],
        current_balance: None,
        query: None,
    };

    let ids: Vec<String> = engine.generate(&ctx).into_iter().map(|h| h.id).collect();
    assert_eq!(ids, vec!["first", "second", "third", "fourth"]);
}

#[test]
fn test_pagination_slices_ordered_rows() {
    let asm = assembler();
    let rows: Vec<Value> = (1..=45)
        .map(|i| json!({ "id": format!("inv-{:02}", i), "amount": i, "status": "paid", "issued_at": format!("2026-10-{:02}T10:00:00Z", (i % 15) + 1) }))
        .collect();
    let batch = SourceBatch::Live(raw_rows(Value::Array(rows)));

    let request = asm.request(now()).with_page(PageRequest::new(3, 20));
    let envelope = asm.assemble(Domain::Billing, &batch, &request);

    assert_eq!(envelope.rows.total, 45);
    assert_eq!(envelope.rows.total_pages, 3);
    assert_eq!(envelope.rows.items.len(), 5);
}
