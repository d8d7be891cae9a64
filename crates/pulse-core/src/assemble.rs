//! Dashboard Assembler
//!
//! Runs the whole pipeline for one domain over one batch:
//! normalize → (rank) → bucket → classify → build rows → highlights → page.
//!
//! The assembler is stateless between calls. Everything relative (recency,
//! "3 days ago", stale thresholds) is computed against the caller's `now`,
//! so the same batch, request and config always produce the same envelope.

use std::collections::BTreeMap;

use tracing::info;

use crate::bucket::{apply_running_balance, bucket};
use crate::config::EngineConfig;
use crate::domains::profile_for;
use crate::error::Result;
use crate::format::Formatter;
use crate::highlights::{Aggregates, HighlightEngine};
use crate::models::{
    DashboardEnvelope, DashboardRow, Domain, DomainRecord, Granularity, Page, PageRequest,
    SourceBatch, Timestamp, Window,
};
use crate::normalize::normalize_batch;
use crate::ranking::{actor_leaderboard, by_activity_then_title, rank};
use crate::taxonomy::StatusTaxonomy;

/// What the caller wants to see
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardRequest {
    pub now: Timestamp,
    pub window: Window,
    pub query: Option<String>,
    pub page: PageRequest,
    /// Wallet balance at the close of the window, when known
    pub current_balance: Option<f64>,
}

impl DashboardRequest {
    pub fn new(now: Timestamp, window: Window) -> Self {
        Self {
            now,
            window,
            query: None,
            page: PageRequest::default(),
            current_balance: None,
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        let query = query.into();
        self.query = Some(query).filter(|q| !q.trim().is_empty());
        self
    }

    pub fn with_page(mut self, page: PageRequest) -> Self {
        self.page = page;
        self
    }

    pub fn with_balance(mut self, balance: f64) -> Self {
        self.current_balance = Some(balance);
        self
    }
}

/// Builds dashboard envelopes from raw batches
pub struct Assembler {
    config: EngineConfig,
    formatter: Formatter,
    taxonomies: BTreeMap<Domain, StatusTaxonomy>,
}

impl Assembler {
    /// Compile every domain's taxonomy with the configured aliases
    pub fn new(config: EngineConfig) -> Result<Self> {
        let mut taxonomies = BTreeMap::new();
        for domain in Domain::all() {
            let mut taxonomy = profile_for(*domain).taxonomy();
            if let Some(extra) = config.aliases_for(*domain) {
                taxonomy.extend_aliases(extra)?;
            }
            taxonomies.insert(*domain, taxonomy);
        }

        Ok(Self {
            formatter: Formatter::new(config.display.locale),
            config,
            taxonomies,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn formatter(&self) -> &Formatter {
        &self.formatter
    }

    pub fn taxonomy(&self, domain: Domain) -> Option<&StatusTaxonomy> {
        self.taxonomies.get(&domain)
    }

    /// The configured trailing window ending on `now`'s day
    pub fn default_window(&self, now: Timestamp) -> Window {
        let defaults = self.config.window;
        let buckets = match defaults.granularity {
            Granularity::Day => defaults.days,
            Granularity::Week => defaults.days.div_ceil(7),
        };
        Window::trailing(now, buckets, defaults.granularity)
    }

    /// A request using the configured window and page size
    pub fn request(&self, now: Timestamp) -> DashboardRequest {
        DashboardRequest::new(now, self.default_window(now)).with_page(self.config.page_request(1))
    }

    pub fn assemble(
        &self,
        domain: Domain,
        batch: &SourceBatch,
        request: &DashboardRequest,
    ) -> DashboardEnvelope {
        let profile = profile_for(domain);
        let fallback_taxonomy;
        let taxonomy = match self.taxonomies.get(&domain) {
            Some(t) => t,
            None => {
                fallback_taxonomy = profile.taxonomy();
                &fallback_taxonomy
            }
        };

        let records = normalize_batch(batch.rows(), profile.fields(), &self.config.normalize);
        let (view, scores) = self.order(domain, &records, request);

        let breakdown = profile.breakdown();
        let mut timeline = bucket(
            &view,
            &request.window,
            profile.metrics(),
            &self.formatter,
            |record| {
                let class = taxonomy.classify(breakdown.value(record));
                profile.contribute(record, class.key)
            },
        );

        let current_balance = if profile.tracks_balance() {
            let balance = request
                .current_balance
                .unwrap_or_else(|| ledger_balance(&records, &request.window));
            apply_running_balance(&mut timeline, &records, &request.window, balance);
            Some(balance)
        } else {
            request.current_balance
        };

        let statuses = taxonomy.summarize(view.iter().map(|r| breakdown.value(r)));

        let rows: Vec<DashboardRow> = view
            .iter()
            .zip(&scores)
            .map(|(record, score)| {
                let class = taxonomy.classify(breakdown.value(record));
                DashboardRow {
                    id: record.id.clone(),
                    title: record.display_title().to_string(),
                    status: class.key.to_string(),
                    status_label: class.label.to_string(),
                    tone: class.tone,
                    category: record.category.clone(),
                    owner: record.display_owner().map(String::from),
                    counterpart_id: record.counterpart_id.clone(),
                    amount: record.amount,
                    amount_display: self.formatter.currency(record.amount),
                    occurred_at: record.occurred_at,
                    updated_at: record.updated_at,
                    activity_display: self
                        .formatter
                        .relative_time(record.last_activity(), request.now),
                    score: *score,
                }
            })
            .collect();

        let actors = actor_leaderboard(&view, &self.formatter);

        let aggregates = Aggregates {
            domain,
            now: request.now,
            window: &request.window,
            formatter: &self.formatter,
            thresholds: &self.config.thresholds,
            batch_size: records.len(),
            timeline: &timeline,
            statuses: &statuses,
            rows: &rows,
            actors: &actors,
            current_balance,
            query: request.query.as_deref(),
        };

        let hero = profile.hero(&aggregates);
        let engine = HighlightEngine::with_rules(profile.rules(), self.config.display.highlight_cap);
        let highlights = engine.generate(&aggregates);

        info!(
            domain = %domain,
            source = %batch.tag(),
            records = records.len(),
            rows = rows.len(),
            highlights = highlights.len(),
            "Assembled dashboard"
        );

        DashboardEnvelope {
            domain,
            generated_at: request.now,
            source: batch.tag(),
            window: request.window,
            query: request.query.clone(),
            hero,
            timeline,
            statuses,
            highlights,
            rows: Page::from_slice(&rows, request.page),
        }
    }

    /// Display order for the batch, with relevance scores when ranked
    ///
    /// Search always ranks; other domains rank only when a query filters them.
    fn order(
        &self,
        domain: Domain,
        records: &[DomainRecord],
        request: &DashboardRequest,
    ) -> (Vec<DomainRecord>, Vec<Option<f64>>) {
        let query = request.query.as_deref().unwrap_or("");
        if domain == Domain::Search || !query.trim().is_empty() {
            rank(records, query, request.now, &self.config.search)
                .into_iter()
                .map(|s| (s.record.clone(), Some(s.score)))
                .unzip()
        } else {
            let mut sorted = records.to_vec();
            sorted.sort_by(by_activity_then_title);
            let scores = vec![None; sorted.len()];
            (sorted, scores)
        }
    }
}

/// Balance implied by the dated entries up to the window's end
///
/// Matches the entries `apply_running_balance` replays, so without an external
/// anchor the series starts from zero.
fn ledger_balance(records: &[DomainRecord], window: &Window) -> f64 {
    records
        .iter()
        .filter(|r| r.occurred_at.is_some_and(|at| at <= window.end))
        .map(|r| r.amount)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SourceTag, Tone};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    fn assembler() -> Assembler {
        Assembler::new(EngineConfig::default()).unwrap()
    }

    fn rows(value: serde_json::Value) -> Vec<crate::models::RawRow> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect()
    }

    #[test]
    fn test_default_window_covers_configured_days() {
        let asm = assembler();
        let window = asm.default_window(now());
        assert_eq!(window.bucket_count(), 30);
        assert!(window.contains(now()));
    }

    #[test]
    fn test_billing_rows_are_classified_and_ordered() {
        let asm = assembler();
        let batch = SourceBatch::Live(rows(json!([
            { "id": "a", "amount": "100", "status": "PAID", "issued_at": "2026-10-01T10:00:00Z" },
            { "id": "b", "amount": "50", "status": "past-due", "issued_at": "2026-10-10T10:00:00Z" },
            { "id": "c", "amount": "20", "status": "mystery", "issued_at": "2026-10-05T10:00:00Z" },
        ])));
        let request = asm.request(now());
        let envelope = asm.assemble(Domain::Billing, &batch, &request);

        let ids: Vec<&str> = envelope.rows.items.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
        assert_eq!(envelope.rows.items[0].status, "overdue");
        assert_eq!(envelope.rows.items[0].tone, Tone::Critical);
        assert_eq!(envelope.rows.items[1].status, "unknown");
        assert_eq!(envelope.source, SourceTag::Live);
        assert!(envelope.rows.items.iter().all(|r| r.score.is_none()));
    }

    #[test]
    fn test_configured_alias_reaches_classification() {
        let config = EngineConfig::parse(
            r#"
            [taxonomy.sessions]
            scheduled = ["agendado"]
            "#,
        )
        .unwrap();
        let asm = Assembler::new(config).unwrap();
        let batch = SourceBatch::Live(rows(json!([
            { "id": "s1", "status": "Agendado", "start_time": "2026-10-15T09:00:00Z" }
        ])));
        let envelope = asm.assemble(Domain::Sessions, &batch, &asm.request(now()));
        assert_eq!(envelope.rows.items[0].status, "scheduled");
    }

    #[test]
    fn test_bad_alias_key_is_rejected() {
        let config = EngineConfig::parse(
            r#"
            [taxonomy.billing]
            settled_later = ["x"]
            "#,
        )
        .unwrap();
        assert!(Assembler::new(config).is_err());
    }

    #[test]
    fn test_query_filters_other_domains() {
        let asm = assembler();
        let batch = SourceBatch::Live(rows(json!([
            { "id": "p1", "name": "Mobility reset", "status": "active", "created_at": "2026-10-01T00:00:00Z" },
            { "id": "p2", "name": "Strength base", "status": "active", "created_at": "2026-10-02T00:00:00Z" },
        ])));
        let request = asm.request(now()).with_query("mobility");
        let envelope = asm.assemble(Domain::Plans, &batch, &request);
        assert_eq!(envelope.rows.total, 1);
        assert_eq!(envelope.rows.items[0].id, "p1");
        assert!(envelope.rows.items[0].score.is_some());
    }

    #[test]
    fn test_default_balance_ignores_future_and_undated_entries() {
        let asm = assembler();
        let batch = SourceBatch::Live(rows(json!([
            { "id": "w1", "type": "credit", "amount": 50, "occurred_at": "2026-10-10T10:00:00Z" },
            { "id": "w2", "type": "debit", "amount": 20, "occurred_at": "2026-10-12T10:00:00Z" },
            { "id": "w3", "type": "credit", "amount": 300, "occurred_at": "2026-11-20T10:00:00Z" },
            { "id": "w4", "type": "credit", "amount": 100 },
        ])));
        let envelope = asm.assemble(Domain::Wallet, &batch, &asm.request(now()));

        let balances: Vec<f64> = envelope.timeline.iter().filter_map(|p| p.balance).collect();
        assert_eq!(balances.first(), Some(&0.0));
        assert_eq!(balances.last(), Some(&30.0));
    }
}
