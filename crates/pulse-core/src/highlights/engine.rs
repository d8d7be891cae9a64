//! Highlight Engine - runs rules against computed aggregates

use crate::config::{Thresholds, MAX_HIGHLIGHTS, MIN_HIGHLIGHTS};
use crate::format::Formatter;
use crate::models::{
    ActorStat, DashboardRow, Domain, Highlight, StatusSegment, Timestamp, TimelinePoint, Tone,
    Window,
};

/// Id of the highlight emitted when no rule fires
pub const NOTHING_NOTABLE: &str = "nothing-notable";

/// Everything a rule may look at
///
/// Rules never see raw records, only what the dashboard itself shows.
pub struct Aggregates<'a> {
    pub domain: Domain,
    pub now: Timestamp,
    pub window: &'a Window,
    pub formatter: &'a Formatter,
    pub thresholds: &'a Thresholds,
    /// Records in the normalized batch, before any search filtering
    pub batch_size: usize,
    pub timeline: &'a [TimelinePoint],
    pub statuses: &'a [StatusSegment],
    /// Every row behind the dashboard, in display order
    pub rows: &'a [DashboardRow],
    pub actors: &'a [ActorStat],
    pub current_balance: Option<f64>,
    pub query: Option<&'a str>,
}

impl Aggregates<'_> {
    /// Records counted under a status key
    pub fn status_count(&self, key: &str) -> usize {
        self.statuses
            .iter()
            .filter(|s| s.key == key)
            .map(|s| s.count)
            .sum()
    }

    /// Records counted across all segments
    pub fn status_total(&self) -> usize {
        self.statuses.iter().map(|s| s.count).sum()
    }

    /// Rows whose canonical status is `key`
    pub fn rows_with_status<'s>(&'s self, key: &'s str) -> impl Iterator<Item = &'s DashboardRow> {
        self.rows.iter().filter(move |r| r.status == key)
    }

    /// Sum of a timeline metric across the whole window
    pub fn metric_total(&self, name: &str) -> f64 {
        self.timeline.iter().map(|p| p.metric(name)).sum()
    }

    /// Share of `part` in `whole` as a percentage, `None` when `whole` is zero
    pub fn rate(part: usize, whole: usize) -> Option<f64> {
        (whole > 0).then(|| part as f64 * 100.0 / whole as f64)
    }
}

/// A single highlight rule
pub trait HighlightRule: Send + Sync {
    /// Stable identifier, also used as the highlight id
    fn id(&self) -> &'static str;

    /// Higher runs first; equal priorities keep registration order
    fn priority(&self) -> u8;

    /// Emit at most one highlight
    fn evaluate(&self, ctx: &Aggregates<'_>) -> Option<Highlight>;
}

/// Ordered rule registry with an output cap
pub struct HighlightEngine {
    rules: Vec<Box<dyn HighlightRule>>,
    cap: usize,
}

impl HighlightEngine {
    /// Create an engine returning at most `cap` highlights (clamped to 4..=6)
    pub fn new(cap: usize) -> Self {
        Self {
            rules: vec![],
            cap: cap.clamp(MIN_HIGHLIGHTS, MAX_HIGHLIGHTS),
        }
    }

    pub fn with_rules(rules: Vec<Box<dyn HighlightRule>>, cap: usize) -> Self {
        let mut engine = Self::new(cap);
        for rule in rules {
            engine.register(rule);
        }
        engine
    }

    /// Register a rule after the existing ones
    pub fn register(&mut self, rule: Box<dyn HighlightRule>) {
        self.rules.push(rule);
    }

    pub fn rule_ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.id()).collect()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Run every rule, order by declared priority and truncate to the cap
    ///
    /// Never returns an empty list.
    pub fn generate(&self, ctx: &Aggregates<'_>) -> Vec<Highlight> {
        let mut fired: Vec<(u8, Highlight)> = self
            .rules
            .iter()
            .filter_map(|rule| {
                let highlight = rule.evaluate(ctx)?;
                tracing::debug!(rule = rule.id(), "Highlight rule fired");
                Some((rule.priority(), highlight))
            })
            .collect();

        // sort_by is stable: equal priorities keep registration order
        fired.sort_by(|a, b| b.0.cmp(&a.0));

        let mut highlights: Vec<Highlight> = fired
            .into_iter()
            .take(self.cap)
            .map(|(_, highlight)| highlight)
            .collect();

        if highlights.is_empty() {
            highlights.push(nothing_notable());
        }

        highlights
    }
}

pub fn nothing_notable() -> Highlight {
    Highlight::new(
        NOTHING_NOTABLE,
        Tone::Positive,
        "All clear",
        "Nothing in this period needs your attention.",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Granularity;
    use chrono::{TimeZone, Utc};

    struct Fixed {
        id: &'static str,
        priority: u8,
        fires: bool,
    }

    impl HighlightRule for Fixed {
        fn id(&self) -> &'static str {
            self.id
        }

        fn priority(&self) -> u8 {
            self.priority
        }

        fn evaluate(&self, _ctx: &Aggregates<'_>) -> Option<Highlight> {
            self.fires
                .then(|| Highlight::new(self.id, Tone::Neutral, self.id, "fired"))
        }
    }

    fn rule(id: &'static str, priority: u8, fires: bool) -> Box<dyn HighlightRule> {
        Box::new(Fixed { id, priority, fires })
    }

    fn with_ctx<T>(f: impl FnOnce(&Aggregates<'_>) -> T) -> T {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        let window = Window::trailing(now, 7, Granularity::Day);
        let formatter = Formatter::default();
        let thresholds = Thresholds::default();
        let ctx = Aggregates {
            domain: Domain::Billing,
            now,
            window: &window,
            formatter: &formatter,
            thresholds: &thresholds,
            batch_size: 0,
            timeline: &[],
            statuses: &[],
            rows: &[],
            actors: &[],
            current_balance: None,
            query: None,
        };
        f(&ctx)
    }

    #[test]
    fn test_priority_order_with_declaration_ties() {
        let engine = HighlightEngine::with_rules(
            vec![
                rule("low", 10, true),
                rule("tie-first", 50, true),
                rule("high", 90, true),
                rule("tie-second", 50, true),
            ],
            6,
        );
        let ids: Vec<String> = with_ctx(|ctx| engine.generate(ctx))
            .into_iter()
            .map(|h| h.id)
            .collect();
        assert_eq!(ids, vec!["high", "tie-first", "tie-second", "low"]);
    }

    #[test]
    fn test_truncates_to_cap() {
        let rules = (0..8)
            .map(|i| rule(["a", "b", "c", "d", "e", "f", "g", "h"][i], 50, true))
            .collect();
        let engine = HighlightEngine::with_rules(rules, 5);
        let highlights = with_ctx(|ctx| engine.generate(ctx));
        assert_eq!(highlights.len(), 5);
        assert_eq!(highlights[4].id, "e");
    }

    #[test]
    fn test_cap_is_clamped() {
        assert_eq!(HighlightEngine::new(1).cap(), MIN_HIGHLIGHTS);
        assert_eq!(HighlightEngine::new(10).cap(), MAX_HIGHLIGHTS);
    }

    #[test]
    fn test_nothing_notable_when_silent() {
        let engine = HighlightEngine::with_rules(vec![rule("quiet", 50, false)], 4);
        let highlights = with_ctx(|ctx| engine.generate(ctx));
        assert_eq!(highlights.len(), 1);
        assert_eq!(highlights[0].id, NOTHING_NOTABLE);
        assert_eq!(highlights[0].tone, Tone::Positive);
    }
}
