//! Relevance scoring and actor ranking
//!
//! Search results are scored from scratch on every call: a base score, token
//! matches against the query, a recency bonus and a fixed per-category bias.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::format::Formatter;
use crate::models::{ActorStat, DomainRecord, Timestamp};
use crate::normalize::tokenize;

/// One step of the recency table: activity at most `max_days` old earns
/// `bonus`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecencyTier {
    pub max_days: f64,
    pub bonus: f64,
}

/// Weights used by [`score`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub base: f64,
    pub exact: f64,
    pub prefix: f64,
    pub substring: f64,
    /// Checked in order; the first tier the age fits in applies
    pub recency: Vec<RecencyTier>,
    /// Keyed by lower-cased category
    pub category_weights: BTreeMap<String, f64>,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        let category_weights = [
            ("client", 2.0),
            ("trainer", 2.0),
            ("admin", 2.0),
            ("plan", 1.0),
            ("session", 0.5),
            ("invoice", 0.5),
            ("event", 0.5),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            base: 1.0,
            exact: 6.0,
            prefix: 4.0,
            substring: 2.0,
            recency: vec![
                RecencyTier { max_days: 1.0, bonus: 4.0 },
                RecencyTier { max_days: 7.0, bonus: 3.0 },
                RecencyTier { max_days: 30.0, bonus: 1.5 },
                RecencyTier { max_days: 60.0, bonus: 1.0 },
            ],
            category_weights,
        }
    }
}

/// Sum over query tokens of the best match each finds in the record
///
/// Exact beats prefix beats substring; a query token that matches nothing
/// adds nothing.
pub fn token_score(record: &DomainRecord, query: &[String], weights: &ScoringWeights) -> f64 {
    query
        .iter()
        .map(|q| {
            record
                .search_tokens
                .iter()
                .map(|t| {
                    if t == q {
                        weights.exact
                    } else if t.starts_with(q.as_str()) {
                        weights.prefix
                    } else if t.contains(q.as_str()) {
                        weights.substring
                    } else {
                        0.0
                    }
                })
                .fold(0.0, f64::max)
        })
        .sum()
}

/// Bonus for recent activity; future activity counts as brand new
pub fn recency_bonus(activity: Option<Timestamp>, now: Timestamp, weights: &ScoringWeights) -> f64 {
    let Some(at) = activity else {
        return 0.0;
    };
    let age_days = ((now - at).num_seconds() as f64 / 86_400.0).max(0.0);
    weights
        .recency
        .iter()
        .find(|tier| age_days <= tier.max_days)
        .map(|tier| tier.bonus)
        .unwrap_or(0.0)
}

pub fn category_weight(category: Option<&str>, weights: &ScoringWeights) -> f64 {
    category
        .map(|c| c.trim().to_lowercase())
        .and_then(|c| weights.category_weights.get(&c).copied())
        .unwrap_or(0.0)
}

/// Full relevance score of one record
pub fn score(
    record: &DomainRecord,
    query: &[String],
    now: Timestamp,
    weights: &ScoringWeights,
) -> f64 {
    weights.base
        + token_score(record, query, weights)
        + recency_bonus(record.last_activity(), now, weights)
        + category_weight(record.category.as_deref(), weights)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scored<'a> {
    pub record: &'a DomainRecord,
    pub score: f64,
}

/// Score and sort records for `query`
///
/// A blank query keeps every record (browse mode). Otherwise records that
/// match no query token are dropped.
pub fn rank<'a>(
    records: &'a [DomainRecord],
    query: &str,
    now: Timestamp,
    weights: &ScoringWeights,
) -> Vec<Scored<'a>> {
    let tokens = tokenize(query);

    let mut scored: Vec<Scored<'a>> = records
        .iter()
        .filter(|r| tokens.is_empty() || token_score(r, &tokens, weights) > 0.0)
        .map(|record| Scored {
            record,
            score: score(record, &tokens, now, weights),
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| by_activity_then_title(a.record, b.record))
    });
    scored
}

/// Most recent activity first (undated last), then title, then id
pub fn by_activity_then_title(a: &DomainRecord, b: &DomainRecord) -> Ordering {
    let activity = match (a.last_activity(), b.last_activity()) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    activity
        .then_with(|| {
            a.display_title()
                .to_lowercase()
                .cmp(&b.display_title().to_lowercase())
        })
        .then_with(|| a.id.cmp(&b.id))
}

/// Tally records per owner: most records first, then largest total amount,
/// then owner id
pub fn actor_leaderboard(records: &[DomainRecord], formatter: &Formatter) -> Vec<ActorStat> {
    let mut tally: BTreeMap<&str, (Option<&str>, usize, f64)> = BTreeMap::new();
    for record in records {
        let Some(owner) = record.owner_id.as_deref() else {
            continue;
        };
        let entry = tally.entry(owner).or_insert((None, 0, 0.0));
        if entry.0.is_none() {
            entry.0 = record.owner_label.as_deref();
        }
        entry.1 += 1;
        entry.2 += record.amount;
    }

    let mut actors: Vec<ActorStat> = tally
        .into_iter()
        .map(|(id, (label, count, amount))| ActorStat {
            actor_id: id.to_string(),
            label: label.unwrap_or(id).to_string(),
            count,
            amount,
            amount_display: formatter.currency(amount),
        })
        .collect();

    actors.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| b.amount.total_cmp(&a.amount))
            .then_with(|| a.actor_id.cmp(&b.actor_id))
    });
    actors
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    fn record(id: &str, title: &str, category: &str, days_ago: Option<i64>) -> DomainRecord {
        DomainRecord {
            id: id.to_string(),
            occurred_at: days_ago.map(|d| now() - Duration::days(d)),
            updated_at: None,
            amount: 0.0,
            status: None,
            category: Some(category.to_string()),
            owner_id: None,
            owner_label: None,
            counterpart_id: None,
            title: Some(title.to_string()),
            search_tokens: tokenize(title),
        }
    }

    #[test]
    fn test_match_strength() {
        let weights = ScoringWeights::default();
        let r = record("1", "Ana Souza", "client", None);
        let q = |s: &str| tokenize(s);

        assert_eq!(token_score(&r, &q("ana"), &weights), 6.0);
        assert_eq!(token_score(&r, &q("sou"), &weights), 4.0);
        assert_eq!(token_score(&r, &q("uza"), &weights), 2.0);
        assert_eq!(token_score(&r, &q("ana souza"), &weights), 12.0);
        assert_eq!(token_score(&r, &q("bruno"), &weights), 0.0);
    }

    #[test]
    fn test_recency_tiers() {
        let weights = ScoringWeights::default();
        let bonus = |days: i64| recency_bonus(Some(now() - Duration::days(days)), now(), &weights);
        assert_eq!(bonus(0), 4.0);
        assert_eq!(bonus(1), 4.0);
        assert_eq!(bonus(5), 3.0);
        assert_eq!(bonus(30), 1.5);
        assert_eq!(bonus(45), 1.0);
        assert_eq!(bonus(120), 0.0);
        assert_eq!(recency_bonus(Some(now() + Duration::days(3)), now(), &weights), 4.0);
        assert_eq!(recency_bonus(None, now(), &weights), 0.0);
    }

    #[test]
    fn test_score_components() {
        let weights = ScoringWeights::default();
        let r = record("1", "Ana Souza", "Client", Some(3));
        // base 1 + exact 6 + recency 3 + people 2
        assert_eq!(score(&r, &tokenize("ana"), now(), &weights), 12.0);
    }

    #[test]
    fn test_empty_query_browses_everything() {
        let weights = ScoringWeights::default();
        let records = vec![
            record("1", "Ana", "client", Some(100)),
            record("2", "Leg day", "event", Some(100)),
        ];
        let ranked = rank(&records, "   ", now(), &weights);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].record.id, "1");
        assert_eq!(ranked[0].score, 3.0);
        assert_eq!(ranked[1].score, 1.5);
    }

    #[test]
    fn test_non_matching_records_are_dropped() {
        let weights = ScoringWeights::default();
        let records = vec![
            record("1", "Ana", "client", None),
            record("2", "Bruno", "client", None),
        ];
        let ranked = rank(&records, "ana", now(), &weights);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].record.id, "1");
    }

    #[test]
    fn test_ties_break_by_activity_then_title() {
        let weights = ScoringWeights {
            recency: vec![],
            ..ScoringWeights::default()
        };
        let records = vec![
            record("c", "Zumba", "event", Some(10)),
            record("b", "Yoga", "event", Some(2)),
            record("a", "Aerobics", "event", Some(10)),
            record("d", "Boxing", "event", None),
        ];
        let ranked = rank(&records, "", now(), &weights);
        let ids: Vec<&str> = ranked.iter().map(|s| s.record.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c", "d"]);

        let again = rank(&records, "", now(), &weights);
        assert_eq!(ranked, again);
    }

    #[test]
    fn test_actor_leaderboard() {
        let mut a1 = record("1", "x", "session", None);
        a1.owner_id = Some("t2".into());
        a1.owner_label = Some("Carla".into());
        a1.amount = 80.0;
        let mut a2 = a1.clone();
        a2.id = "2".into();
        let mut b1 = record("3", "y", "session", None);
        b1.owner_id = Some("t1".into());
        b1.amount = 300.0;
        let mut c1 = b1.clone();
        c1.id = "4".into();
        c1.owner_id = Some("t3".into());
        c1.amount = 300.0;

        let actors = actor_leaderboard(&[b1, a1, a2, c1], &Formatter::default());
        let ids: Vec<&str> = actors.iter().map(|a| a.actor_id.as_str()).collect();
        assert_eq!(ids, vec!["t2", "t1", "t3"]);
        assert_eq!(actors[0].label, "Carla");
        assert_eq!(actors[0].amount_display, "$160.00");
        assert_eq!(actors[1].label, "t1");
    }
}
