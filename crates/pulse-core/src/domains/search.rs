use crate::bucket::Contribution;
use crate::highlights::search::{NoMatches, TopMatch};
use crate::highlights::{Aggregates, HighlightRule};
use crate::models::{Domain, DomainRecord, HeroMetric, Tone};
use crate::normalize::{AmountSign, FieldHints};
use crate::taxonomy::StatusTaxonomy;

use super::{Breakdown, DomainProfile};

static FIELDS: FieldHints = FieldHints {
    id: &["id", "entity_id", "uuid"],
    occurred_at: &["occurred_at", "created_at", "date"],
    updated_at: &["updated_at"],
    amount: &["amount"],
    status: &["status"],
    category: &["category", "type", "kind", "entity_type"],
    owner_id: &["owner_id", "trainer_id"],
    owner_label: &["owner_name", "trainer.name", "trainer_name"],
    counterpart_id: &["client_id"],
    title: &["title", "name", "label"],
    text: &[
        "title",
        "name",
        "label",
        "subtitle",
        "description",
        "email",
        "tags",
    ],
    sign: AmountSign::AsIs,
};

/// Cross-entity search over people, plans, sessions and billing
pub struct SearchProfile;

impl DomainProfile for SearchProfile {
    fn domain(&self) -> Domain {
        Domain::Search
    }

    fn fields(&self) -> &'static FieldHints {
        &FIELDS
    }

    fn taxonomy(&self) -> StatusTaxonomy {
        StatusTaxonomy::new()
            .entry(
                "people",
                "People",
                Tone::Neutral,
                &["client", "trainer", "admin", "user", "member", "student", "profile"],
            )
            .entry("plans", "Plans", Tone::Neutral, &["plan", "program", "workout"])
            .entry(
                "sessions",
                "Sessions",
                Tone::Neutral,
                &["session", "class", "appointment", "event"],
            )
            .entry("billing", "Billing", Tone::Neutral, &["invoice", "payment", "wallet"])
    }

    fn breakdown(&self) -> Breakdown {
        Breakdown::Category
    }

    fn metrics(&self) -> &'static [&'static str] {
        &["matches"]
    }

    fn contribute(&self, _record: &DomainRecord, _key: &str) -> Contribution {
        vec![("matches", 1.0)]
    }

    fn hero(&self, ctx: &Aggregates<'_>) -> Vec<HeroMetric> {
        let fmt = ctx.formatter;
        let top_score = ctx
            .rows
            .first()
            .and_then(|r| r.score)
            .map(|s| format!("{:.1}", s))
            .unwrap_or_else(|| "-".to_string());
        let query = ctx
            .query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("\"{}\"", q))
            .unwrap_or_else(|| "All records".to_string());

        vec![
            HeroMetric::new("results", "Results", fmt.count(ctx.rows.len()))
                .with_hint(format!("of {} records", fmt.count(ctx.batch_size))),
            HeroMetric::new("people", "People", fmt.count(ctx.status_count("people"))),
            HeroMetric::new("top-score", "Top score", top_score),
            HeroMetric::new("query", "Query", query),
        ]
    }

    fn rules(&self) -> Vec<Box<dyn HighlightRule>> {
        vec![Box::new(NoMatches), Box::new(TopMatch)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_fold_into_groups() {
        let taxonomy = SearchProfile.taxonomy();
        assert_eq!(taxonomy.classify(Some("Trainer")).key, "people");
        assert_eq!(taxonomy.classify(Some("training_plan")).key, "plans");
        assert_eq!(taxonomy.classify(Some("invoice")).key, "billing");
    }
}
