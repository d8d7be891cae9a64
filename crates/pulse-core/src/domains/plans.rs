use std::collections::BTreeSet;

use chrono::Duration;

use crate::bucket::{trend, Contribution};
use crate::highlights::plans::{StalePlans, TopPlanAuthor, UnassignedPlans};
use crate::highlights::{Aggregates, HighlightRule};
use crate::models::{Domain, DomainRecord, HeroMetric, Tone};
use crate::normalize::{AmountSign, FieldHints};
use crate::taxonomy::StatusTaxonomy;

use super::{flag, DomainProfile};

static FIELDS: FieldHints = FieldHints {
    id: &["id", "plan_id", "uuid"],
    occurred_at: &["created_at", "start_date", "starts_on"],
    updated_at: &["updated_at", "last_modified", "modified_at"],
    amount: &["price", "amount"],
    status: &["status", "state"],
    category: &["goal", "category", "type", "level"],
    owner_id: &["trainer_id", "trainer.id", "created_by"],
    owner_label: &["trainer.name", "trainer.full_name", "trainer_name"],
    counterpart_id: &["client_id", "client.id", "assigned_to"],
    title: &["name", "title"],
    text: &[
        "name",
        "title",
        "description",
        "goal",
        "client.name",
        "client_name",
        "trainer.name",
        "trainer_name",
    ],
    sign: AmountSign::AsIs,
};

/// Training plans authored by trainers for clients
pub struct PlansProfile;

impl DomainProfile for PlansProfile {
    fn domain(&self) -> Domain {
        Domain::Plans
    }

    fn fields(&self) -> &'static FieldHints {
        &FIELDS
    }

    fn taxonomy(&self) -> StatusTaxonomy {
        StatusTaxonomy::new()
            .entry("active", "Active", Tone::Positive, &["in_progress", "ongoing", "published"])
            .entry("draft", "Draft", Tone::Neutral, &["new", "unpublished"])
            .entry("paused", "Paused", Tone::Warning, &["on_hold", "suspended"])
            .entry("completed", "Completed", Tone::Positive, &["finished", "done"])
            .entry("archived", "Archived", Tone::Neutral, &["inactive", "deleted", "expired"])
    }

    fn metrics(&self) -> &'static [&'static str] {
        &["created", "active"]
    }

    fn contribute(&self, _record: &DomainRecord, key: &str) -> Contribution {
        vec![("created", 1.0), ("active", flag(key == "active"))]
    }

    fn hero(&self, ctx: &Aggregates<'_>) -> Vec<HeroMetric> {
        let fmt = ctx.formatter;
        let cutoff = ctx.now - Duration::days(ctx.thresholds.stale_plan_days);
        let active: Vec<_> = ctx.rows_with_status("active").collect();

        let ages: Vec<i64> = active
            .iter()
            .filter_map(|r| r.updated_at.or(r.occurred_at))
            .map(|at| (ctx.now - at).num_days().max(0))
            .collect();
        let stale = active
            .iter()
            .filter(|r| r.updated_at.or(r.occurred_at).is_some_and(|at| at < cutoff))
            .count();
        let clients: BTreeSet<&str> = ctx
            .rows
            .iter()
            .filter(|r| r.status == "active")
            .filter_map(|r| r.counterpart_id.as_deref())
            .collect();

        let avg_age = if ages.is_empty() {
            "-".to_string()
        } else {
            let avg = ages.iter().sum::<i64>() as f64 / ages.len() as f64;
            format!("{:.0} days", avg)
        };

        vec![
            HeroMetric::new("active", "Active plans", fmt.count(active.len()))
                .with_tone(Tone::Positive)
                .with_trend(trend(ctx.timeline, "created")),
            HeroMetric::new("stale", "Stale plans", fmt.count(stale))
                .with_hint(format!("No update in {}+ days", ctx.thresholds.stale_plan_days))
                .with_tone(if stale > 0 { Tone::Warning } else { Tone::Neutral }),
            HeroMetric::new("clients", "Clients with plans", fmt.count(clients.len())),
            HeroMetric::new("avg-age", "Avg days since update", avg_age),
        ]
    }

    fn rules(&self) -> Vec<Box<dyn HighlightRule>> {
        vec![
            Box::new(StalePlans),
            Box::new(UnassignedPlans),
            Box::new(TopPlanAuthor),
        ]
    }
}
