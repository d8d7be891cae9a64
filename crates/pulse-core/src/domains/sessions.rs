use crate::bucket::{trend, Contribution};
use crate::highlights::sessions::{
    BusiestPeriod, CancellationRate, MostActiveTrainer, UpcomingUnconfirmed,
};
use crate::highlights::{Aggregates, HighlightRule};
use crate::models::{Domain, DomainRecord, HeroMetric, Tone};
use crate::normalize::{AmountSign, FieldHints};
use crate::taxonomy::StatusTaxonomy;

use super::{flag, DomainProfile};

static FIELDS: FieldHints = FieldHints {
    id: &["id", "session_id", "uuid"],
    occurred_at: &["start_time", "starts_at", "scheduled_at", "date", "created_at"],
    updated_at: &["updated_at", "confirmed_at"],
    amount: &["price", "amount"],
    status: &["status", "state"],
    category: &["type", "session_type", "modality", "category"],
    owner_id: &["trainer_id", "trainer.id"],
    owner_label: &["trainer.name", "trainer.full_name", "trainer_name"],
    counterpart_id: &["client_id", "client.id"],
    title: &["title", "name", "client.name", "client_name"],
    text: &[
        "title",
        "name",
        "notes",
        "location",
        "trainer.name",
        "trainer_name",
        "client.name",
        "client_name",
    ],
    sign: AmountSign::AsIs,
};

/// Training sessions between trainers and clients
pub struct SessionsProfile;

impl DomainProfile for SessionsProfile {
    fn domain(&self) -> Domain {
        Domain::Sessions
    }

    fn fields(&self) -> &'static FieldHints {
        &FIELDS
    }

    fn taxonomy(&self) -> StatusTaxonomy {
        StatusTaxonomy::new()
            .entry("scheduled", "Scheduled", Tone::Neutral, &["booked", "requested", "unconfirmed", "not_confirmed"])
            .entry("confirmed", "Confirmed", Tone::Positive, &["accepted"])
            .entry("completed", "Completed", Tone::Positive, &["done", "attended", "finished"])
            .entry(
                "cancelled",
                "Cancelled",
                Tone::Warning,
                &["canceled", "no_show", "noshow", "missed"],
            )
    }

    fn metrics(&self) -> &'static [&'static str] {
        &["scheduled", "completed", "cancelled", "total"]
    }

    fn contribute(&self, _record: &DomainRecord, key: &str) -> Contribution {
        vec![
            ("scheduled", flag(key == "scheduled" || key == "confirmed")),
            ("completed", flag(key == "completed")),
            ("cancelled", flag(key == "cancelled")),
            ("total", 1.0),
        ]
    }

    fn hero(&self, ctx: &Aggregates<'_>) -> Vec<HeroMetric> {
        let fmt = ctx.formatter;
        let total = ctx.status_total();
        let completed = ctx.status_count("completed");
        let cancelled = ctx.status_count("cancelled");
        let cancellation = Aggregates::rate(cancelled, total).unwrap_or(0.0);

        let mut upcoming: Vec<_> = ctx
            .rows
            .iter()
            .filter(|r| r.status == "scheduled" || r.status == "confirmed")
            .filter(|r| r.occurred_at.is_some_and(|at| at > ctx.now))
            .collect();
        upcoming.sort_by(|a, b| a.occurred_at.cmp(&b.occurred_at).then_with(|| a.id.cmp(&b.id)));

        let mut completed_metric = HeroMetric::new("completed", "Completed", fmt.count(completed))
            .with_tone(Tone::Positive)
            .with_trend(trend(ctx.timeline, "completed"));
        if let Some(rate) = Aggregates::rate(completed, total) {
            completed_metric = completed_metric.with_hint(format!("{} of sessions", fmt.percent(rate)));
        }

        let mut upcoming_metric = HeroMetric::new("upcoming", "Upcoming", fmt.count(upcoming.len()));
        if let Some(next) = upcoming.first() {
            upcoming_metric = upcoming_metric.with_hint(format!("Next {}", next.activity_display));
        }

        vec![
            HeroMetric::new("sessions", "Sessions", fmt.count(total))
                .with_trend(trend(ctx.timeline, "total")),
            completed_metric,
            HeroMetric::new("cancellation-rate", "Cancellation rate", fmt.percent(cancellation))
                .with_hint(format!("{} cancelled", fmt.count(cancelled)))
                .with_tone(if cancelled > 0 && cancellation >= ctx.thresholds.cancellation_rate_pct {
                    Tone::Warning
                } else {
                    Tone::Neutral
                }),
            upcoming_metric,
        ]
    }

    fn rules(&self) -> Vec<Box<dyn HighlightRule>> {
        vec![
            Box::new(CancellationRate),
            Box::new(UpcomingUnconfirmed),
            Box::new(MostActiveTrainer),
            Box::new(BusiestPeriod),
        ]
    }
}
