use crate::bucket::{trend, Contribution};
use crate::highlights::notifications::{BusiestChannel, FailedDeliveries, ReadRate, UnreadBacklog};
use crate::highlights::{Aggregates, HighlightRule};
use crate::models::{Domain, DomainRecord, HeroMetric, Tone};
use crate::normalize::{AmountSign, FieldHints};
use crate::taxonomy::StatusTaxonomy;

use super::{flag, DomainProfile};

static FIELDS: FieldHints = FieldHints {
    id: &["id", "notification_id", "uuid"],
    occurred_at: &["sent_at", "delivered_at", "created_at"],
    updated_at: &["read_at", "updated_at"],
    amount: &[],
    status: &["status", "state", "delivery_status"],
    category: &["channel", "type", "category"],
    owner_id: &["recipient_id", "user_id", "client_id"],
    owner_label: &["recipient.name", "recipient_name"],
    counterpart_id: &["sender_id", "created_by"],
    title: &["title", "subject", "message"],
    text: &["title", "subject", "message", "body"],
    sign: AmountSign::AsIs,
};

/// Outbound notifications to clients and staff
pub struct NotificationsProfile;

impl DomainProfile for NotificationsProfile {
    fn domain(&self) -> Domain {
        Domain::Notifications
    }

    fn fields(&self) -> &'static FieldHints {
        &FIELDS
    }

    fn taxonomy(&self) -> StatusTaxonomy {
        StatusTaxonomy::new()
            .entry("read", "Read", Tone::Positive, &["opened", "seen", "clicked"])
            .entry("delivered", "Delivered", Tone::Neutral, &["received", "unread", "unopened", "not_read"])
            .entry("sent", "Sent", Tone::Neutral, &["dispatched"])
            .entry("pending", "Pending", Tone::Warning, &["queued", "scheduled", "unsent", "not_sent"])
            .entry("failed", "Failed", Tone::Critical, &["bounced", "error", "undeliverable", "undelivered", "not_delivered"])
    }

    fn metrics(&self) -> &'static [&'static str] {
        &["sent", "read", "failed"]
    }

    fn contribute(&self, _record: &DomainRecord, key: &str) -> Contribution {
        vec![
            ("sent", 1.0),
            ("read", flag(key == "read")),
            ("failed", flag(key == "failed")),
        ]
    }

    fn hero(&self, ctx: &Aggregates<'_>) -> Vec<HeroMetric> {
        let fmt = ctx.formatter;
        let failed = ctx.status_count("failed");
        let read = ctx.status_count("read");
        let reached = read + ctx.status_count("delivered") + ctx.status_count("sent");
        let read_rate = Aggregates::rate(read, reached)
            .map(|r| fmt.percent(r))
            .unwrap_or_else(|| "-".to_string());

        vec![
            HeroMetric::new("sent", "Sent", fmt.count(ctx.status_total()))
                .with_trend(trend(ctx.timeline, "sent")),
            HeroMetric::new("failed", "Failures", fmt.count(failed)).with_tone(if failed > 0 {
                Tone::Critical
            } else {
                Tone::Positive
            }),
            HeroMetric::new("read-rate", "Read rate", read_rate)
                .with_hint(format!("{} read", fmt.count(read))),
            HeroMetric::new("pending", "Pending", fmt.count(ctx.status_count("pending"))),
        ]
    }

    fn rules(&self) -> Vec<Box<dyn HighlightRule>> {
        vec![
            Box::new(FailedDeliveries),
            Box::new(UnreadBacklog),
            Box::new(ReadRate),
            Box::new(BusiestChannel),
        ]
    }
}
