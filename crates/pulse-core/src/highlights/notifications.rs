//! Notification highlights

use std::collections::BTreeMap;

use crate::models::{Highlight, Tone};

use super::engine::{Aggregates, HighlightRule};

pub struct FailedDeliveries;

impl HighlightRule for FailedDeliveries {
    fn id(&self) -> &'static str {
        "notifications-failed"
    }

    fn priority(&self) -> u8 {
        90
    }

    fn evaluate(&self, ctx: &Aggregates<'_>) -> Option<Highlight> {
        let failed = ctx.status_count("failed");
        if failed == 0 {
            return None;
        }
        Some(Highlight::new(
            self.id(),
            Tone::Critical,
            "Delivery failures",
            format!(
                "{} notifications could not be delivered.",
                ctx.formatter.count(failed)
            ),
        ))
    }
}

/// Delivered or sent but not yet read
pub struct UnreadBacklog;

impl HighlightRule for UnreadBacklog {
    fn id(&self) -> &'static str {
        "notifications-unread-backlog"
    }

    fn priority(&self) -> u8 {
        60
    }

    fn evaluate(&self, ctx: &Aggregates<'_>) -> Option<Highlight> {
        let unread = ctx.status_count("delivered") + ctx.status_count("sent");
        if unread == 0 || unread < ctx.thresholds.unread_backlog {
            return None;
        }
        Some(Highlight::new(
            self.id(),
            Tone::Warning,
            "Unread backlog",
            format!(
                "{} notifications are still unread.",
                ctx.formatter.count(unread)
            ),
        ))
    }
}

pub struct ReadRate;

impl HighlightRule for ReadRate {
    fn id(&self) -> &'static str {
        "notifications-read-rate"
    }

    fn priority(&self) -> u8 {
        30
    }

    fn evaluate(&self, ctx: &Aggregates<'_>) -> Option<Highlight> {
        let read = ctx.status_count("read");
        let reached = read + ctx.status_count("delivered") + ctx.status_count("sent");
        let rate = Aggregates::rate(read, reached)?;
        if rate < ctx.thresholds.healthy_read_rate_pct {
            return None;
        }
        Some(Highlight::new(
            self.id(),
            Tone::Positive,
            "Good engagement",
            format!(
                "{} of delivered notifications were read.",
                ctx.formatter.percent(rate)
            ),
        ))
    }
}

/// Channel with the most notifications; alphabetical on ties
pub struct BusiestChannel;

impl HighlightRule for BusiestChannel {
    fn id(&self) -> &'static str {
        "notifications-busiest-channel"
    }

    fn priority(&self) -> u8 {
        20
    }

    fn evaluate(&self, ctx: &Aggregates<'_>) -> Option<Highlight> {
        let mut channels: BTreeMap<&str, usize> = BTreeMap::new();
        for row in ctx.rows {
            if let Some(channel) = row.category.as_deref() {
                *channels.entry(channel).or_insert(0) += 1;
            }
        }
        let (channel, count) = channels
            .into_iter()
            .min_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)))?;
        Some(Highlight::new(
            self.id(),
            Tone::Neutral,
            "Busiest channel",
            format!(
                "{} carried {} notifications.",
                channel,
                ctx.formatter.count(count)
            ),
        ))
    }
}
