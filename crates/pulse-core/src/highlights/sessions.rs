//! Session highlights

use chrono::Duration;

use crate::models::{Highlight, Tone};

use super::engine::{Aggregates, HighlightRule};

/// Cancelled share of all sessions at or above the configured rate
pub struct CancellationRate;

impl HighlightRule for CancellationRate {
    fn id(&self) -> &'static str {
        "sessions-cancellation-rate"
    }

    fn priority(&self) -> u8 {
        80
    }

    fn evaluate(&self, ctx: &Aggregates<'_>) -> Option<Highlight> {
        let cancelled = ctx.status_count("cancelled");
        let rate = Aggregates::rate(cancelled, ctx.status_total())?;
        if cancelled == 0 || rate < ctx.thresholds.cancellation_rate_pct {
            return None;
        }
        Some(Highlight::new(
            self.id(),
            Tone::Warning,
            "High cancellation rate",
            format!(
                "{} of sessions were cancelled ({} of {}).",
                ctx.formatter.percent(rate),
                ctx.formatter.count(cancelled),
                ctx.formatter.count(ctx.status_total())
            ),
        ))
    }
}

/// Scheduled but not confirmed, starting within the horizon; the soonest is
/// named
pub struct UpcomingUnconfirmed;

impl HighlightRule for UpcomingUnconfirmed {
    fn id(&self) -> &'static str {
        "sessions-upcoming-unconfirmed"
    }

    fn priority(&self) -> u8 {
        60
    }

    fn evaluate(&self, ctx: &Aggregates<'_>) -> Option<Highlight> {
        let horizon = ctx.now + Duration::hours(ctx.thresholds.upcoming_unconfirmed_hours);
        let mut upcoming: Vec<_> = ctx
            .rows_with_status("scheduled")
            .filter(|r| r.occurred_at.is_some_and(|at| at > ctx.now && at <= horizon))
            .collect();
        upcoming.sort_by(|a, b| a.occurred_at.cmp(&b.occurred_at).then_with(|| a.id.cmp(&b.id)));

        let next = upcoming.first()?;
        let title = if upcoming.len() == 1 {
            "1 session awaiting confirmation".to_string()
        } else {
            format!(
                "{} sessions awaiting confirmation",
                ctx.formatter.count(upcoming.len())
            )
        };
        Some(
            Highlight::new(
                self.id(),
                Tone::Warning,
                title,
                format!("Next up: {} {}.", next.title, next.activity_display),
            )
            .with_meta(next.id.clone()),
        )
    }
}

pub struct MostActiveTrainer;

impl HighlightRule for MostActiveTrainer {
    fn id(&self) -> &'static str {
        "sessions-most-active-trainer"
    }

    fn priority(&self) -> u8 {
        40
    }

    fn evaluate(&self, ctx: &Aggregates<'_>) -> Option<Highlight> {
        let top = ctx.actors.first()?;
        Some(
            Highlight::new(
                self.id(),
                Tone::Neutral,
                "Most active trainer",
                format!(
                    "{} has {} sessions this period.",
                    top.label,
                    ctx.formatter.count(top.count)
                ),
            )
            .with_meta(top.actor_id.clone()),
        )
    }
}

/// Bucket with the most sessions; earliest wins ties
pub struct BusiestPeriod;

impl HighlightRule for BusiestPeriod {
    fn id(&self) -> &'static str {
        "sessions-busiest-period"
    }

    fn priority(&self) -> u8 {
        30
    }

    fn evaluate(&self, ctx: &Aggregates<'_>) -> Option<Highlight> {
        let mut busiest = None;
        for point in ctx.timeline {
            let total = point.metric("total");
            if total > 0.0 && busiest.map_or(true, |(_, best)| total > best) {
                busiest = Some((point, total));
            }
        }
        let (point, total) = busiest?;
        Some(Highlight::new(
            self.id(),
            Tone::Neutral,
            "Busiest period",
            format!(
                "{} with {} sessions.",
                point.label,
                ctx.formatter.count(total as usize)
            ),
        ))
    }
}
