//! Training plan highlights

use chrono::Duration;

use crate::models::{DashboardRow, Highlight, Timestamp, Tone};

use super::engine::{Aggregates, HighlightRule};

fn last_touched(row: &DashboardRow) -> Option<Timestamp> {
    row.updated_at.or(row.occurred_at)
}

/// Active plans not updated within the stale threshold; the one untouched
/// the longest is named (id breaks ties)
pub struct StalePlans;

impl HighlightRule for StalePlans {
    fn id(&self) -> &'static str {
        "plans-stale"
    }

    fn priority(&self) -> u8 {
        70
    }

    fn evaluate(&self, ctx: &Aggregates<'_>) -> Option<Highlight> {
        let cutoff = ctx.now - Duration::days(ctx.thresholds.stale_plan_days);
        let mut stale: Vec<(&DashboardRow, Timestamp)> = ctx
            .rows_with_status("active")
            .filter_map(|r| last_touched(r).map(|at| (r, at)))
            .filter(|(_, at)| *at < cutoff)
            .collect();
        stale.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.id.cmp(&b.0.id)));

        let (stalest, _) = stale.first()?;
        let owner = stalest
            .owner
            .as_deref()
            .map(|o| format!(" ({})", o))
            .unwrap_or_default();
        Some(
            Highlight::new(
                self.id(),
                Tone::Warning,
                format!(
                    "{} plans not updated in {}+ days",
                    ctx.formatter.count(stale.len()),
                    ctx.thresholds.stale_plan_days
                ),
                format!(
                    "Stalest: {}{}, last touched {}.",
                    stalest.title, owner, stalest.activity_display
                ),
            )
            .with_meta(stalest.id.clone()),
        )
    }
}

/// Active or draft plans with no client assigned
pub struct UnassignedPlans;

impl HighlightRule for UnassignedPlans {
    fn id(&self) -> &'static str {
        "plans-unassigned"
    }

    fn priority(&self) -> u8 {
        40
    }

    fn evaluate(&self, ctx: &Aggregates<'_>) -> Option<Highlight> {
        let count = ctx
            .rows
            .iter()
            .filter(|r| (r.status == "active" || r.status == "draft") && r.counterpart_id.is_none())
            .count();
        if count == 0 {
            return None;
        }
        Some(Highlight::new(
            self.id(),
            Tone::Warning,
            "Plans without a client",
            format!(
                "{} open plans are not assigned to anyone.",
                ctx.formatter.count(count)
            ),
        ))
    }
}

pub struct TopPlanAuthor;

impl HighlightRule for TopPlanAuthor {
    fn id(&self) -> &'static str {
        "plans-top-trainer"
    }

    fn priority(&self) -> u8 {
        20
    }

    fn evaluate(&self, ctx: &Aggregates<'_>) -> Option<Highlight> {
        let top = ctx.actors.first()?;
        Some(
            Highlight::new(
                self.id(),
                Tone::Neutral,
                "Most plans",
                format!(
                    "{} manages {} plans.",
                    top.label,
                    ctx.formatter.count(top.count)
                ),
            )
            .with_meta(top.actor_id.clone()),
        )
    }
}
