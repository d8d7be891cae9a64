//! Billing highlights
//!
//! - **Overdue invoices** - any invoice past due
//! - **Largest pending** - the biggest invoice still waiting on payment
//! - **Collection rate** - paid share of billable invoices
//! - **Top client** - client with the most invoices

use crate::models::{Highlight, Tone};

use super::engine::{Aggregates, HighlightRule};

pub struct OverdueInvoices;

impl HighlightRule for OverdueInvoices {
    fn id(&self) -> &'static str {
        "billing-overdue"
    }

    fn priority(&self) -> u8 {
        90
    }

    fn evaluate(&self, ctx: &Aggregates<'_>) -> Option<Highlight> {
        let count = ctx.status_count("overdue");
        if count == 0 {
            return None;
        }
        let total: f64 = ctx.rows_with_status("overdue").map(|r| r.amount).sum();
        let title = if count == 1 {
            "1 overdue invoice".to_string()
        } else {
            format!("{} overdue invoices", ctx.formatter.count(count))
        };
        Some(Highlight::new(
            self.id(),
            Tone::Critical,
            title,
            format!("{} is past due.", ctx.formatter.currency(total)),
        ))
    }
}

/// Comparator: amount desc, then id asc
pub struct LargestPending;

impl HighlightRule for LargestPending {
    fn id(&self) -> &'static str {
        "billing-largest-pending"
    }

    fn priority(&self) -> u8 {
        70
    }

    fn evaluate(&self, ctx: &Aggregates<'_>) -> Option<Highlight> {
        let largest = ctx
            .rows_with_status("pending")
            .filter(|r| r.amount > 0.0)
            .min_by(|a, b| b.amount.total_cmp(&a.amount).then_with(|| a.id.cmp(&b.id)))?;

        let who = largest
            .owner
            .as_deref()
            .map(|o| format!(" from {}", o))
            .unwrap_or_default();
        Some(
            Highlight::new(
                self.id(),
                Tone::Warning,
                "Largest pending invoice",
                format!(
                    "{}{} is still open ({}).",
                    largest.amount_display, who, largest.activity_display
                ),
            )
            .with_meta(largest.id.clone()),
        )
    }
}

pub struct CollectionRate;

impl HighlightRule for CollectionRate {
    fn id(&self) -> &'static str {
        "billing-collection-rate"
    }

    fn priority(&self) -> u8 {
        30
    }

    fn evaluate(&self, ctx: &Aggregates<'_>) -> Option<Highlight> {
        let paid = ctx.status_count("paid");
        let billable = paid + ctx.status_count("pending") + ctx.status_count("overdue");
        let rate = Aggregates::rate(paid, billable)?;
        let shown = ctx.formatter.percent(rate);

        if rate >= ctx.thresholds.healthy_collection_rate_pct {
            Some(Highlight::new(
                self.id(),
                Tone::Positive,
                "Collections on track",
                format!("{} of billable invoices are paid.", shown),
            ))
        } else {
            Some(Highlight::new(
                self.id(),
                Tone::Warning,
                "Collections lagging",
                format!("Only {} of billable invoices are paid.", shown),
            ))
        }
    }
}

pub struct TopClient;

impl HighlightRule for TopClient {
    fn id(&self) -> &'static str {
        "billing-top-client"
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
                "Top client",
                format!(
                    "{} has {} invoices totaling {}.",
                    top.label,
                    ctx.formatter.count(top.count),
                    top.amount_display
                ),
            )
            .with_meta(top.actor_id.clone()),
        )
    }
}
