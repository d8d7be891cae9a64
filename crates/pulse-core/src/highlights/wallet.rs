//! Wallet highlights

use crate::models::{Highlight, Tone};

use super::engine::{Aggregates, HighlightRule};

pub struct LowBalance;

impl HighlightRule for LowBalance {
    fn id(&self) -> &'static str {
        "wallet-low-balance"
    }

    fn priority(&self) -> u8 {
        90
    }

    fn evaluate(&self, ctx: &Aggregates<'_>) -> Option<Highlight> {
        if ctx.batch_size == 0 {
            return None;
        }
        let balance = ctx.current_balance?;
        if balance >= ctx.thresholds.low_balance {
            return None;
        }
        Some(Highlight::new(
            self.id(),
            Tone::Critical,
            "Low balance",
            format!(
                "Balance is {}, below {}.",
                ctx.formatter.currency(balance),
                ctx.formatter.currency(ctx.thresholds.low_balance)
            ),
        ))
    }
}

/// Most negative entry; id breaks ties
pub struct LargestDebit;

impl HighlightRule for LargestDebit {
    fn id(&self) -> &'static str {
        "wallet-largest-debit"
    }

    fn priority(&self) -> u8 {
        60
    }

    fn evaluate(&self, ctx: &Aggregates<'_>) -> Option<Highlight> {
        let largest = ctx
            .rows
            .iter()
            .filter(|r| r.amount < 0.0)
            .min_by(|a, b| a.amount.total_cmp(&b.amount).then_with(|| a.id.cmp(&b.id)))?;
        Some(
            Highlight::new(
                self.id(),
                Tone::Neutral,
                "Largest debit",
                format!(
                    "{}: {} ({}).",
                    largest.title, largest.amount_display, largest.activity_display
                ),
            )
            .with_meta(largest.id.clone()),
        )
    }
}

pub struct PendingEntries;

impl HighlightRule for PendingEntries {
    fn id(&self) -> &'static str {
        "wallet-pending"
    }

    fn priority(&self) -> u8 {
        40
    }

    fn evaluate(&self, ctx: &Aggregates<'_>) -> Option<Highlight> {
        let count = ctx.status_count("pending");
        if count == 0 {
            return None;
        }
        let amount: f64 = ctx.rows_with_status("pending").map(|r| r.amount).sum();
        Some(Highlight::new(
            self.id(),
            Tone::Warning,
            "Pending entries",
            format!(
                "{} entries worth {} have not settled.",
                ctx.formatter.count(count),
                ctx.formatter.currency(amount)
            ),
        ))
    }
}

/// Credits minus debits over the window
pub struct NetFlow;

impl HighlightRule for NetFlow {
    fn id(&self) -> &'static str {
        "wallet-net-flow"
    }

    fn priority(&self) -> u8 {
        30
    }

    fn evaluate(&self, ctx: &Aggregates<'_>) -> Option<Highlight> {
        let net = ctx.metric_total("net");
        if net.abs() < 0.005 {
            return None;
        }
        let (tone, title) = if net > 0.0 {
            (Tone::Positive, "Net inflow")
        } else {
            (Tone::Warning, "Net outflow")
        };
        Some(Highlight::new(
            self.id(),
            tone,
            title,
            format!(
                "{} in, {} out this period.",
                ctx.formatter.currency(ctx.metric_total("credit")),
                ctx.formatter.currency(ctx.metric_total("debit"))
            ),
        ))
    }
}
