use crate::bucket::{trend, Contribution};
use crate::highlights::wallet::{LargestDebit, LowBalance, NetFlow, PendingEntries};
use crate::highlights::{Aggregates, HighlightRule};
use crate::models::{Domain, DomainRecord, HeroMetric, Tone};
use crate::normalize::{AmountSign, FieldHints};
use crate::taxonomy::StatusTaxonomy;

use super::DomainProfile;

/// Entries carry unsigned amounts; the entry type gives the direction
static FIELDS: FieldHints = FieldHints {
    id: &["id", "entry_id", "transaction_id", "uuid"],
    occurred_at: &["occurred_at", "created_at", "date"],
    updated_at: &["updated_at", "settled_at"],
    amount: &["amount", "value", "valor"],
    status: &["status", "state"],
    category: &["type", "kind", "entry_type", "category"],
    owner_id: &["client_id", "wallet_id", "user_id"],
    owner_label: &["client.name", "client.full_name", "client_name"],
    counterpart_id: &["reference_id", "invoice_id", "session_id"],
    title: &["description", "title", "memo"],
    text: &["description", "title", "memo", "client.name", "client_name"],
    sign: AmountSign::FromKind {
        keys: &["type", "kind", "entry_type", "direction"],
        debit: &[
            "debit",
            "withdrawal",
            "charge",
            "payment",
            "out",
            "debito",
            "débito",
            "saida",
            "saída",
        ],
        credit: &[
            "credit",
            "deposit",
            "top_up",
            "topup",
            "refund",
            "in",
            "credito",
            "crédito",
            "entrada",
        ],
    },
};

/// Prepaid client wallet ledger
pub struct WalletProfile;

impl DomainProfile for WalletProfile {
    fn domain(&self) -> Domain {
        Domain::Wallet
    }

    fn fields(&self) -> &'static FieldHints {
        &FIELDS
    }

    fn taxonomy(&self) -> StatusTaxonomy {
        StatusTaxonomy::new()
            .entry("completed", "Completed", Tone::Positive, &["settled", "success", "posted", "confirmed"])
            .entry("pending", "Pending", Tone::Warning, &["processing", "awaiting", "hold", "unconfirmed", "unsettled"])
            .entry("failed", "Failed", Tone::Critical, &["error", "declined", "rejected"])
            .entry("reversed", "Reversed", Tone::Neutral, &["refunded", "voided", "chargeback"])
    }

    fn metrics(&self) -> &'static [&'static str] {
        &["credit", "debit", "net"]
    }

    /// Debits are reported as a positive magnitude
    fn contribute(&self, record: &DomainRecord, _key: &str) -> Contribution {
        let amount = record.amount;
        vec![
            ("credit", amount.max(0.0)),
            ("debit", (-amount).max(0.0)),
            ("net", amount),
        ]
    }

    fn tracks_balance(&self) -> bool {
        true
    }

    fn hero(&self, ctx: &Aggregates<'_>) -> Vec<HeroMetric> {
        let fmt = ctx.formatter;
        let credits: f64 = ctx.rows.iter().map(|r| r.amount.max(0.0)).sum();
        let debits: f64 = ctx.rows.iter().map(|r| (-r.amount).max(0.0)).sum();
        let net = credits - debits;
        let balance = ctx.current_balance.unwrap_or(net);

        let balance_tone = if ctx.batch_size == 0 {
            Tone::Neutral
        } else if balance < ctx.thresholds.low_balance {
            Tone::Critical
        } else {
            Tone::Positive
        };

        vec![
            HeroMetric::new("balance", "Current balance", fmt.currency(balance))
                .with_tone(balance_tone),
            HeroMetric::new("credits", "Credits", fmt.currency(credits))
                .with_tone(Tone::Positive)
                .with_trend(trend(ctx.timeline, "credit")),
            HeroMetric::new("debits", "Debits", fmt.currency(debits))
                .with_trend(trend(ctx.timeline, "debit")),
            HeroMetric::new("net-flow", "Net flow", fmt.currency(net)).with_tone(
                if net > 0.0 {
                    Tone::Positive
                } else if net < 0.0 {
                    Tone::Warning
                } else {
                    Tone::Neutral
                },
            ),
        ]
    }

    fn rules(&self) -> Vec<Box<dyn HighlightRule>> {
        vec![
            Box::new(LowBalance),
            Box::new(LargestDebit),
            Box::new(PendingEntries),
            Box::new(NetFlow),
        ]
    }
}
