use crate::bucket::{trend, Contribution};
use crate::highlights::billing::{CollectionRate, LargestPending, OverdueInvoices, TopClient};
use crate::highlights::{Aggregates, HighlightRule};
use crate::models::{Domain, DomainRecord, HeroMetric, Tone};
use crate::normalize::{AmountSign, FieldHints};
use crate::taxonomy::StatusTaxonomy;

use super::{sum_amount, DomainProfile};

static FIELDS: FieldHints = FieldHints {
    id: &["id", "invoice_id", "uuid"],
    occurred_at: &["issued_at", "issue_date", "created_at", "date"],
    updated_at: &["updated_at", "paid_at"],
    amount: &["amount", "total", "value", "valor"],
    status: &["status", "payment_status", "state"],
    category: &["category", "type", "payment_method"],
    owner_id: &["client_id", "student_id", "client.id"],
    owner_label: &["client.name", "client.full_name", "client_name"],
    counterpart_id: &["trainer_id", "trainer.id"],
    title: &["title", "description", "number", "invoice_number"],
    text: &[
        "title",
        "description",
        "number",
        "invoice_number",
        "client.name",
        "client_name",
    ],
    sign: AmountSign::AsIs,
};

/// Invoices issued to clients
pub struct BillingProfile;

impl DomainProfile for BillingProfile {
    fn domain(&self) -> Domain {
        Domain::Billing
    }

    fn fields(&self) -> &'static FieldHints {
        &FIELDS
    }

    fn taxonomy(&self) -> StatusTaxonomy {
        StatusTaxonomy::new()
            .entry("paid", "Paid", Tone::Positive, &["settled", "succeeded", "received"])
            .entry("pending", "Pending", Tone::Warning, &["unpaid", "not_paid", "open", "awaiting", "issued"])
            .entry("overdue", "Overdue", Tone::Critical, &["past_due", "late", "expired"])
            .entry("cancelled", "Cancelled", Tone::Neutral, &["canceled", "void"])
            .entry("refunded", "Refunded", Tone::Neutral, &["refund", "chargeback"])
    }

    fn metrics(&self) -> &'static [&'static str] {
        &["issued", "paid", "outstanding", "count"]
    }

    fn contribute(&self, record: &DomainRecord, key: &str) -> Contribution {
        let open = key == "pending" || key == "overdue";
        vec![
            ("issued", record.amount),
            ("paid", if key == "paid" { record.amount } else { 0.0 }),
            ("outstanding", if open { record.amount } else { 0.0 }),
            ("count", 1.0),
        ]
    }

    fn hero(&self, ctx: &Aggregates<'_>) -> Vec<HeroMetric> {
        let fmt = ctx.formatter;
        let collected = sum_amount(ctx.rows_with_status("paid"));
        let open_rows = || {
            ctx.rows
                .iter()
                .filter(|r| r.status == "pending" || r.status == "overdue")
        };
        let outstanding = sum_amount(open_rows());
        let overdue = ctx.status_count("overdue");
        let overdue_amount = sum_amount(ctx.rows_with_status("overdue"));

        vec![
            HeroMetric::new("collected", "Revenue collected", fmt.currency(collected))
                .with_tone(Tone::Positive)
                .with_trend(trend(ctx.timeline, "paid")),
            HeroMetric::new("outstanding", "Outstanding", fmt.currency(outstanding))
                .with_hint(format!("{} open invoices", fmt.count(open_rows().count())))
                .with_tone(if outstanding > 0.0 {
                    Tone::Warning
                } else {
                    Tone::Neutral
                }),
            HeroMetric::new("overdue", "Overdue", fmt.count(overdue))
                .with_hint(fmt.currency(overdue_amount))
                .with_tone(if overdue > 0 {
                    Tone::Critical
                } else {
                    Tone::Positive
                }),
            HeroMetric::new("invoices", "Invoices", fmt.count(ctx.rows.len()))
                .with_trend(trend(ctx.timeline, "count")),
        ]
    }

    fn rules(&self) -> Vec<Box<dyn HighlightRule>> {
        vec![
            Box::new(OverdueInvoices),
            Box::new(LargestPending),
            Box::new(CollectionRate),
            Box::new(TopClient),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_billing_vocabulary() {
        let taxonomy = BillingProfile.taxonomy();
        assert_eq!(taxonomy.classify(Some("Unpaid")).key, "pending");
        assert_eq!(taxonomy.classify(Some("PAST-DUE")).key, "overdue");
        assert_eq!(taxonomy.classify(Some("paid")).key, "paid");
        assert_eq!(taxonomy.classify(Some("voided")).key, "cancelled");
        assert_eq!(taxonomy.classify(Some("not paid")).key, "pending");
        assert_eq!(taxonomy.classify(Some("NOT-PAID")).tone, Tone::Warning);
    }

    #[test]
    fn test_contribution_splits_paid_and_open() {
        let record = DomainRecord {
            id: "inv-1".into(),
            occurred_at: None,
            updated_at: None,
            amount: 120.0,
            status: Some("overdue".into()),
            category: None,
            owner_id: None,
            owner_label: None,
            counterpart_id: None,
            title: None,
            search_tokens: vec![],
        };
        let contribution = BillingProfile.contribute(&record, "overdue");
        assert!(contribution.contains(&("outstanding", 120.0)));
        assert!(contribution.contains(&("paid", 0.0)));
    }
}
