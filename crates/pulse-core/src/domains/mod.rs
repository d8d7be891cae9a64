//! Per-domain parameterization of the dashboard pipeline
//!
//! Every dashboard runs the same pipeline. A [`DomainProfile`] injects what
//! differs between them: field candidates, the status taxonomy, timeline
//! metrics, hero metrics and highlight rules.

mod billing;
mod notifications;
mod plans;
mod search;
mod sessions;
mod wallet;

pub use billing::BillingProfile;
pub use notifications::NotificationsProfile;
pub use plans::PlansProfile;
pub use search::SearchProfile;
pub use sessions::SessionsProfile;
pub use wallet::WalletProfile;

use crate::bucket::Contribution;
use crate::highlights::{Aggregates, HighlightRule};
use crate::models::{DashboardRow, Domain, DomainRecord, HeroMetric};
use crate::normalize::FieldHints;
use crate::taxonomy::StatusTaxonomy;

/// Which record field the breakdown classifies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breakdown {
    Status,
    Category,
}

impl Breakdown {
    pub fn value<'r>(&self, record: &'r DomainRecord) -> Option<&'r str> {
        match self {
            Self::Status => record.status.as_deref(),
            Self::Category => record.category.as_deref(),
        }
    }
}

pub trait DomainProfile: Send + Sync {
    fn domain(&self) -> Domain;

    /// Candidate keys for every canonical field
    fn fields(&self) -> &'static FieldHints;

    /// Built-in canonical taxonomy, before configured aliases
    fn taxonomy(&self) -> StatusTaxonomy;

    fn breakdown(&self) -> Breakdown {
        Breakdown::Status
    }

    /// Names every timeline point carries
    fn metrics(&self) -> &'static [&'static str];

    /// What one record adds to its bucket, given its canonical key
    fn contribute(&self, record: &DomainRecord, key: &str) -> Contribution;

    /// Whether timeline points carry a running balance
    fn tracks_balance(&self) -> bool {
        false
    }

    fn hero(&self, ctx: &Aggregates<'_>) -> Vec<HeroMetric>;

    /// Highlight rules in declaration order
    fn rules(&self) -> Vec<Box<dyn HighlightRule>>;
}

pub fn profile_for(domain: Domain) -> Box<dyn DomainProfile> {
    match domain {
        Domain::Billing => Box::new(BillingProfile),
        Domain::Sessions => Box::new(SessionsProfile),
        Domain::Wallet => Box::new(WalletProfile),
        Domain::Plans => Box::new(PlansProfile),
        Domain::Notifications => Box::new(NotificationsProfile),
        Domain::Search => Box::new(SearchProfile),
    }
}

fn sum_amount<'a>(rows: impl Iterator<Item = &'a DashboardRow>) -> f64 {
    rows.map(|r| r.amount).sum()
}

fn flag(condition: bool) -> f64 {
    if condition {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_for_every_domain() {
        for domain in Domain::all() {
            let profile = profile_for(*domain);
            assert_eq!(profile.domain(), *domain);
            assert!(!profile.metrics().is_empty());
            assert!(!profile.rules().is_empty());
            assert!(!profile.taxonomy().entries().is_empty());
        }
    }

    #[test]
    fn test_rule_ids_are_unique() {
        let mut ids: Vec<&str> = Domain::all()
            .iter()
            .flat_map(|d| profile_for(*d).rules())
            .map(|r| r.id())
            .collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn test_only_wallet_tracks_balance() {
        let tracking: Vec<Domain> = Domain::all()
            .iter()
            .copied()
            .filter(|d| profile_for(*d).tracks_balance())
            .collect();
        assert_eq!(tracking, vec![Domain::Wallet]);
    }
}
