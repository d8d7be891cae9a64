//! Status taxonomy classification
//!
//! Maps messy upstream status strings onto a small canonical set per domain.
//! Anything that matches nothing lands in the reserved `unknown` key, so every
//! record is counted exactly once.

use regex::{Regex, RegexBuilder};
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::models::{StatusSegment, Tone};

/// Reserved key for unmatched and missing statuses
pub const UNKNOWN_KEY: &str = "unknown";
const UNKNOWN_LABEL: &str = "Unknown";

/// How an alias is compared against a status
#[derive(Debug, Clone)]
pub enum MatchKind {
    /// Whole normalized value equals the alias
    Exact(String),
    /// Normalized value contains the alias
    Contains(String),
    /// Case-insensitive regular expression
    Regex(Regex),
}

impl MatchKind {
    /// Parse a user alias: `/pattern/` is a regex, `=value` must match the
    /// whole status, anything else is a substring
    pub fn parse(alias: &str) -> Result<Self> {
        let alias = alias.trim();
        if let Some(exact) = alias.strip_prefix('=') {
            let normalized = normalize_status(exact);
            if normalized.is_empty() {
                return Err(Error::Config("Empty taxonomy alias".to_string()));
            }
            return Ok(Self::Exact(normalized));
        }
        if alias.len() > 2 && alias.starts_with('/') && alias.ends_with('/') {
            let re = RegexBuilder::new(&alias[1..alias.len() - 1])
                .case_insensitive(true)
                .build()?;
            return Ok(Self::Regex(re));
        }
        let normalized = normalize_status(alias);
        if normalized.is_empty() {
            return Err(Error::Config("Empty taxonomy alias".to_string()));
        }
        Ok(Self::Contains(normalized))
    }
}

#[derive(Debug, Clone)]
pub struct TaxonomyEntry {
    pub key: String,
    pub label: String,
    pub tone: Tone,
    aliases: Vec<MatchKind>,
}

/// The canonical key, label and tone a status resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification<'a> {
    pub key: &'a str,
    pub label: &'a str,
    pub tone: Tone,
}

impl Classification<'_> {
    pub fn is_unknown(&self) -> bool {
        self.key == UNKNOWN_KEY
    }
}

/// Ordered canonical entries for one domain
#[derive(Debug, Clone, Default)]
pub struct StatusTaxonomy {
    entries: Vec<TaxonomyEntry>,
}

impl StatusTaxonomy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a canonical key; the key and each alias match as substrings
    pub fn entry(mut self, key: &str, label: &str, tone: Tone, aliases: &[&str]) -> Self {
        let matchers = std::iter::once(key)
            .chain(aliases.iter().copied())
            .map(normalize_status)
            .filter(|a| !a.is_empty())
            .map(MatchKind::Contains)
            .collect();
        self.entries.push(TaxonomyEntry {
            key: key.to_string(),
            label: label.to_string(),
            tone,
            aliases: matchers,
        });
        self
    }

    pub fn entries(&self) -> &[TaxonomyEntry] {
        &self.entries
    }

    /// Attach an extra alias to an existing key
    pub fn add_alias(&mut self, key: &str, alias: &str) -> Result<()> {
        let matcher = MatchKind::parse(alias)?;
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.key == key)
            .ok_or_else(|| Error::Config(format!("Unknown taxonomy key: {}", key)))?;
        entry.aliases.push(matcher);
        Ok(())
    }

    /// Attach every alias from a `key -> [alias]` table
    pub fn extend_aliases(&mut self, extra: &BTreeMap<String, Vec<String>>) -> Result<()> {
        for (key, aliases) in extra {
            for alias in aliases {
                self.add_alias(key, alias)?;
            }
        }
        Ok(())
    }

    /// Classify one raw status
    ///
    /// Exact matches win over partial ones. A partial match preceded by a
    /// negation (`unread`, `not_paid`, `inactive`) does not count. Among the
    /// remaining partial matches the longest alias wins; ties keep entry order.
    pub fn classify(&self, status: Option<&str>) -> Classification<'_> {
        let Some(raw) = status.map(str::trim).filter(|s| !s.is_empty()) else {
            return unknown();
        };
        let normalized = normalize_status(raw);
        let lowered = raw.to_lowercase();

        for entry in &self.entries {
            let exact = entry.aliases.iter().any(|alias| match alias {
                MatchKind::Exact(a) | MatchKind::Contains(a) => *a == normalized,
                MatchKind::Regex(_) => false,
            });
            if exact {
                return entry.classification();
            }
        }

        let mut best: Option<(&TaxonomyEntry, usize)> = None;
        for entry in &self.entries {
            for alias in &entry.aliases {
                let strength = match alias {
                    MatchKind::Contains(a) if contains_unnegated(&normalized, a) => a.len(),
                    MatchKind::Regex(re) if re.is_match(&lowered) => 1,
                    _ => continue,
                };
                if best.map_or(true, |(_, s)| strength > s) {
                    best = Some((entry, strength));
                }
            }
        }

        best.map(|(entry, _)| entry.classification())
            .unwrap_or_else(|| unknown())
    }

    /// Count each key over `statuses` and express counts as percentages of
    /// the total
    ///
    /// Only keys with at least one record appear, in taxonomy order with
    /// `unknown` last. An empty input yields a single zero `unknown` segment.
    pub fn summarize<'s, I>(&self, statuses: I) -> Vec<StatusSegment>
    where
        I: IntoIterator<Item = Option<&'s str>>,
    {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        let mut total = 0usize;
        for status in statuses {
            *counts.entry(self.classify(status).key).or_insert(0) += 1;
            total += 1;
        }

        if total == 0 {
            return vec![segment(UNKNOWN_KEY, UNKNOWN_LABEL, Tone::Neutral, 0)];
        }

        let mut segments: Vec<StatusSegment> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let count = counts.get(entry.key.as_str()).copied().unwrap_or(0);
                (count > 0).then(|| segment(&entry.key, &entry.label, entry.tone, count))
            })
            .collect();

        if let Some(&count) = counts.get(UNKNOWN_KEY) {
            segments.push(segment(UNKNOWN_KEY, UNKNOWN_LABEL, Tone::Neutral, count));
        }

        apportion(&mut segments, total);
        segments
    }
}

impl TaxonomyEntry {
    fn classification(&self) -> Classification<'_> {
        Classification {
            key: &self.key,
            label: &self.label,
            tone: self.tone,
        }
    }
}

fn unknown() -> Classification<'static> {
    Classification {
        key: UNKNOWN_KEY,
        label: UNKNOWN_LABEL,
        tone: Tone::Neutral,
    }
}

fn segment(key: &str, label: &str, tone: Tone, count: usize) -> StatusSegment {
    StatusSegment {
        key: key.to_string(),
        label: label.to_string(),
        tone,
        count,
        percentage: 0,
    }
}

/// Whole-number percentages that add up to exactly 100
///
/// Each segment gets the floor of its share, then the leftover points go to
/// the largest remainders (earlier segments first on ties). No segment moves
/// more than one point from its plainly rounded share.
fn apportion(segments: &mut [StatusSegment], total: usize) {
    if total == 0 {
        return;
    }
    let mut remainders: Vec<(usize, usize)> = Vec::with_capacity(segments.len());
    let mut assigned = 0usize;
    for (i, seg) in segments.iter_mut().enumerate() {
        let scaled = seg.count * 100;
        seg.percentage = (scaled / total) as u32;
        assigned += scaled / total;
        remainders.push((i, scaled % total));
    }
    remainders.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    for (i, _) in remainders.into_iter().take(100usize.saturating_sub(assigned)) {
        segments[i].percentage += 1;
    }
}

/// Lowercase with spaces and dashes folded to underscores
/// `alias` occurs in `status` at least once without a negating prefix
///
/// A negation is either a word fragment glued to the alias (`un`, `in`,
/// `non`) or a whole preceding word (`not`, `non`, `never`).
fn contains_unnegated(status: &str, alias: &str) -> bool {
    status.match_indices(alias).any(|(pos, _)| {
        let prefix = &status[..pos];
        let fragment = prefix.rsplit('_').next().unwrap_or("");
        if !fragment.is_empty() {
            return !matches!(fragment, "un" | "in" | "non");
        }
        let previous_word = prefix.trim_end_matches('_').rsplit('_').next().unwrap_or("");
        !matches!(previous_word, "not" | "non" | "never")
    })
}

fn normalize_status(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sessions() -> StatusTaxonomy {
        StatusTaxonomy::new()
            .entry("scheduled", "Scheduled", Tone::Neutral, &[])
            .entry("confirmed", "Confirmed", Tone::Positive, &[])
            .entry(
                "cancelled",
                "Cancelled",
                Tone::Warning,
                &["canceled", "no_show"],
            )
    }

    fn billing() -> StatusTaxonomy {
        StatusTaxonomy::new()
            .entry("paid", "Paid", Tone::Positive, &["settled"])
            .entry("pending", "Pending", Tone::Warning, &["unpaid", "open"])
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        let taxonomy = sessions();
        assert_eq!(taxonomy.classify(Some("SCHEDULED")).key, "scheduled");
        assert_eq!(taxonomy.classify(Some(" Canceled ")).key, "cancelled");
        assert_eq!(taxonomy.classify(Some("No-Show")).key, "cancelled");
        assert_eq!(taxonomy.classify(Some("cancelled_by_client")).key, "cancelled");
    }

    #[test]
    fn test_unmatched_and_missing_are_unknown() {
        let taxonomy = sessions();
        let result = taxonomy.classify(Some("AGENDADO-TYPO"));
        assert!(result.is_unknown());
        assert_eq!(result.tone, Tone::Neutral);
        assert!(taxonomy.classify(None).is_unknown());
        assert!(taxonomy.classify(Some("   ")).is_unknown());
    }

    #[test]
    fn test_longest_partial_alias_wins() {
        let taxonomy = billing();
        assert_eq!(taxonomy.classify(Some("unpaid")).key, "pending");
        assert_eq!(taxonomy.classify(Some("invoice unpaid")).key, "pending");
        assert_eq!(taxonomy.classify(Some("paid_in_full")).key, "paid");
    }

    #[test]
    fn test_negated_status_is_not_its_opposite() {
        let taxonomy = billing();
        assert!(taxonomy.classify(Some("not paid")).is_unknown());
        assert!(taxonomy.classify(Some("never-paid")).is_unknown());
        assert_eq!(taxonomy.classify(Some("paid, not settled")).key, "paid");

        let taxonomy = sessions();
        assert!(taxonomy.classify(Some("unconfirmed")).is_unknown());
        assert!(taxonomy.classify(Some("unscheduled")).is_unknown());
        assert_eq!(taxonomy.classify(Some("rescheduled")).key, "scheduled");
    }

    #[test]
    fn test_contains_unnegated() {
        assert!(contains_unnegated("read", "read"));
        assert!(contains_unnegated("read_twice", "read"));
        assert!(!contains_unnegated("unread", "read"));
        assert!(!contains_unnegated("not_read", "read"));
        assert!(!contains_unnegated("inactive", "active"));
        assert!(contains_unnegated("unread_then_read", "read"));
    }

    #[test]
    fn test_summarize_counts_unknown_last() {
        let taxonomy = sessions();
        let segments =
            taxonomy.summarize([Some("scheduled"), Some("Scheduled"), Some("AGENDADO-TYPO")]);

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].key, "scheduled");
        assert_eq!(segments[0].count, 2);
        assert_eq!(segments[0].percentage, 67);
        assert_eq!(segments[1].key, UNKNOWN_KEY);
        assert_eq!(segments[1].count, 1);
        assert_eq!(segments[1].percentage, 33);
    }

    #[test]
    fn test_percentages_close_to_hundred() {
        let taxonomy = StatusTaxonomy::new()
            .entry("a", "A", Tone::Neutral, &[])
            .entry("b", "B", Tone::Neutral, &[])
            .entry("c", "C", Tone::Neutral, &[])
            .entry("d", "D", Tone::Neutral, &[])
            .entry("e", "E", Tone::Neutral, &[]);
        let statuses = [Some("a"), Some("b"), Some("c"), Some("d"), Some("e"), Some("zzz")];
        let segments = taxonomy.summarize(statuses);

        assert_eq!(segments.len(), 6);
        let sum: u32 = segments.iter().map(|s| s.percentage).sum();
        assert_eq!(sum, 100);
        assert!(segments.iter().all(|s| s.percentage == 16 || s.percentage == 17));
    }

    #[test]
    fn test_summarize_empty() {
        let segments = sessions().summarize(std::iter::empty());
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].key, UNKNOWN_KEY);
        assert_eq!(segments[0].count, 0);
        assert_eq!(segments[0].percentage, 0);
    }

    #[test]
    fn test_config_aliases() {
        let mut taxonomy = sessions();
        taxonomy.add_alias("scheduled", "agendado").unwrap();
        taxonomy.add_alias("cancelled", "/^desmarcad[oa]$/").unwrap();
        taxonomy.add_alias("confirmed", "=ok").unwrap();

        assert_eq!(taxonomy.classify(Some("Agendado")).key, "scheduled");
        assert_eq!(taxonomy.classify(Some("DESMARCADA")).key, "cancelled");
        assert_eq!(taxonomy.classify(Some("OK")).key, "confirmed");
        assert!(taxonomy.classify(Some("not ok")).is_unknown());
        assert!(taxonomy.add_alias("missing", "x").is_err());
        assert!(matches!(
            taxonomy.add_alias("scheduled", "/([/"),
            Err(Error::Regex(_))
        ));
    }
}
