//! Raw row normalization
//!
//! Upstream rows come from hand-edited imports and partially migrated
//! schemas, so field names and value shapes disagree. All knowledge of
//! "which field means what" lives here: each target field has an ordered
//! list of candidate keys and the first present, non-empty one wins.
//!
//! Nothing in this module fails. A value that cannot be parsed degrades to
//! its null/zero default and the rest of the row is still used.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use tracing::debug;

use crate::models::{DomainRecord, RawRow, Timestamp};

/// How the sign of an amount is decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountSign {
    /// Use the parsed value as-is
    AsIs,
    /// Amounts are unsigned; a kind field says which direction they go
    FromKind {
        keys: &'static [&'static str],
        debit: &'static [&'static str],
        credit: &'static [&'static str],
    },
}

/// Ordered candidate keys for every canonical field
///
/// Keys may be dotted paths (`trainer.name`) to reach into joined objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldHints {
    pub id: &'static [&'static str],
    /// Most specific event time first, creation time last
    pub occurred_at: &'static [&'static str],
    pub updated_at: &'static [&'static str],
    pub amount: &'static [&'static str],
    pub status: &'static [&'static str],
    pub category: &'static [&'static str],
    pub owner_id: &'static [&'static str],
    pub owner_label: &'static [&'static str],
    pub counterpart_id: &'static [&'static str],
    pub title: &'static [&'static str],
    /// Every present key here feeds search tokens (not only the first)
    pub text: &'static [&'static str],
    pub sign: AmountSign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NormalizeOptions {
    /// Read ambiguous `01/02/2026` as 1 February rather than January 2
    pub day_first: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self { day_first: true }
    }
}

/// Normalize one raw row
pub fn normalize(raw: &RawRow, hints: &FieldHints, options: &NormalizeOptions) -> DomainRecord {
    let id = first_text(raw, hints.id).unwrap_or_else(|| derive_id(raw, hints));

    let occurred_at = first_present(raw, hints.occurred_at)
        .and_then(|v| parse_timestamp(v, options.day_first));
    let updated_at = first_present(raw, hints.updated_at)
        .and_then(|v| parse_timestamp(v, options.day_first));

    let amount = first_present(raw, hints.amount)
        .and_then(parse_amount)
        .unwrap_or(0.0);
    let amount = apply_sign(raw, amount, hints.sign);

    let mut text = String::new();
    for key in hints.text {
        if let Some(value) = lookup(raw, key).and_then(value_text) {
            text.push_str(&value);
            text.push(' ');
        }
    }

    DomainRecord {
        id,
        occurred_at,
        updated_at,
        amount,
        status: first_text(raw, hints.status),
        category: first_text(raw, hints.category),
        owner_id: first_text(raw, hints.owner_id),
        owner_label: first_text(raw, hints.owner_label),
        counterpart_id: first_text(raw, hints.counterpart_id),
        title: first_text(raw, hints.title),
        search_tokens: tokenize(&text),
    }
}

/// Normalize a batch, dropping rows whose id repeats an earlier row's
pub fn normalize_batch(
    rows: &[RawRow],
    hints: &FieldHints,
    options: &NormalizeOptions,
) -> Vec<DomainRecord> {
    let mut seen = HashSet::with_capacity(rows.len());
    let mut records = Vec::with_capacity(rows.len());

    for raw in rows {
        let record = normalize(raw, hints, options);
        if seen.insert(record.id.clone()) {
            records.push(record);
        }
    }

    let dropped = rows.len() - records.len();
    if dropped > 0 {
        debug!(dropped, "Dropped duplicate rows during normalization");
    }
    debug!(rows = rows.len(), records = records.len(), "Normalized batch");

    records
}

/// Lower-cased, whitespace-split terms with edge punctuation trimmed
pub fn tokenize(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.split_whitespace()
        .map(|t| {
            t.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Parse a timestamp from a string (ISO or common local formats) or an
/// epoch number (seconds or milliseconds)
pub fn parse_timestamp(value: &Value, day_first: bool) -> Option<Timestamp> {
    match value {
        Value::Number(n) => n.as_i64().and_then(from_epoch),
        Value::String(s) => parse_timestamp_str(s, day_first),
        _ => None,
    }
}

fn from_epoch(n: i64) -> Option<Timestamp> {
    let parsed = if n.abs() >= 100_000_000_000 {
        DateTime::from_timestamp_millis(n)
    } else {
        DateTime::from_timestamp(n, 0)
    };
    parsed.filter(plausible_year)
}

fn parse_timestamp_str(s: &str, day_first: bool) -> Option<Timestamp> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if s.chars().all(|c| c.is_ascii_digit()) && s.len() >= 9 {
        return s.parse::<i64>().ok().and_then(from_epoch);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc)).filter(plausible_year);
    }

    // Postgres-style text with a short offset: 2026-01-15 10:00:00+00
    let offset_formats = ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%d %H:%M:%S%#z"];
    for fmt in offset_formats {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc)).filter(plausible_year);
        }
    }

    let iso_naive = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in iso_naive {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc()).filter(plausible_year);
        }
    }

    let day_month = [
        "%d/%m/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M",
        "%d/%m/%Y",
        "%d-%m-%Y",
        "%d.%m.%Y",
    ];
    let month_day = ["%m/%d/%Y %H:%M:%S", "%m/%d/%Y %H:%M", "%m/%d/%Y", "%m-%d-%Y"];
    let (first, second) = if day_first {
        (&day_month[..], &month_day[..])
    } else {
        (&month_day[..], &day_month[..])
    };

    for fmt in std::iter::once("%Y-%m-%d").chain(first.iter().copied()).chain(second.iter().copied()) {
        if fmt.contains("%H") {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                if let Some(ts) = Some(dt.and_utc()).filter(plausible_year) {
                    return Some(ts);
                }
            }
        } else if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            if let Some(ts) = Some(date.and_time(NaiveTime::MIN).and_utc()).filter(plausible_year) {
                return Some(ts);
            }
        }
    }

    None
}

fn plausible_year(ts: &Timestamp) -> bool {
    (1900..=2200).contains(&ts.year())
}

/// Parse an amount from a number or a locale-formatted string
pub fn parse_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_amount_str(s),
        _ => None,
    }
}

fn parse_amount_str(s: &str) -> Option<f64> {
    let s = s.trim();
    let parenthesized = s.starts_with('(') && s.ends_with(')');

    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | '+'))
        .collect();
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let last_comma = cleaned.rfind(',');
    let last_dot = cleaned.rfind('.');
    let canonical = match (last_comma, last_dot) {
        // Whichever separator comes last is the decimal point
        (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(c), None) => {
            let decimals = cleaned.len() - c - 1;
            if cleaned.matches(',').count() == 1 && decimals != 3 {
                cleaned.replace(',', ".")
            } else {
                cleaned.replace(',', "")
            }
        }
        (None, Some(_)) if cleaned.matches('.').count() > 1 => cleaned.replace('.', ""),
        _ => cleaned,
    };

    let value = canonical.parse::<f64>().ok().filter(|v| v.is_finite())?;
    Some(if parenthesized { -value.abs() } else { value })
}

fn apply_sign(raw: &RawRow, amount: f64, sign: AmountSign) -> f64 {
    match sign {
        AmountSign::AsIs => amount,
        AmountSign::FromKind { keys, debit, credit } => {
            let Some(kind) = first_text(raw, keys).map(|k| k.to_lowercase()) else {
                return amount;
            };
            if debit.iter().any(|d| *d == kind) {
                -amount.abs()
            } else if credit.iter().any(|c| *c == kind) {
                amount.abs()
            } else {
                amount
            }
        }
    }
}

/// Hash of the fields that identify a row's content; `updated_at` is left
/// out so edits to a row without an id do not change its identity
fn derive_id(raw: &RawRow, hints: &FieldHints) -> String {
    let stable = [
        hints.occurred_at,
        hints.amount,
        hints.status,
        hints.category,
        hints.owner_id,
        hints.counterpart_id,
        hints.title,
        hints.text,
    ];

    let mut hasher = Sha256::new();
    for keys in stable {
        if let Some(value) = first_present(raw, keys) {
            hasher.update(value.to_string().as_bytes());
        }
        hasher.update([0x1f]);
    }
    let digest = hex::encode(hasher.finalize());
    format!("gen-{}", &digest[..16])
}

/// Literal key first, then a dotted path into nested objects
fn lookup<'a>(raw: &'a RawRow, key: &str) -> Option<&'a Value> {
    if let Some(value) = raw.get(key) {
        return Some(value);
    }
    if !key.contains('.') {
        return None;
    }
    let mut parts = key.split('.');
    let mut current = raw.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

fn first_present<'a>(raw: &'a RawRow, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| lookup(raw, key))
        .find(|value| is_present(value))
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn first_text(raw: &RawRow, keys: &[&str]) -> Option<String> {
    first_present(raw, keys).and_then(value_text)
}
