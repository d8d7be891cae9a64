//! Time bucketing
//!
//! The grid is built from the window alone, then records are folded into it.
//! Bucket `i` covers `[start + i*g, start + (i+1)*g)`; a record exactly at
//! `end` belongs to the last bucket.

use std::collections::BTreeMap;

use crate::format::Formatter;
use crate::models::{
    DomainRecord, Granularity, Timestamp, TimelinePoint, Trend, TrendDirection, Window,
};

/// Named amounts a single record adds to its bucket
pub type Contribution = Vec<(&'static str, f64)>;

/// Build the zero-filled grid for `window`, then accumulate each dated,
/// in-window record's contribution
///
/// Every point carries every name in `metric_names`, even when nothing
/// contributed to it. Output is chronological.
pub fn bucket<F>(
    records: &[DomainRecord],
    window: &Window,
    metric_names: &[&str],
    formatter: &Formatter,
    classify: F,
) -> Vec<TimelinePoint>
where
    F: Fn(&DomainRecord) -> Contribution,
{
    let mut points = grid(window, metric_names, formatter);

    for record in records {
        let Some(at) = record.occurred_at else {
            continue;
        };
        let Some(index) = bucket_index(window, at) else {
            continue;
        };
        let metrics = &mut points[index].metrics;
        for (name, value) in classify(record) {
            if value.is_finite() {
                *metrics.entry(name.to_string()).or_insert(0.0) += value;
            }
        }
    }

    points
}

fn grid(window: &Window, metric_names: &[&str], formatter: &Formatter) -> Vec<TimelinePoint> {
    let step = window.granularity.duration();
    let empty: BTreeMap<String, f64> = metric_names
        .iter()
        .map(|name| (name.to_string(), 0.0))
        .collect();

    (0..window.bucket_count())
        .map(|i| {
            let start = window.start + step * i as i32;
            let (bucket_key, label) = match window.granularity {
                Granularity::Day => (
                    start.format("%Y-%m-%d").to_string(),
                    formatter.day_label(start),
                ),
                Granularity::Week => (
                    start.format("%G-W%V").to_string(),
                    formatter.week_label(start),
                ),
            };
            TimelinePoint {
                bucket_key,
                label,
                metrics: empty.clone(),
                balance: None,
            }
        })
        .collect()
}

/// Grid slot for `at`, or `None` outside `[start, end]`
pub fn bucket_index(window: &Window, at: Timestamp) -> Option<usize> {
    if !window.contains(at) {
        return None;
    }
    let step = window.granularity.duration().num_milliseconds();
    let offset = (at - window.start).num_milliseconds();
    let index = (offset / step) as usize;
    Some(index.min(window.bucket_count() - 1))
}

/// Fill in `balance` on every point by replaying signed amounts from an
/// anchor
///
/// `current_balance` is taken as the balance at the close of the window.
/// The replay starts at `current_balance - net` where `net` sums every dated
/// record up to the window end, so the last point reproduces the anchor
/// exactly. Amounts are replayed in whole cents.
pub fn apply_running_balance(
    points: &mut [TimelinePoint],
    records: &[DomainRecord],
    window: &Window,
    current_balance: f64,
) {
    let mut deltas: Vec<(Timestamp, i64)> = records
        .iter()
        .filter_map(|r| {
            r.occurred_at
                .filter(|at| *at <= window.end)
                .map(|at| (at, to_cents(r.amount)))
        })
        .collect();
    deltas.sort_by_key(|(at, _)| *at);

    let anchor = to_cents(current_balance);
    let net: i64 = deltas.iter().map(|(_, cents)| cents).sum();
    let mut running = anchor - net;

    let step = window.granularity.duration();
    let last = points.len().saturating_sub(1);
    let mut pending = deltas.iter().peekable();

    for (i, point) in points.iter_mut().enumerate() {
        let close = window.start + step * (i as i32 + 1);
        while let Some((at, cents)) = pending.peek() {
            if i == last || *at < close {
                running += cents;
                pending.next();
            } else {
                break;
            }
        }
        point.balance = Some(running as f64 / 100.0);
    }
}

fn to_cents(amount: f64) -> i64 {
    if amount.is_finite() {
        (amount * 100.0).round() as i64
    } else {
        0
    }
}

/// Compare `metric` over the second half of the timeline with the first
///
/// The middle point of an odd-length timeline belongs to neither half.
/// Returns `None` when there is nothing to compare.
pub fn trend(points: &[TimelinePoint], metric: &str) -> Option<Trend> {
    if points.len() < 2 {
        return None;
    }
    let half = points.len() / 2;
    let earlier: f64 = points[..half].iter().map(|p| p.metric(metric)).sum();
    let later: f64 = points[points.len() - half..]
        .iter()
        .map(|p| p.metric(metric))
        .sum();

    if earlier == 0.0 && later == 0.0 {
        return None;
    }
    if earlier == 0.0 {
        return Some(Trend {
            direction: TrendDirection::Up,
            label: "new this period".to_string(),
        });
    }

    let change = (later - earlier) / earlier.abs() * 100.0;
    let (direction, label) = if change.abs() < 1.0 {
        (TrendDirection::Flat, "flat vs prior period".to_string())
    } else if change > 0.0 {
        (TrendDirection::Up, format!("+{:.0}% vs prior period", change))
    } else {
        (TrendDirection::Down, format!("{:.0}% vs prior period", change))
    };
    Some(Trend { direction, label })
}
