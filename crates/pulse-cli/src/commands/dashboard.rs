//! Dashboard command and report rendering

use std::fmt::Write as _;
use std::path::Path;

use anyhow::Result;
use chrono::Duration;
use pulse_core::{DashboardEnvelope, Formatter, SourceTag, TimelinePoint};

use super::{build_request, load_batch, open_assembler, parse_domain, tone_icon, truncate};
use crate::cli::{SourceArgs, ViewArgs};

pub const REFERENCE_BANNER: &str = "Live data unavailable, showing reference data";

pub async fn cmd_dashboard(
    config_path: Option<&Path>,
    domain: &str,
    source: &SourceArgs,
    view: &ViewArgs,
) -> Result<()> {
    let domain = parse_domain(domain)?;
    let asm = open_assembler(config_path)?;
    let request = build_request(&asm, view, None)?;

    let batch = load_batch(source, domain).await;
    let envelope = asm.assemble(domain, &batch, &request);

    if view.json {
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    } else {
        print!("{}", render_dashboard(&envelope, asm.formatter()));
    }
    Ok(())
}

/// Header with the window and, for reference data, the banner
pub(crate) fn render_header(out: &mut String, envelope: &DashboardEnvelope, fmt: &Formatter) {
    let window = &envelope.window;
    let last_instant = window.end - Duration::seconds(1);

    let _ = writeln!(out);
    let _ = writeln!(out, "📊 {} Dashboard", envelope.domain.label());
    let _ = writeln!(
        out,
        "   Window: {} to {} (by {})",
        fmt.date(window.start),
        fmt.date(last_instant.max(window.start)),
        window.granularity.as_str()
    );
    if envelope.source == SourceTag::Fallback {
        let _ = writeln!(out, "   ⚠️  {}", REFERENCE_BANNER);
    }
    let _ = writeln!(
        out,
        "   ─────────────────────────────────────────────────────────────"
    );
}

pub(crate) fn render_highlights(out: &mut String, envelope: &DashboardEnvelope) {
    let _ = writeln!(out);
    let _ = writeln!(out, "   Highlights");
    for highlight in &envelope.highlights {
        let _ = writeln!(
            out,
            "   {} {}: {}",
            tone_icon(highlight.tone),
            highlight.title,
            highlight.description
        );
    }
}

pub(crate) fn render_page_footer(out: &mut String, envelope: &DashboardEnvelope) {
    let page = &envelope.rows;
    if page.total == 0 {
        return;
    }
    let _ = writeln!(
        out,
        "   Page {} of {} ({} rows)",
        page.page,
        page.total_pages.max(1),
        page.total
    );
}

/// Plain-text report for one envelope
pub fn render_dashboard(envelope: &DashboardEnvelope, fmt: &Formatter) -> String {
    let mut out = String::new();
    render_header(&mut out, envelope, fmt);

    for metric in &envelope.hero {
        let mut line = format!("   {:22} {:>16}", metric.label, metric.value);
        if let Some(trend) = &metric.trend {
            line.push_str(&format!("  {}", trend.label));
        }
        if let Some(hint) = &metric.hint {
            line.push_str(&format!("  ({})", hint));
        }
        let _ = writeln!(out, "{}", line);
    }

    render_highlights(&mut out, envelope);

    let _ = writeln!(out);
    let _ = writeln!(out, "   {:20} │ {:>6} │ {:>5}", "Status", "Count", "%");
    let _ = writeln!(out, "   ─────────────────────┼────────┼──────");
    for segment in &envelope.statuses {
        let _ = writeln!(
            out,
            "   {:20} │ {:>6} │ {:>4}%",
            truncate(&segment.label, 20),
            segment.count,
            segment.percentage
        );
    }

    render_timeline(&mut out, &envelope.timeline, fmt);

    let _ = writeln!(out);
    if envelope.rows.items.is_empty() {
        let _ = writeln!(out, "   No records in this view.");
        return out;
    }
    let _ = writeln!(
        out,
        "   {:12} │ {:28} │ {:12} │ {:>14} │ {}",
        "ID", "Title", "Status", "Amount", "Activity"
    );
    let _ = writeln!(
        out,
        "   ─────────────┼──────────────────────────────┼──────────────┼────────────────┼──────────"
    );
    for row in &envelope.rows.items {
        let _ = writeln!(
            out,
            "   {:12} │ {:28} │ {:12} │ {:>14} │ {}",
            truncate(&row.id, 12),
            truncate(&row.title, 28),
            truncate(&row.status_label, 12),
            row.amount_display,
            row.activity_display
        );
    }
    render_page_footer(&mut out, envelope);
    out
}

/// Non-empty buckets only; a running balance is always shown
fn render_timeline(out: &mut String, timeline: &[TimelinePoint], fmt: &Formatter) {
    let has_balance = timeline.iter().any(|p| p.balance.is_some());
    let shown: Vec<&TimelinePoint> = timeline
        .iter()
        .filter(|p| has_balance || p.metrics.values().any(|v| *v != 0.0))
        .collect();

    let _ = writeln!(out);
    let _ = writeln!(out, "   Timeline");
    if shown.is_empty() {
        let _ = writeln!(out, "   No activity in this window.");
        return;
    }

    for point in &shown {
        let metrics: Vec<String> = point
            .metrics
            .iter()
            .map(|(name, value)| format!("{}={}", name, trim_number(*value)))
            .collect();
        let balance = point
            .balance
            .map(|b| format!("  balance {}", fmt.currency(b)))
            .unwrap_or_default();
        let _ = writeln!(out, "   {:18} {}{}", point.label, metrics.join(" "), balance);
    }

    let hidden = timeline.len() - shown.len();
    if hidden > 0 {
        let _ = writeln!(out, "   ({} empty buckets hidden)", hidden);
    }
}

fn trim_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}
