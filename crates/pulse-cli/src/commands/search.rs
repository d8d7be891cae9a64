//! Search command

use std::fmt::Write as _;
use std::path::Path;

use anyhow::Result;
use pulse_core::{DashboardEnvelope, Domain, Formatter};

use super::dashboard::{render_header, render_highlights, render_page_footer};
use super::{build_request, load_batch, open_assembler, truncate};
use crate::cli::{SourceArgs, ViewArgs};

pub async fn cmd_search(
    config_path: Option<&Path>,
    query: &str,
    source: &SourceArgs,
    view: &ViewArgs,
) -> Result<()> {
    let asm = open_assembler(config_path)?;
    let request = build_request(&asm, view, Some(query))?;

    let batch = load_batch(source, Domain::Search).await;
    let envelope = asm.assemble(Domain::Search, &batch, &request);

    if view.json {
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    } else {
        print!("{}", render_search(&envelope, asm.formatter()));
    }
    Ok(())
}

/// Ranked results with their scores
pub fn render_search(envelope: &DashboardEnvelope, fmt: &Formatter) -> String {
    let mut out = String::new();
    render_header(&mut out, envelope, fmt);

    match envelope.query.as_deref() {
        Some(query) => {
            let _ = writeln!(
                out,
                "   {} results for \"{}\"",
                fmt.count(envelope.rows.total),
                query
            );
        }
        None => {
            let _ = writeln!(out, "   {} records", fmt.count(envelope.rows.total));
        }
    }

    render_highlights(&mut out, envelope);

    let _ = writeln!(out);
    if envelope.rows.items.is_empty() {
        let _ = writeln!(out, "   No matches.");
        return out;
    }
    let _ = writeln!(
        out,
        "   {:>6} │ {:30} │ {:10} │ {}",
        "Score", "Title", "Kind", "Activity"
    );
    let _ = writeln!(
        out,
        "   ───────┼────────────────────────────────┼────────────┼──────────"
    );
    for row in &envelope.rows.items {
        let score = row
            .score
            .map(|s| format!("{:.1}", s))
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "   {:>6} │ {:30} │ {:10} │ {}",
            score,
            truncate(&row.title, 30),
            truncate(row.category.as_deref().unwrap_or("-"), 10),
            row.activity_display
        );
    }
    render_page_footer(&mut out, envelope);
    out
}
