//! Search highlights

use crate::models::{Highlight, Tone};

use super::engine::{Aggregates, HighlightRule};

fn active_query<'a>(ctx: &Aggregates<'a>) -> Option<&'a str> {
    ctx.query.map(str::trim).filter(|q| !q.is_empty())
}

pub struct NoMatches;

impl HighlightRule for NoMatches {
    fn id(&self) -> &'static str {
        "search-no-matches"
    }

    fn priority(&self) -> u8 {
        70
    }

    fn evaluate(&self, ctx: &Aggregates<'_>) -> Option<Highlight> {
        let query = active_query(ctx)?;
        if ctx.batch_size == 0 || !ctx.rows.is_empty() {
            return None;
        }
        Some(Highlight::new(
            self.id(),
            Tone::Warning,
            "No matches",
            format!(
                "Nothing among {} records matches \"{}\".",
                ctx.formatter.count(ctx.batch_size),
                query
            ),
        ))
    }
}

pub struct TopMatch;

impl HighlightRule for TopMatch {
    fn id(&self) -> &'static str {
        "search-top-match"
    }

    fn priority(&self) -> u8 {
        50
    }

    fn evaluate(&self, ctx: &Aggregates<'_>) -> Option<Highlight> {
        active_query(ctx)?;
        let top = ctx.rows.first()?;
        let kind = top
            .category
            .as_deref()
            .map(|c| format!(" ({})", c))
            .unwrap_or_default();
        Some(
            Highlight::new(
                self.id(),
                Tone::Neutral,
                "Top match",
                format!(
                    "{}{}, active {}. {} results in total.",
                    top.title,
                    kind,
                    top.activity_display,
                    ctx.formatter.count(ctx.rows.len())
                ),
            )
            .with_meta(top.id.clone()),
        )
    }
}
