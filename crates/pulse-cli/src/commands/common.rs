//! Shared command utilities

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use pulse_core::{
    fetch_or_fallback, fallback_rows, Assembler, DashboardRequest, DataSource, Domain,
    EngineConfig, FileSource, Granularity, HttpSource, PageRequest, SourceBatch, Timestamp,
    Tone, Window, MAX_WINDOW_BUCKETS,
};

use crate::cli::{SourceArgs, ViewArgs};

/// Load the engine config: explicit path, data-dir override, or built-in values
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => EngineConfig::load().context("Failed to load config")?,
    };
    Ok(config)
}

/// Build an assembler from the resolved config
pub fn open_assembler(config_path: Option<&Path>) -> Result<Assembler> {
    let config = load_config(config_path)?;
    Assembler::new(config).context("Invalid taxonomy aliases in config")
}

pub fn parse_domain(name: &str) -> Result<Domain> {
    name.parse::<Domain>().map_err(anyhow::Error::msg)
}

/// The source selected by flags or environment, if any
pub fn select_source(args: &SourceArgs) -> Option<Box<dyn DataSource>> {
    if let Some(path) = &args.input {
        return Some(Box::new(FileSource::new(path)));
    }
    if let Some(url) = &args.url {
        return Some(Box::new(HttpSource::new(url, args.key.as_deref())));
    }
    HttpSource::from_env().map(|s| Box::new(s) as Box<dyn DataSource>)
}

/// Fetch the batch for `domain`, falling back to reference data
pub async fn load_batch(args: &SourceArgs, domain: Domain) -> SourceBatch {
    match select_source(args) {
        Some(source) => {
            tracing::debug!(source = source.name(), domain = %domain, "Fetching rows");
            fetch_or_fallback(source.as_ref(), domain).await
        }
        None => {
            tracing::info!("No data source configured, showing reference data");
            SourceBatch::Fallback(fallback_rows(domain))
        }
    }
}

/// `--now` as an instant, or the current time
pub fn parse_now(now: Option<&str>) -> Result<Timestamp> {
    match now {
        Some(s) => {
            let parsed = DateTime::parse_from_rfc3339(s)
                .with_context(|| format!("Invalid --now '{}' (use RFC 3339, e.g. 2026-10-16T12:00:00Z)", s))?;
            Ok(parsed.with_timezone(&Utc))
        }
        None => Ok(Utc::now()),
    }
}

fn parse_day(s: &str, flag: &str) -> Result<Timestamp> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid {} date format (use YYYY-MM-DD)", flag))?;
    Ok(date.and_time(NaiveTime::MIN).and_utc())
}

/// Resolve the dashboard window from flags, falling back to the configured default
pub fn resolve_window(asm: &Assembler, view: &ViewArgs, now: Timestamp) -> Result<Window> {
    let granularity = match view.granularity.as_deref() {
        Some(g) => g.parse::<Granularity>().map_err(anyhow::Error::msg)?,
        None => asm.config().window.granularity,
    };

    if let (Some(from), Some(to)) = (view.from.as_deref(), view.to.as_deref()) {
        let start = parse_day(from, "--from")?;
        // --to is inclusive: the window runs to the end of that day
        let end = parse_day(to, "--to")? + Duration::days(1);
        if end <= start {
            anyhow::bail!("--from {} is after --to {}", from, to);
        }
        let window = Window::new(start, end, granularity);
        if window.bucket_count() > MAX_WINDOW_BUCKETS as usize {
            anyhow::bail!(
                "--from {} to --to {} spans more than {} {}s",
                from,
                to,
                MAX_WINDOW_BUCKETS,
                granularity.as_str()
            );
        }
        return Ok(window);
    }

    let days = view.days.unwrap_or(asm.config().window.days);
    if days == 0 {
        anyhow::bail!("--days must be at least 1");
    }
    if days > MAX_WINDOW_BUCKETS {
        anyhow::bail!("--days must be at most {}", MAX_WINDOW_BUCKETS);
    }
    let buckets = match granularity {
        Granularity::Day => days,
        Granularity::Week => days.div_ceil(7),
    };
    Ok(Window::trailing(now, buckets, granularity))
}

/// Turn view flags into an engine request
pub fn build_request(
    asm: &Assembler,
    view: &ViewArgs,
    query: Option<&str>,
) -> Result<DashboardRequest> {
    let now = parse_now(view.now.as_deref())?;
    let window = resolve_window(asm, view, now)?;
    let per_page = view.per_page.unwrap_or(asm.config().display.page_size);

    let mut request = DashboardRequest::new(now, window)
        .with_page(PageRequest::new(view.page, per_page));
    if let Some(query) = query {
        request = request.with_query(query);
    }
    if let Some(balance) = view.balance {
        request = request.with_balance(balance);
    }
    Ok(request)
}

pub fn tone_icon(tone: Tone) -> &'static str {
    match tone {
        Tone::Positive => "✅",
        Tone::Neutral => "•",
        Tone::Warning => "⚠️",
        Tone::Critical => "🚨",
    }
}
