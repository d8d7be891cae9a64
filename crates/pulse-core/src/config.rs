//! Engine configuration
//!
//! Display conventions, scoring weights, highlight thresholds and extra
//! taxonomy aliases.
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. An explicit path, else `PULSE_CONFIG`, else the override in the data
//!    dir (~/.local/share/pulse/config/engine.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Keys missing from a file keep their defaults.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::format::Locale;
use crate::models::{Domain, Granularity, PageRequest, MAX_WINDOW_BUCKETS};
use crate::normalize::NormalizeOptions;
use crate::ranking::{RecencyTier, ScoringWeights};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/engine.toml");

pub const MIN_HIGHLIGHTS: usize = 4;
pub const MAX_HIGHLIGHTS: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayConfig {
    pub locale: Locale,
    pub page_size: usize,
    /// Highlights returned per dashboard, within 4..=6
    pub highlight_cap: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            locale: Locale::EnUs,
            page_size: 20,
            highlight_cap: MIN_HIGHLIGHTS,
        }
    }
}

/// Window used when a caller does not pick one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowDefaults {
    pub days: u32,
    pub granularity: Granularity,
}

impl Default for WindowDefaults {
    fn default() -> Self {
        Self {
            days: 30,
            granularity: Granularity::Day,
        }
    }
}

/// Constants behind the highlight rules
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thresholds {
    /// Active plans untouched for longer than this are stale
    pub stale_plan_days: i64,
    /// Cancelled share of sessions that warrants a warning
    pub cancellation_rate_pct: f64,
    /// Wallet balance below this is flagged
    pub low_balance: f64,
    /// Unread notifications before the backlog is flagged
    pub unread_backlog: usize,
    /// How far ahead unconfirmed sessions are looked for
    pub upcoming_unconfirmed_hours: i64,
    pub healthy_collection_rate_pct: f64,
    pub healthy_read_rate_pct: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            stale_plan_days: 35,
            cancellation_rate_pct: 20.0,
            low_balance: 50.0,
            unread_backlog: 10,
            upcoming_unconfirmed_hours: 48,
            healthy_collection_rate_pct: 80.0,
            healthy_read_rate_pct: 60.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineConfig {
    pub display: DisplayConfig,
    pub window: WindowDefaults,
    pub normalize: NormalizeOptions,
    pub search: ScoringWeights,
    pub thresholds: Thresholds,
    /// Extra aliases per domain: canonical key -> aliases
    pub taxonomy: BTreeMap<Domain, BTreeMap<String, Vec<String>>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            display: DisplayConfig::default(),
            window: WindowDefaults::default(),
            normalize: NormalizeOptions::default(),
            search: ScoringWeights::default(),
            thresholds: Thresholds::default(),
            taxonomy: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    /// Load from the data-dir override, or the embedded defaults
    pub fn load() -> Result<Self> {
        load_config(None)
    }

    /// Load from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        load_config(Some(path))
    }

    /// The embedded defaults
    pub fn embedded() -> Result<Self> {
        parse_config(DEFAULT_CONFIG)
    }

    pub fn parse(content: &str) -> Result<Self> {
        parse_config(content)
    }

    pub fn page_request(&self, page: usize) -> PageRequest {
        PageRequest::new(page, self.display.page_size)
    }

    pub fn aliases_for(&self, domain: Domain) -> Option<&BTreeMap<String, Vec<String>>> {
        self.taxonomy.get(&domain)
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("pulse").join("config").join("engine.toml"))
}

/// The file a load would read, or `None` for the embedded defaults
///
/// Without an explicit path, `PULSE_CONFIG` is checked before the data dir.
pub fn resolve_config_path(override_path: Option<&Path>) -> Option<PathBuf> {
    match override_path {
        Some(path) => Some(path.to_path_buf()).filter(|p| p.exists()),
        None => std::env::var_os("PULSE_CONFIG")
            .map(PathBuf::from)
            .filter(|p| p.exists())
            .or_else(|| default_config_path().filter(|p| p.exists())),
    }
}

/// Load configuration (override first, then default)
fn load_config(override_path: Option<&Path>) -> Result<EngineConfig> {
    if let Some(path) = override_path {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
    }

    let content = match resolve_config_path(override_path) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Loading engine config");
            fs::read_to_string(&path)
                .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?
        }
        None => DEFAULT_CONFIG.to_string(),
    };

    parse_config(&content)
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    display: Option<RawDisplay>,
    window: Option<RawWindow>,
    normalize: Option<RawNormalize>,
    search: Option<RawSearch>,
    thresholds: Option<RawThresholds>,
    taxonomy: Option<BTreeMap<String, BTreeMap<String, Vec<String>>>>,
}

#[derive(Debug, Deserialize)]
struct RawDisplay {
    locale: Option<String>,
    page_size: Option<usize>,
    highlight_cap: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawWindow {
    days: Option<u32>,
    granularity: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawNormalize {
    day_first: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawSearch {
    base: Option<f64>,
    exact: Option<f64>,
    prefix: Option<f64>,
    substring: Option<f64>,
    recency: Option<Vec<RecencyTier>>,
    category_weights: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Deserialize)]
struct RawThresholds {
    stale_plan_days: Option<i64>,
    cancellation_rate_pct: Option<f64>,
    low_balance: Option<f64>,
    unread_backlog: Option<usize>,
    upcoming_unconfirmed_hours: Option<i64>,
    healthy_collection_rate_pct: Option<f64>,
    healthy_read_rate_pct: Option<f64>,
}

/// Parse config from TOML content
fn parse_config(content: &str) -> Result<EngineConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = EngineConfig::default();

    if let Some(display) = raw.display {
        if let Some(locale) = display.locale {
            config.display.locale = locale.parse().map_err(Error::Config)?;
        }
        if let Some(size) = display.page_size {
            config.display.page_size = size.clamp(1, PageRequest::MAX_PER_PAGE);
        }
        if let Some(cap) = display.highlight_cap {
            config.display.highlight_cap = cap.clamp(MIN_HIGHLIGHTS, MAX_HIGHLIGHTS);
        }
    }

    if let Some(window) = raw.window {
        if let Some(days) = window.days {
            config.window.days = days.clamp(1, MAX_WINDOW_BUCKETS);
        }
        if let Some(granularity) = window.granularity {
            config.window.granularity = granularity.parse().map_err(Error::Config)?;
        }
    }

    if let Some(normalize) = raw.normalize {
        if let Some(day_first) = normalize.day_first {
            config.normalize.day_first = day_first;
        }
    }

    if let Some(search) = raw.search {
        let weights = &mut config.search;
        if let Some(base) = search.base {
            weights.base = base;
        }
        if let Some(exact) = search.exact {
            weights.exact = exact;
        }
        if let Some(prefix) = search.prefix {
            weights.prefix = prefix;
        }
        if let Some(substring) = search.substring {
            weights.substring = substring;
        }
        if let Some(mut recency) = search.recency {
            recency.sort_by(|a, b| a.max_days.total_cmp(&b.max_days));
            weights.recency = recency;
        }
        if let Some(categories) = search.category_weights {
            for (category, weight) in categories {
                weights
                    .category_weights
                    .insert(category.trim().to_lowercase(), weight);
            }
        }
    }

    if let Some(t) = raw.thresholds {
        let thresholds = &mut config.thresholds;
        if let Some(v) = t.stale_plan_days {
            thresholds.stale_plan_days = v;
        }
        if let Some(v) = t.cancellation_rate_pct {
            thresholds.cancellation_rate_pct = v;
        }
        if let Some(v) = t.low_balance {
            thresholds.low_balance = v;
        }
        if let Some(v) = t.unread_backlog {
            thresholds.unread_backlog = v;
        }
        if let Some(v) = t.upcoming_unconfirmed_hours {
            thresholds.upcoming_unconfirmed_hours = v;
        }
        if let Some(v) = t.healthy_collection_rate_pct {
            thresholds.healthy_collection_rate_pct = v;
        }
        if let Some(v) = t.healthy_read_rate_pct {
            thresholds.healthy_read_rate_pct = v;
        }
    }

    if let Some(taxonomy) = raw.taxonomy {
        for (domain_name, aliases) in taxonomy {
            let domain: Domain = domain_name
                .parse()
                .map_err(|_| Error::UnknownDomain(domain_name.clone()))?;
            config.taxonomy.insert(domain, aliases);
        }
    }

    Ok(config)
}
