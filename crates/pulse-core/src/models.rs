//! Data models for Pulse

use chrono::{DateTime, Days, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single instant, always in UTC
pub type Timestamp = DateTime<Utc>;

/// A loosely-typed row as delivered by the data source
pub type RawRow = serde_json::Map<String, serde_json::Value>;

/// Largest grid a window may span (about ten years of days)
pub const MAX_WINDOW_BUCKETS: u32 = 3660;

// ========== Domains ==========

/// The dashboard families the engine serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Billing,
    Sessions,
    Wallet,
    Plans,
    Notifications,
    Search,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Billing => "billing",
            Self::Sessions => "sessions",
            Self::Wallet => "wallet",
            Self::Plans => "plans",
            Self::Notifications => "notifications",
            Self::Search => "search",
        }
    }

    /// Human-readable dashboard title
    pub fn label(&self) -> &'static str {
        match self {
            Self::Billing => "Billing",
            Self::Sessions => "Sessions",
            Self::Wallet => "Wallet",
            Self::Plans => "Training Plans",
            Self::Notifications => "Notifications",
            Self::Search => "Search",
        }
    }

    /// Table (or view) holding this domain's rows in the hosted store
    pub fn table(&self) -> &'static str {
        match self {
            Self::Billing => "invoices",
            Self::Sessions => "sessions",
            Self::Wallet => "wallet_entries",
            Self::Plans => "training_plans",
            Self::Notifications => "notifications",
            Self::Search => "search_index",
        }
    }

    pub fn all() -> &'static [Domain] {
        &[
            Self::Billing,
            Self::Sessions,
            Self::Wallet,
            Self::Plans,
            Self::Notifications,
            Self::Search,
        ]
    }
}

impl std::str::FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "billing" | "invoices" => Ok(Self::Billing),
            "sessions" => Ok(Self::Sessions),
            "wallet" => Ok(Self::Wallet),
            "plans" | "training_plans" => Ok(Self::Plans),
            "notifications" => Ok(Self::Notifications),
            "search" => Ok(Self::Search),
            _ => Err(format!(
                "Unknown domain: {} (valid: billing, sessions, wallet, plans, notifications, search)",
                s
            )),
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Display tone shared by metrics, segments and highlights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Positive,
    Neutral,
    Warning,
    Critical,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

impl std::str::FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "positive" => Ok(Self::Positive),
            "neutral" => Ok(Self::Neutral),
            "warning" => Ok(Self::Warning),
            "critical" => Ok(Self::Critical),
            _ => Err(format!("Unknown tone: {}", s)),
        }
    }
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ========== Canonical Records ==========

/// A raw row after normalization
///
/// Every field has already degraded to its null/zero default if the source
/// value could not be parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainRecord {
    /// Source id, or a hash of stable fields when the row has none
    pub id: String,
    /// The instant used for bucketing
    pub occurred_at: Option<Timestamp>,
    /// Last modification, used for freshness
    pub updated_at: Option<Timestamp>,
    /// Signed magnitude: credits >= 0, debits < 0
    pub amount: f64,
    pub status: Option<String>,
    pub category: Option<String>,
    pub owner_id: Option<String>,
    /// Display name joined for the owner, when the source provides one
    pub owner_label: Option<String>,
    pub counterpart_id: Option<String>,
    pub title: Option<String>,
    /// Lower-cased terms used only by the relevance scorer
    pub search_tokens: Vec<String>,
}

impl DomainRecord {
    /// Most recent of `occurred_at` and `updated_at`
    pub fn last_activity(&self) -> Option<Timestamp> {
        match (self.occurred_at, self.updated_at) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        }
    }

    /// Title for display, falling back to the id
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }

    /// Owner for display, preferring the joined label
    pub fn display_owner(&self) -> Option<&str> {
        self.owner_label.as_deref().or(self.owner_id.as_deref())
    }
}

// ========== Time Grid ==========

/// Width of one timeline bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            Self::Day => Duration::days(1),
            Self::Week => Duration::weeks(1),
        }
    }
}

impl std::str::FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "day" | "daily" => Ok(Self::Day),
            "week" | "weekly" => Ok(Self::Week),
            _ => Err(format!("Unknown granularity: {} (valid: day, week)", s)),
        }
    }
}

/// The time window a dashboard covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: Timestamp,
    pub end: Timestamp,
    pub granularity: Granularity,
}

impl Window {
    pub fn new(start: Timestamp, end: Timestamp, granularity: Granularity) -> Self {
        Self {
            start,
            end,
            granularity,
        }
    }

    /// The `buckets`-long window that closes at the end of `now`'s day
    ///
    /// `buckets` is clamped to `1..=MAX_WINDOW_BUCKETS`; near the ends of the
    /// representable calendar the window is cut short instead of overflowing.
    pub fn trailing(now: Timestamp, buckets: u32, granularity: Granularity) -> Self {
        let today = now.date_naive();
        let end = today
            .checked_add_days(Days::new(1))
            .unwrap_or(today)
            .and_time(NaiveTime::MIN)
            .and_utc();
        let buckets = buckets.clamp(1, MAX_WINDOW_BUCKETS) as i32;
        let start = end
            .checked_sub_signed(granularity.duration() * buckets)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self::new(start, end, granularity)
    }

    /// Number of grid slots: ceil((end - start) / granularity), at least one
    pub fn bucket_count(&self) -> usize {
        let span = (self.end - self.start).num_milliseconds();
        if span <= 0 {
            return 1;
        }
        let step = self.granularity.duration().num_milliseconds();
        ((span + step - 1) / step) as usize
    }

    /// Whether `at` lies inside `[start, end]`
    pub fn contains(&self, at: Timestamp) -> bool {
        at >= self.start && at <= self.end
    }
}

/// One slot of a timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub bucket_key: String,
    pub label: String,
    pub metrics: BTreeMap<String, f64>,
    /// Running balance at the close of this bucket, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,
}

impl TimelinePoint {
    pub fn metric(&self, name: &str) -> f64 {
        self.metrics.get(name).copied().unwrap_or(0.0)
    }
}

// ========== Dashboard View-Models ==========

/// One slice of a status/category breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSegment {
    pub key: String,
    pub label: String,
    pub tone: Tone,
    pub count: usize,
    /// count / total * 100, rounded
    pub percentage: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Flat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub direction: TrendDirection,
    pub label: String,
}

/// A headline number; `value` is already formatted for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeroMetric {
    pub id: String,
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    pub tone: Tone,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
}

impl HeroMetric {
    pub fn new(id: impl Into<String>, label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            value: value.into(),
            hint: None,
            tone: Tone::Neutral,
            trend: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }

    pub fn with_trend(mut self, trend: Option<Trend>) -> Self {
        self.trend = trend;
        self
    }
}

/// A short, toned finding derived from aggregates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub id: String,
    pub title: String,
    pub description: String,
    pub tone: Tone,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<String>,
}

impl Highlight {
    pub fn new(
        id: impl Into<String>,
        tone: Tone,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            tone,
            meta: None,
        }
    }

    pub fn with_meta(mut self, meta: impl Into<String>) -> Self {
        self.meta = Some(meta.into());
        self
    }
}

/// Per-owner tally used by "most active" style findings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorStat {
    pub actor_id: String,
    pub label: String,
    pub count: usize,
    pub amount: f64,
    pub amount_display: String,
}

/// A record as rendered in dashboard tables and exports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardRow {
    pub id: String,
    pub title: String,
    pub status: String,
    pub status_label: String,
    pub tone: Tone,
    pub category: Option<String>,
    pub owner: Option<String>,
    pub counterpart_id: Option<String>,
    pub amount: f64,
    pub amount_display: String,
    pub occurred_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
    /// Relative time of the most recent activity
    pub activity_display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

// ========== Pagination ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// 1-based page number
    pub page: usize,
    pub per_page: usize,
}

impl PageRequest {
    pub const MAX_PER_PAGE: usize = 200;

    pub fn new(page: usize, per_page: usize) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, Self::MAX_PER_PAGE),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, 20)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
}

impl<T: Clone> Page<T> {
    /// Slice one page out of an already-ordered list
    pub fn from_slice(all: &[T], request: PageRequest) -> Self {
        let request = PageRequest::new(request.page, request.per_page);
        let total = all.len();
        let total_pages = total.div_ceil(request.per_page);
        let offset = (request.page - 1).saturating_mul(request.per_page);
        let items = all
            .iter()
            .skip(offset)
            .take(request.per_page)
            .cloned()
            .collect();

        Self {
            items,
            page: request.page,
            per_page: request.per_page,
            total,
            total_pages,
        }
    }
}

// ========== Sources & Envelope ==========

/// Where a batch came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTag {
    Live,
    Fallback,
}

impl SourceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for SourceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A fetched batch tagged with its provenance
#[derive(Debug, Clone, PartialEq)]
pub enum SourceBatch {
    Live(Vec<RawRow>),
    Fallback(Vec<RawRow>),
}

impl SourceBatch {
    pub fn tag(&self) -> SourceTag {
        match self {
            Self::Live(_) => SourceTag::Live,
            Self::Fallback(_) => SourceTag::Fallback,
        }
    }

    pub fn rows(&self) -> &[RawRow] {
        match self {
            Self::Live(rows) | Self::Fallback(rows) => rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows().is_empty()
    }
}

/// The complete response a dashboard renders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardEnvelope {
    pub domain: Domain,
    /// The `now` every relative computation used
    pub generated_at: Timestamp,
    pub source: SourceTag,
    pub window: Window,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub hero: Vec<HeroMetric>,
    pub timeline: Vec<TimelinePoint>,
    pub statuses: Vec<StatusSegment>,
    pub highlights: Vec<Highlight>,
    pub rows: Page<DashboardRow>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn at(y: i32, m: u32, d: u32, h: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_domain_round_trip() {
        for domain in Domain::all() {
            assert_eq!(Domain::from_str(domain.as_str()).unwrap(), *domain);
        }
        assert_eq!(Domain::from_str("Invoices").unwrap(), Domain::Billing);
        assert!(Domain::from_str("payroll").is_err());
    }

    #[test]
    fn test_bucket_count_rounds_up() {
        let window = Window::new(at(2026, 1, 1, 0), at(2026, 1, 3, 12), Granularity::Day);
        assert_eq!(window.bucket_count(), 3);

        let weekly = Window::new(at(2026, 1, 1, 0), at(2026, 1, 29, 0), Granularity::Week);
        assert_eq!(weekly.bucket_count(), 4);
    }

    #[test]
    fn test_bucket_count_degenerate_window() {
        let window = Window::new(at(2026, 1, 3, 0), at(2026, 1, 1, 0), Granularity::Day);
        assert_eq!(window.bucket_count(), 1);
    }

    #[test]
    fn test_trailing_window_ends_at_midnight() {
        let window = Window::trailing(at(2026, 3, 10, 15), 7, Granularity::Day);
        assert_eq!(window.end, at(2026, 3, 11, 0));
        assert_eq!(window.start, at(2026, 3, 4, 0));
        assert_eq!(window.bucket_count(), 7);
    }

    #[test]
    fn test_trailing_window_is_clamped() {
        let window = Window::trailing(at(2026, 3, 10, 15), 100_000_000, Granularity::Day);
        assert_eq!(window.bucket_count(), MAX_WINDOW_BUCKETS as usize);

        let window = Window::trailing(at(2026, 3, 10, 15), u32::MAX, Granularity::Week);
        assert_eq!(window.bucket_count(), MAX_WINDOW_BUCKETS as usize);

        let window = Window::trailing(at(2026, 3, 10, 15), 0, Granularity::Day);
        assert_eq!(window.bucket_count(), 1);
    }

    #[test]
    fn test_last_activity_prefers_latest() {
        let mut record = DomainRecord {
            id: "r1".into(),
            occurred_at: Some(at(2026, 1, 1, 0)),
            updated_at: Some(at(2026, 1, 5, 0)),
            amount: 0.0,
            status: None,
            category: None,
            owner_id: None,
            owner_label: None,
            counterpart_id: None,
            title: None,
            search_tokens: vec![],
        };
        assert_eq!(record.last_activity(), Some(at(2026, 1, 5, 0)));

        record.updated_at = None;
        assert_eq!(record.last_activity(), Some(at(2026, 1, 1, 0)));
        assert_eq!(record.display_title(), "r1");
    }

    #[test]
    fn test_page_slicing() {
        let items: Vec<u32> = (1..=45).collect();

        let page = Page::from_slice(&items, PageRequest::new(3, 20));
        assert_eq!(page.items, vec![41, 42, 43, 44, 45]);
        assert_eq!(page.total, 45);
        assert_eq!(page.total_pages, 3);

        let beyond = Page::from_slice(&items, PageRequest::new(9, 20));
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total_pages, 3);

        let empty: Page<u32> = Page::from_slice(&[], PageRequest::default());
        assert_eq!(empty.total_pages, 0);
        assert_eq!(empty.page, 1);
    }

    #[test]
    fn test_source_batch_tag() {
        let batch = SourceBatch::Fallback(vec![RawRow::new()]);
        assert_eq!(batch.tag(), SourceTag::Fallback);
        assert_eq!(batch.len(), 1);
        assert!(SourceBatch::Live(vec![]).is_empty());
    }
}
