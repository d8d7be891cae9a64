//! Data-source adapters
//!
//! Sources hand the engine plain [`RawRow`] batches. When a fetch fails the
//! caller substitutes the embedded reference dataset and tags the batch as
//! [`SourceBatch::Fallback`]; the engine treats both the same way.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use csv::ReaderBuilder;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{Domain, RawRow, SourceBatch};

/// Embedded reference dataset, one array per domain
const FALLBACK_DATA: &str = include_str!("../../../config/fallback.json");

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Anything that can produce a raw batch for a domain
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Short description for logs and reports
    fn name(&self) -> &str;

    async fn fetch(&self, domain: Domain) -> Result<Vec<RawRow>>;
}

/// Fetch a batch, substituting the reference dataset on any failure
pub async fn fetch_or_fallback(source: &dyn DataSource, domain: Domain) -> SourceBatch {
    match source.fetch(domain).await {
        Ok(rows) => {
            debug!(source = source.name(), domain = %domain, rows = rows.len(), "Fetched live batch");
            SourceBatch::Live(rows)
        }
        Err(e) => {
            warn!(
                source = source.name(),
                domain = %domain,
                error = %e,
                "Data source failed, showing reference data"
            );
            SourceBatch::Fallback(fallback_rows(domain))
        }
    }
}

/// The embedded reference rows for `domain`
pub fn fallback_rows(domain: Domain) -> Vec<RawRow> {
    match parse_json_rows(FALLBACK_DATA, domain) {
        Ok(rows) => rows,
        Err(e) => {
            warn!(domain = %domain, error = %e, "Embedded fallback dataset is unreadable");
            vec![]
        }
    }
}

/// Rows from a JSON document
///
/// Accepts a bare array, an object with a `data` array, or an object keyed
/// by domain name. Array elements that are not objects are skipped.
pub fn parse_json_rows(content: &str, domain: Domain) -> Result<Vec<RawRow>> {
    let value: Value = serde_json::from_str(content)?;
    rows_from_value(value, domain)
}

fn rows_from_value(value: Value, domain: Domain) -> Result<Vec<RawRow>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            let nested = map
                .remove("data")
                .or_else(|| map.remove(domain.as_str()))
                .or_else(|| map.remove(domain.table()));
            match nested {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(Error::InvalidData(format!(
                        "Expected an array of {} rows",
                        domain
                    )))
                }
            }
        }
        _ => {
            return Err(Error::InvalidData(
                "Expected a JSON array or object".to_string(),
            ))
        }
    };

    let total = items.len();
    let rows: Vec<RawRow> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(row) => Some(row),
            _ => None,
        })
        .collect();
    if rows.len() < total {
        debug!(skipped = total - rows.len(), "Skipped non-object rows");
    }
    Ok(rows)
}

/// Rows from CSV; headers become keys and every value stays a string
pub fn parse_csv_rows<R: Read>(reader: R) -> Result<Vec<RawRow>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

/// Reads a batch exported to disk (JSON or CSV)
pub struct FileSource {
    path: PathBuf,
    name: String,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("file:{}", path.display());
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_csv(&self) -> bool {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
    }
}

#[async_trait]
impl DataSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, domain: Domain) -> Result<Vec<RawRow>> {
        if self.is_csv() {
            let file = fs::File::open(&self.path)?;
            return parse_csv_rows(file);
        }
        let content = fs::read_to_string(&self.path)?;
        parse_json_rows(&content, domain)
    }
}

/// PostgREST-style endpoint: one table per domain at `<base>/<table>`
#[derive(Clone)]
pub struct HttpSource {
    http_client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpSource {
    pub fn new(base_url: &str, api_key: Option<&str>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(String::from).filter(|k| !k.is_empty()),
        }
    }

    /// Create from environment (PULSE_SOURCE_URL, optional PULSE_SOURCE_KEY)
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("PULSE_SOURCE_URL").ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        let api_key = std::env::var("PULSE_SOURCE_KEY").ok();
        Some(Self::new(&base_url, api_key.as_deref()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn table_url(&self, domain: Domain) -> String {
        format!("{}/{}", self.base_url, domain.table())
    }
}

#[async_trait]
impl DataSource for HttpSource {
    fn name(&self) -> &str {
        &self.base_url
    }

    async fn fetch(&self, domain: Domain) -> Result<Vec<RawRow>> {
        let url = self.table_url(domain);
        debug!(url = %url, "Fetching live batch");

        let mut request = self
            .http_client
            .get(&url)
            .query(&[("select", "*")])
            .timeout(HTTP_TIMEOUT);
        if let Some(key) = &self.api_key {
            request = request
                .header("apikey", key)
                .header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Source(format!(
                "{} returned {}: {}",
                url, status, body
            )));
        }

        let value: Value = response.json().await?;
        rows_from_value(value, domain)
    }
}
