//! Pulse Core Library
//!
//! Aggregation and insight engine behind the Pulse studio dashboards:
//! - Normalization of loosely-typed rows into canonical records
//! - Zero-filled time bucketing with running balances
//! - Status taxonomy classification with configurable aliases
//! - Relevance scoring for cross-entity search
//! - Rule-based highlight generation
//! - Dashboard envelope assembly with pagination
//! - Live and file data sources with a reference-data fallback

pub mod assemble;
pub mod bucket;
pub mod config;
pub mod domains;
pub mod error;
pub mod format;
pub mod highlights;
pub mod models;
pub mod normalize;
pub mod ranking;
pub mod source;
pub mod taxonomy;

/// Test utilities including the mock live data source
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use assemble::{Assembler, DashboardRequest};
pub use config::EngineConfig;
pub use domains::{profile_for, DomainProfile};
pub use error::{Error, Result};
pub use format::{Formatter, Locale};
pub use highlights::{Aggregates, HighlightEngine, HighlightRule};
pub use models::{
    DashboardEnvelope, DashboardRow, Domain, DomainRecord, Granularity, Highlight, HeroMetric,
    Page, PageRequest, RawRow, SourceBatch, SourceTag, StatusSegment, TimelinePoint, Timestamp,
    Tone, Window, MAX_WINDOW_BUCKETS,
};
pub use source::{fallback_rows, fetch_or_fallback, DataSource, FileSource, HttpSource};
pub use taxonomy::StatusTaxonomy;
