//! Error types for Pulse
//!
//! The aggregation engine itself never fails on well-typed input. These
//! errors cover the surfaces around it: configuration, taxonomy aliases
//! supplied by users, and data-source adapters.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Data source error: {0}")]
    Source(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Unknown domain: {0}")]
    UnknownDomain(String),
}

pub type Result<T> = std::result::Result<T, Error>;
