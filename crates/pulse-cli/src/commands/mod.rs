//! CLI command implementations
//!
//! Commands are organized by concern:
//! - `common` - Shared utilities (config loading, source selection, window and request building)
//! - `dashboard` - Domain dashboard command and report rendering
//! - `search` - Cross-entity search command
//! - `config` - Resolved configuration display
//! - `sample` - Built-in reference rows

pub mod common;
pub mod config;
pub mod dashboard;
pub mod sample;
pub mod search;

// Re-export command functions for main.rs
pub use common::*;
pub use config::*;
pub use dashboard::*;
pub use sample::*;
pub use search::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
