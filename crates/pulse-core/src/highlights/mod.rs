//! Highlight Generator
//!
//! A bounded, ordered set of rules runs against aggregates the dashboard has
//! already computed. Each rule emits zero or one [`Highlight`]; the engine
//! orders them by declared priority (declaration order on ties), truncates to
//! the configured cap and falls back to a single "nothing notable" entry.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pulse_core::highlights::{Aggregates, HighlightEngine};
//!
//! let engine = HighlightEngine::with_rules(profile.rules(), config.display.highlight_cap);
//! let highlights = engine.generate(&aggregates);
//! ```
//!
//! [`Highlight`]: crate::models::Highlight

pub mod billing;
pub mod engine;
pub mod notifications;
pub mod plans;
pub mod search;
pub mod sessions;
pub mod wallet;

pub use engine::{nothing_notable, Aggregates, HighlightEngine, HighlightRule, NOTHING_NOTABLE};
