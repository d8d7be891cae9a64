//! Config command

use std::path::Path;

use anyhow::Result;
use pulse_core::config::{default_config_path, resolve_config_path};

use super::load_config;

pub fn cmd_config(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;

    println!();
    println!("⚙️  Engine Configuration");
    match resolve_config_path(config_path) {
        Some(path) => println!("   Loaded from: {}", path.display()),
        None => println!("   Loaded from: built-in defaults"),
    }
    if let Some(path) = default_config_path() {
        println!("   Override location: {}", path.display());
    }
    println!("   ─────────────────────────────────────────────────────────────");
    println!("{}", serde_json::to_string_pretty(&config)?);

    Ok(())
}
