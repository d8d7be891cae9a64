//! Sample command

use anyhow::Result;
use pulse_core::fallback_rows;

use super::parse_domain;

pub fn cmd_sample(domain: &str) -> Result<()> {
    let domain = parse_domain(domain)?;
    let rows = fallback_rows(domain);
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}
