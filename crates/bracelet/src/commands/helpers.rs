//! Helpers command - list the standard helper names

use anyhow::Result;
use bracelet_core::helper::HelperRegistry;
use colored::Colorize;
use serde_json::json;

pub fn run(json: bool) -> Result<()> {
    let registry = HelperRegistry::standard();
    let names: Vec<&str> = registry.names().collect();

    if json {
        let output = json!({
            "count": names.len(),
            "helpers": names,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    for name in &names {
        println!("  {} {}", "→".cyan(), name);
    }
    println!("{} {} standard helpers", "✓".green(), names.len());
    Ok(())
}
