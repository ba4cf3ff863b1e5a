//! Export and import of the catalog as a single JSON file.
//!
//! The file shape is `{ "totes": [...], "rooms": [...], "exportDate": "..." }`,
//! the same shape earlier releases wrote, so old exports import cleanly.

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::Config;
use crate::db;

/// Export totes and rooms as JSON.
///
/// If `output` is `Some`, writes to that file path. Otherwise writes
/// to stdout for piping.
pub async fn run_export(config: &Config, user: Option<&str>, output: Option<&Path>) -> Result<()> {
    let (catalog, _) = db::open_catalog(config, user).await?;
    let data = catalog.export();
    let json = serde_json::to_string_pretty(&data)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "Exported {} totes, {} rooms to {}",
                data.totes.len(),
                data.rooms.len(),
                path.display()
            );
        }
        None => {
            println!("{}", json);
        }
    }
    Ok(())
}

/// Merge an export file into the catalog. Totes with the same id are
/// overwritten; rooms are replaced only if the file has a rooms array.
pub async fn run_import(config: &Config, user: Option<&str>, input: &Path) -> Result<()> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read import file: {}", input.display()))?;
    let raw: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", input.display()))?;

    let (mut catalog, _) = db::open_catalog(config, user).await?;
    let report = catalog.import(&raw).await?;

    for warning in &report.warnings {
        eprintln!("Warning: {}", warning);
    }
    println!(
        "Imported {} totes and {} rooms.",
        report.totes, report.rooms
    );
    Ok(())
}
