//! `totes draft …`: the in-progress tote capture.
//!
//! The draft is stored as-is; `totes tote add` clears it once the tote is
//! saved.

use anyhow::{Context, Result};

use crate::config::Config;
use crate::db;

pub async fn run_draft_show(config: &Config, user: Option<&str>) -> Result<()> {
    let (catalog, _) = db::open_catalog(config, user).await?;
    match catalog.load_draft().await? {
        Some(draft) => println!("{}", serde_json::to_string_pretty(&draft)?),
        None => println!("No draft."),
    }
    Ok(())
}

pub async fn run_draft_save(config: &Config, user: Option<&str>, raw: &str) -> Result<()> {
    let draft: serde_json::Value =
        serde_json::from_str(raw).with_context(|| "Draft must be valid JSON")?;
    let (catalog, _) = db::open_catalog(config, user).await?;
    catalog.save_draft(&draft).await?;
    println!("Draft saved.");
    Ok(())
}

pub async fn run_draft_clear(config: &Config, user: Option<&str>) -> Result<()> {
    let (catalog, _) = db::open_catalog(config, user).await?;
    catalog.clear_draft().await?;
    println!("Draft cleared.");
    Ok(())
}
