//! `totes backup …` commands.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::db;

pub async fn run_backup_create(config: &Config, user: Option<&str>) -> Result<()> {
    let (catalog, _) = db::open_catalog(config, user).await?;
    let entry = catalog.create_backup().await?;
    println!(
        "Backup {} created ({} totes, {} rooms).",
        entry.timestamp, entry.tote_count, entry.room_count
    );
    Ok(())
}

pub async fn run_backup_list(config: &Config, user: Option<&str>) -> Result<()> {
    let (catalog, _) = db::open_catalog(config, user).await?;
    let backups = catalog.backups().get_backups().await?;
    if backups.is_empty() {
        println!("No backups.");
        return Ok(());
    }

    println!("  {:<26} {:>6} {:>6}", "TIMESTAMP", "TOTES", "ROOMS");
    println!("  {}", "-".repeat(40));
    // Newest first.
    for entry in backups.iter().rev() {
        println!(
            "  {:<26} {:>6} {:>6}",
            entry.timestamp, entry.tote_count, entry.room_count
        );
    }
    println!();
    println!(
        "  Keeping the newest {} backup(s).",
        catalog.backups().max_backups()
    );
    Ok(())
}

/// Replace the live catalog with a retained backup. Requires `--yes`
/// because current totes are discarded.
pub async fn run_backup_restore(
    config: &Config,
    user: Option<&str>,
    timestamp: &str,
    yes: bool,
) -> Result<()> {
    if !yes {
        bail!(
            "Restoring replaces all current totes and rooms. Re-run with --yes to restore {}.",
            timestamp
        );
    }
    let (mut catalog, _) = db::open_catalog(config, user).await?;
    let report = catalog.restore_backup(timestamp).await?;
    for warning in &report.warnings {
        eprintln!("Warning: {}", warning);
    }
    println!(
        "Restored {} totes and {} rooms from {}.",
        report.totes, report.rooms, timestamp
    );
    Ok(())
}
