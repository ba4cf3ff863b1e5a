//! Catalog statistics.
//!
//! Provides a quick summary of what's catalogued: tote, item and room
//! counts, a per-room breakdown, and the most used tags.

use anyhow::Result;

use crate::config::Config;
use crate::db;

/// Run the stats command: load the catalog and print a summary.
pub async fn run_stats(config: &Config, user: Option<&str>) -> Result<()> {
    let (catalog, _) = db::open_catalog(config, user).await?;
    let stats = catalog.stats();
    let backups = catalog.backups().get_backups().await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Tote Catalog: {}", catalog.store().namespace());
    println!("================================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Totes:       {}", stats.tote_count);
    println!("  Items:       {}", stats.item_count);
    println!("  Rooms:       {}", stats.room_count);
    println!(
        "  Last backup: {}",
        backups
            .last()
            .map(|b| b.timestamp.as_str())
            .unwrap_or("never")
    );

    if !stats.rooms.is_empty() {
        println!();
        println!("  By room:");
        println!("  {:<4} {:<24} {:>6} {:>6}", "", "ROOM", "TOTES", "ITEMS");
        println!("  {}", "-".repeat(44));
        for room in &stats.rooms {
            println!(
                "  {:<4} {:<24} {:>6} {:>6}",
                room.icon, room.name, room.tote_count, room.item_count
            );
        }
    }

    if !stats.top_tags.is_empty() {
        println!();
        println!("  Top tags:");
        for (tag, count) in &stats.top_tags {
            println!("    #{:<22} {:>4}", tag, count);
        }
    }

    println!();
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
