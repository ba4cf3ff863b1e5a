//! `totes room …` commands.

use anyhow::Result;

use crate::config::Config;
use crate::db;

pub async fn run_room_add(config: &Config, user: Option<&str>, name: &str, icon: Option<&str>) -> Result<()> {
    let (mut catalog, _) = db::open_catalog(config, user).await?;
    let room = catalog.add_room(name, icon.unwrap_or("")).await?;
    println!("Added room {} {}.", room.icon, room.name);
    Ok(())
}

pub async fn run_room_list(config: &Config, user: Option<&str>) -> Result<()> {
    let (catalog, _) = db::open_catalog(config, user).await?;
    if catalog.rooms().is_empty() {
        println!("No rooms.");
        return Ok(());
    }

    println!("  {:<4} {:<24} {:>6}", "", "ROOM", "TOTES");
    println!("  {}", "-".repeat(36));
    for room in catalog.rooms() {
        let count = catalog.totes().iter().filter(|t| t.room == room.name).count();
        println!("  {:<4} {:<24} {:>6}", room.icon, room.name, count);
    }
    Ok(())
}

/// Rename a room and/or change its icon. Keeps the current icon when none
/// is given.
pub async fn run_room_update(
    config: &Config,
    user: Option<&str>,
    name: &str,
    new_name: Option<&str>,
    icon: Option<&str>,
) -> Result<()> {
    let (mut catalog, _) = db::open_catalog(config, user).await?;
    let icon = match icon {
        Some(icon) => icon.to_string(),
        None => catalog.room_icon(name).to_string(),
    };
    let new_name = new_name.unwrap_or(name);
    let moved = catalog.update_room(name, new_name, &icon).await?;

    println!("Updated room {} {}.", icon, new_name);
    if moved > 0 {
        println!("{} tote(s) moved to {}.", moved, new_name);
    }
    Ok(())
}

pub async fn run_room_delete(config: &Config, user: Option<&str>, name: &str) -> Result<()> {
    let (mut catalog, _) = db::open_catalog(config, user).await?;
    catalog.delete_room(name).await?;
    println!("Deleted room {}.", name);
    Ok(())
}
