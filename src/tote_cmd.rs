//! `totes tote …` and `totes item …` commands.

use anyhow::{bail, Context, Result};

use tote_catalog_core::models::{Item, Tote};
use tote_catalog_core::normalize::parse_tag_list;
use tote_catalog_core::Catalog;

use crate::config::Config;
use crate::db;

/// Parse an `--item` argument of the form `description|tag, tag`.
/// The tag part is optional.
pub fn parse_item_arg(raw: &str) -> Result<Item> {
    let (description, tags) = match raw.split_once('|') {
        Some((d, t)) => (d, t),
        None => (raw, ""),
    };
    let description = description.trim();
    if description.is_empty() {
        bail!("item '{}' has no description", raw);
    }
    Ok(Item {
        description: description.to_string(),
        tags: parse_tag_list(tags),
    })
}

/// Parse an item address `TOTE_ID:INDEX`.
pub fn parse_item_ref(raw: &str) -> Result<(i64, usize)> {
    let (id, index) = raw
        .split_once(':')
        .with_context(|| format!("invalid item reference '{}': expected TOTE_ID:INDEX", raw))?;
    let id = id
        .trim()
        .parse()
        .with_context(|| format!("invalid tote id in '{}'", raw))?;
    let index = index
        .trim()
        .parse()
        .with_context(|| format!("invalid item index in '{}'", raw))?;
    Ok((id, index))
}

pub fn print_tote(catalog: &Catalog, tote: &Tote) {
    println!(
        "[{}] {}  {} {}  ({} item{}, created {})",
        tote.id,
        tote.label,
        catalog.room_icon(&tote.room),
        tote.room,
        tote.items.len(),
        if tote.items.len() == 1 { "" } else { "s" },
        tote.created_date
    );
}

fn print_items(tote: &Tote) {
    for (i, item) in tote.items.iter().enumerate() {
        if item.tags.is_empty() {
            println!("    {}. {}", i, item.description);
        } else {
            let tags: Vec<String> = item.tags.iter().map(|t| format!("#{}", t)).collect();
            println!("    {}. {}  {}", i, item.description, tags.join(" "));
        }
    }
}

pub async fn run_tote_add(
    config: &Config,
    user: Option<&str>,
    label: &str,
    room: &str,
    items: &[String],
    image_url: Option<String>,
) -> Result<()> {
    let items = items
        .iter()
        .map(|raw| parse_item_arg(raw))
        .collect::<Result<Vec<_>>>()?;
    let (mut catalog, _) = db::open_catalog(config, user).await?;
    let tote = catalog.add_tote(label, room, items, image_url).await?;
    println!("Added tote {} ({}).", tote.label, tote.id);
    Ok(())
}

pub async fn run_tote_list(config: &Config, user: Option<&str>, room: Option<&str>) -> Result<()> {
    let (catalog, _) = db::open_catalog(config, user).await?;
    let totes: Vec<&Tote> = catalog
        .totes()
        .iter()
        .filter(|t| room.map_or(true, |r| t.room == r))
        .collect();

    if totes.is_empty() {
        println!("No totes.");
        return Ok(());
    }
    for tote in totes {
        print_tote(&catalog, tote);
    }
    Ok(())
}

pub async fn run_tote_show(config: &Config, user: Option<&str>, id: i64) -> Result<()> {
    let (catalog, _) = db::open_catalog(config, user).await?;
    let Some(tote) = catalog.tote(id) else {
        bail!("tote not found: {}", id);
    };
    print_tote(&catalog, tote);
    if let Some(url) = &tote.image_url {
        println!("    image: {}", url);
    }
    print_items(tote);
    Ok(())
}

pub async fn run_tote_delete(config: &Config, user: Option<&str>, id: i64) -> Result<()> {
    let (mut catalog, _) = db::open_catalog(config, user).await?;
    catalog.delete_tote(id).await?;
    println!("Deleted tote {}.", id);
    Ok(())
}

pub async fn run_tote_move_room(config: &Config, user: Option<&str>, id: i64, room: &str) -> Result<()> {
    let (mut catalog, _) = db::open_catalog(config, user).await?;
    let tote = catalog.update_tote_room(id, room).await?;
    println!("Moved tote {} to {}.", tote.label, tote.room);
    Ok(())
}

pub async fn run_tote_rename(config: &Config, user: Option<&str>, id: i64, label: &str) -> Result<()> {
    let (mut catalog, _) = db::open_catalog(config, user).await?;
    let tote = catalog.rename_tote(id, label).await?;
    println!("Renamed tote {} to {}.", tote.id, tote.label);
    Ok(())
}

pub async fn run_item_add(
    config: &Config,
    user: Option<&str>,
    id: i64,
    description: &str,
    tags: &str,
) -> Result<()> {
    let (mut catalog, _) = db::open_catalog(config, user).await?;
    let tote = catalog.add_item(id, description, tags).await?;
    println!("Added item {} to {}.", tote.items.len() - 1, tote.label);
    Ok(())
}

pub async fn run_item_edit(
    config: &Config,
    user: Option<&str>,
    id: i64,
    index: usize,
    description: &str,
    tags: &str,
) -> Result<()> {
    let (mut catalog, _) = db::open_catalog(config, user).await?;
    let tote = catalog.edit_item(id, index, description, tags).await?;
    println!("Updated item {} in {}.", index, tote.label);
    Ok(())
}

/// Delete one or more items given as `TOTE_ID:INDEX`. Indices refer to the
/// catalog before any of them is removed.
pub async fn run_item_delete(config: &Config, user: Option<&str>, refs: &[String]) -> Result<()> {
    let selection = refs
        .iter()
        .map(|r| parse_item_ref(r))
        .collect::<Result<Vec<_>>>()?;
    let (mut catalog, _) = db::open_catalog(config, user).await?;

    if let [(id, index)] = selection.as_slice() {
        let emptied = catalog.delete_item(*id, *index).await?;
        println!("Deleted item {} from tote {}.", index, id);
        if emptied {
            println!("Tote {} was empty and has been removed.", id);
        }
        return Ok(());
    }

    let removed = catalog.delete_items(&selection).await?;
    println!("Deleted {} item(s).", selection.len());
    if removed > 0 {
        println!("{} empty tote(s) removed.", removed);
    }
    Ok(())
}

pub async fn run_item_move(
    config: &Config,
    user: Option<&str>,
    from: i64,
    index: usize,
    to: i64,
) -> Result<()> {
    let (mut catalog, _) = db::open_catalog(config, user).await?;
    let emptied = catalog.move_item(from, index, to).await?;
    println!("Moved item {} from tote {} to tote {}.", index, from, to);
    if emptied {
        println!("Tote {} was empty and has been removed.", from);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_arg_with_and_without_tags() {
        let item = parse_item_arg("Cordless drill | Tools, power ").unwrap();
        assert_eq!(item.description, "Cordless drill");
        assert_eq!(item.tags, vec!["tools", "power"]);

        let bare = parse_item_arg("Rope").unwrap();
        assert!(bare.tags.is_empty());

        assert!(parse_item_arg(" |tools").is_err());
    }

    #[test]
    fn item_ref_parsing() {
        assert_eq!(parse_item_ref("1700000000000:2").unwrap(), (1700000000000, 2));
        assert!(parse_item_ref("17").is_err());
        assert!(parse_item_ref("17:-1").is_err());
    }
}
