//! `totes search` and `totes history`.
//!
//! Search results are grouped per tote, best tote first. In text mode the
//! query terms are bracketed (`[drill]`) in labels, descriptions and tags.

use anyhow::Result;
use serde::Serialize;

use tote_catalog_core::search::{highlight_matches, SearchResult};

use crate::config::Config;
use crate::db;

/// Render `text` with every highlighted segment wrapped in brackets.
pub fn render_highlighted(text: &str, query: &str) -> String {
    highlight_matches(text, query)
        .into_iter()
        .map(|seg| {
            if seg.highlighted {
                format!("[{}]", seg.text)
            } else {
                seg.text
            }
        })
        .collect()
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    query: &'a str,
    results: &'a [SearchResult],
}

pub async fn run_search(config: &Config, user: Option<&str>, query: &str, json: bool) -> Result<()> {
    let (catalog, _) = db::open_catalog(config, user).await?;
    let results = catalog.search(query);
    catalog.history().add(query).await?;

    if json {
        let out = JsonOutput {
            query,
            results: &results,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        let tote = &result.tote;
        println!(
            "{}. [{:.2}] {}  {} {}",
            i + 1,
            result.score,
            render_highlighted(&tote.label, query),
            catalog.room_icon(&tote.room),
            render_highlighted(&tote.room, query)
        );
        for (index, item) in result.matched_indices.iter().zip(&result.matching_items) {
            let tags = if item.tags.is_empty() {
                String::new()
            } else {
                format!("  ({})", render_highlighted(&item.tags.join(", "), query))
            };
            println!(
                "    {}. {}{}",
                index,
                render_highlighted(&item.description, query),
                tags
            );
        }
        println!("    id: {}", tote.id);
        println!();
    }
    Ok(())
}

pub async fn run_history_show(config: &Config, user: Option<&str>) -> Result<()> {
    let (catalog, _) = db::open_catalog(config, user).await?;
    let history = catalog.history().get().await?;
    if history.is_empty() {
        println!("No recent searches.");
        return Ok(());
    }
    for query in history {
        println!("{}", query);
    }
    Ok(())
}

pub async fn run_history_clear(config: &Config, user: Option<&str>) -> Result<()> {
    let (catalog, _) = db::open_catalog(config, user).await?;
    catalog.history().clear().await?;
    println!("Search history cleared.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brackets_every_match() {
        assert_eq!(
            render_highlighted("Cordless Drill and drill bits", "drill"),
            "Cordless [Drill] and [drill] bits"
        );
    }

    #[test]
    fn adjacent_terms_merge() {
        assert_eq!(render_highlighted("toolbox", "tool box"), "[toolbox]");
    }

    #[test]
    fn no_match_is_unchanged() {
        assert_eq!(render_highlighted("Winter coat", "tent"), "Winter coat");
    }
}
