//! Domain records for the catalog.
//!
//! The serialized field names follow the on-disk format written by earlier
//! releases (`number` for the tote label, `date` for the creation date), so
//! existing stores and export files keep loading. The Rust names follow the
//! domain vocabulary.

use serde::{Deserialize, Serialize};

/// A room that totes live in. Identity is `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub name: String,
    pub icon: String,
}

/// One item inside a tote, addressed positionally by `(tote id, index)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Item {
    /// Tags joined with single spaces, the form the search index matches against.
    pub fn tag_string(&self) -> String {
        self.tags.join(" ")
    }
}

/// A storage container and its contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tote {
    /// Creation timestamp in milliseconds, unique within a namespace.
    pub id: i64,
    #[serde(rename = "number", alias = "label")]
    pub label: String,
    /// Soft reference to [`Room::name`].
    pub room: String,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(rename = "imageUrl", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(rename = "date", alias = "createdDate")]
    pub created_date: String,
}

impl Tote {
    /// Store key for this tote under the active namespace.
    pub fn key(&self) -> String {
        tote_key(self.id)
    }
}

/// Store key for the tote with `id`.
pub fn tote_key(id: i64) -> String {
    format!("{}{}", TOTE_KEY_PREFIX, id)
}

pub const TOTE_KEY_PREFIX: &str = "tote:";
pub const ROOMS_KEY: &str = "rooms";
pub const BACKUP_KEY_PREFIX: &str = "backup:";
pub const BACKUP_LIST_KEY: &str = "backup:list";
pub const BACKUP_LAST_AUTO_KEY: &str = "backup:lastAuto";
pub const SEARCH_HISTORY_KEY: &str = "search-history";
pub const DRAFT_KEY: &str = "draft:new-tote";

/// Summary of one retained backup snapshot.
///
/// `timestamp` is both the snapshot's identity and the suffix of its
/// storage key (`backup:<timestamp>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupEntry {
    pub timestamp: String,
    pub tote_count: usize,
    pub room_count: usize,
}

/// The import/export file: `{ totes, rooms, exportDate? }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFile {
    pub totes: Vec<Tote>,
    pub rooms: Vec<Room>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_date: Option<String>,
}
