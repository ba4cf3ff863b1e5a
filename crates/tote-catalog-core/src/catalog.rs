//! The catalog service: in-memory totes and rooms for one namespace, kept
//! in step with the store.
//!
//! Every mutation writes through the [`NamespacedStore`] first and only
//! updates memory once the write succeeded, then rebuilds the search index
//! from scratch. Multi-key operations (room rename, bulk delete, import,
//! restore) are sequences of single-key writes: a failure part-way leaves
//! the keys already written in place, and memory reflects exactly those.
//!
//! Items are addressed by `(tote id, index)`. Any insertion or removal in a
//! tote invalidates the indices after it.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Duration;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::backup::{BackupManager, AUTO_BACKUP_INTERVAL_HOURS, MAX_BACKUPS};
use crate::clock::Clock;
use crate::error::{StoreError, StoreResult};
use crate::history::{SearchHistory, MAX_SEARCH_HISTORY};
use crate::models::{
    tote_key, BackupEntry, ExportFile, Item, Room, Tote, DRAFT_KEY, ROOMS_KEY, TOTE_KEY_PREFIX,
};
use crate::normalize::{normalize_import_payload, normalize_rooms, normalize_tote, parse_tag_list};
use crate::search::{fuzzy_search, SearchIndex, SearchOptions, SearchResult};
use crate::store::NamespacedStore;
use crate::versioning::{iso_timestamp, unwrap_versioned, Versioned};
use crate::DEFAULT_ROOM_ICON;

/// Icon shown for a tote whose room is not in the room list.
pub const UNKNOWN_ROOM_ICON: &str = "📦";

/// Tunables for a [`Catalog`].
#[derive(Debug, Clone)]
pub struct CatalogOptions {
    pub default_room_icon: String,
    pub max_backups: usize,
    pub auto_backup_interval: Duration,
    pub search: SearchOptions,
    pub history_limit: usize,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            default_room_icon: DEFAULT_ROOM_ICON.to_string(),
            max_backups: MAX_BACKUPS,
            auto_backup_interval: Duration::hours(AUTO_BACKUP_INTERVAL_HOURS),
            search: SearchOptions::default(),
            history_limit: MAX_SEARCH_HISTORY,
        }
    }
}

/// What [`Catalog::load`] found and fixed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub loaded: usize,
    /// Stored totes that were unreadable, invalid, empty or shadowed by
    /// another record with the same id. All are left untouched.
    pub skipped: usize,
    /// Totes rewritten in the current schema version or moved to the key
    /// matching their id.
    pub migrated: usize,
    pub rooms_migrated: bool,
    pub auto_backup: Option<BackupEntry>,
    /// Set when an automatic backup was due but could not be written.
    pub auto_backup_error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub totes: usize,
    pub rooms: usize,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoomStats {
    pub name: String,
    pub icon: String,
    pub tote_count: usize,
    pub item_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CatalogStats {
    pub tote_count: usize,
    pub item_count: usize,
    pub room_count: usize,
    pub rooms: Vec<RoomStats>,
    /// Most frequent tags, highest count first, ties by name.
    pub top_tags: Vec<(String, usize)>,
}

const TOP_TAGS: usize = 10;

pub struct Catalog {
    store: NamespacedStore,
    clock: Arc<dyn Clock>,
    options: CatalogOptions,
    backups: BackupManager,
    history: SearchHistory,
    totes: Vec<Tote>,
    rooms: Vec<Room>,
    index: SearchIndex,
}

impl Catalog {
    /// Load every tote and the room list for the store's namespace.
    ///
    /// Unreadable totes are skipped, stale or legacy records are rewritten
    /// in the current schema, and legacy room lists are upgraded. When an
    /// automatic backup is due and the catalog is not empty, one is taken.
    pub async fn load(
        store: NamespacedStore,
        clock: Arc<dyn Clock>,
        options: CatalogOptions,
    ) -> StoreResult<(Self, LoadReport)> {
        let mut report = LoadReport::default();
        let mut totes: Vec<Tote> = Vec::new();

        let mut found: Vec<(String, Tote, bool)> = Vec::new();
        for key in store.list(TOTE_KEY_PREFIX).await? {
            let Some(raw) = store.get_json(&key).await? else {
                report.skipped += 1;
                continue;
            };
            let (payload, state) = unwrap_versioned(raw);
            let Some(tote) = normalize_tote(&payload) else {
                warn!(namespace = %store.namespace(), key = %key, "skipping invalid stored tote");
                report.skipped += 1;
                continue;
            };
            if tote.items.is_empty() {
                warn!(namespace = %store.namespace(), key = %key, "skipping stored tote without items");
                report.skipped += 1;
                continue;
            }
            found.push((key, tote, state.needs_migration()));
        }

        // A record under its own id's key wins over a stray claiming that id.
        found.sort_by_key(|(key, tote, _)| *key != tote.key());
        for (key, tote, stale) in found {
            if totes.iter().any(|t| t.id == tote.id) {
                warn!(namespace = %store.namespace(), key = %key, id = tote.id, "skipping duplicate tote id");
                report.skipped += 1;
                continue;
            }
            let canonical = tote.key();
            if key != canonical {
                store
                    .set_json(&canonical, &Versioned::current(&tote, clock.now()))
                    .await?;
                store.delete(&key).await?;
                warn!(namespace = %store.namespace(), from = %key, to = %canonical, "moved tote to its id key");
                report.migrated += 1;
            } else if stale {
                store
                    .set_json(&key, &Versioned::current(&tote, clock.now()))
                    .await?;
                report.migrated += 1;
            }
            totes.push(tote);
        }
        totes.sort_by_key(|t| t.id);
        report.loaded = totes.len();

        let mut rooms = Vec::new();
        if let Some(raw) = store.get_json(ROOMS_KEY).await? {
            let (payload, state) = unwrap_versioned(raw);
            let normalized = normalize_rooms(&payload, &options.default_room_icon);
            if normalized.migrated || state.needs_migration() {
                store
                    .set_json(ROOMS_KEY, &Versioned::current(&normalized.rooms, clock.now()))
                    .await?;
                report.rooms_migrated = true;
            }
            rooms = normalized.rooms;
        }

        if report.migrated > 0 || report.rooms_migrated {
            info!(
                namespace = %store.namespace(),
                totes = report.migrated,
                rooms = report.rooms_migrated,
                "migrated stored records to current schema"
            );
        }

        let backups = BackupManager::new(store.clone(), Arc::clone(&clock))
            .with_retention(options.max_backups, options.auto_backup_interval)
            .with_default_icon(options.default_room_icon.clone());
        let history = SearchHistory::new(store.clone()).with_limit(options.history_limit);
        let index = SearchIndex::build(&totes, options.search);

        let catalog = Self {
            store,
            clock,
            options,
            backups,
            history,
            totes,
            rooms,
            index,
        };

        if !catalog.totes.is_empty() {
            match catalog.run_auto_backup().await {
                Ok(entry) => report.auto_backup = entry,
                Err(e) => {
                    warn!(namespace = %catalog.store.namespace(), error = %e, "automatic backup failed");
                    report.auto_backup_error = Some(e.to_string());
                }
            }
        }

        Ok((catalog, report))
    }

    async fn run_auto_backup(&self) -> StoreResult<Option<BackupEntry>> {
        if !self.backups.should_auto_backup().await? {
            return Ok(None);
        }
        let entry = self.backups.create_backup(&self.totes, &self.rooms).await?;
        self.backups.mark_auto_backup_done().await?;
        Ok(Some(entry))
    }

    pub fn store(&self) -> &NamespacedStore {
        &self.store
    }

    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    pub fn history(&self) -> &SearchHistory {
        &self.history
    }

    pub fn totes(&self) -> &[Tote] {
        &self.totes
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn tote(&self, id: i64) -> Option<&Tote> {
        self.totes.iter().find(|t| t.id == id)
    }

    pub fn index(&self) -> &SearchIndex {
        &self.index
    }

    pub fn room_icon(&self, name: &str) -> &str {
        self.rooms
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.icon.as_str())
            .unwrap_or(UNKNOWN_ROOM_ICON)
    }

    /// Fuzzy search over the current index.
    pub fn search(&self, query: &str) -> Vec<SearchResult> {
        fuzzy_search(query, &self.totes, Some(&self.index))
    }

    fn reindex(&mut self) {
        self.index = SearchIndex::build(&self.totes, self.options.search);
    }

    fn require_tote(&self, id: i64) -> StoreResult<&Tote> {
        self.tote(id).ok_or_else(|| StoreError::not_found("tote", id))
    }

    fn upsert_in_memory(&mut self, tote: Tote) {
        match self.totes.iter_mut().find(|t| t.id == tote.id) {
            Some(slot) => *slot = tote,
            None => {
                let at = self.totes.partition_point(|t| t.id < tote.id);
                self.totes.insert(at, tote);
            }
        }
    }

    /// Persist `tote`; a tote without items is deleted instead.
    async fn write_tote(&mut self, tote: Tote) -> StoreResult<()> {
        if tote.items.is_empty() {
            return self.remove_tote(tote.id).await;
        }
        self.store
            .set_json(&tote.key(), &Versioned::current(&tote, self.clock.now()))
            .await?;
        self.upsert_in_memory(tote);
        Ok(())
    }

    async fn remove_tote(&mut self, id: i64) -> StoreResult<()> {
        self.store.delete(&tote_key(id)).await?;
        self.totes.retain(|t| t.id != id);
        Ok(())
    }

    async fn write_rooms(&mut self, rooms: Vec<Room>) -> StoreResult<()> {
        self.store
            .set_json(ROOMS_KEY, &Versioned::current(&rooms, self.clock.now()))
            .await?;
        self.rooms = rooms;
        Ok(())
    }

    fn label_taken(&self, label: &str, except: Option<i64>) -> bool {
        let lowered = label.to_lowercase();
        self.totes
            .iter()
            .any(|t| Some(t.id) != except && t.label.to_lowercase() == lowered)
    }

    fn next_tote_id(&self) -> i64 {
        let mut id = self.clock.now().timestamp_millis();
        while self.totes.iter().any(|t| t.id == id) {
            id += 1;
        }
        id
    }

    // ─── Totes ──────────────────────────────────────────────────────────

    /// Create a tote. Labels are unique case-insensitively and a tote needs
    /// at least one item. Clears the capture draft on success.
    pub async fn add_tote(
        &mut self,
        label: &str,
        room: &str,
        items: Vec<Item>,
        image_url: Option<String>,
    ) -> StoreResult<Tote> {
        let label = non_blank(label, "tote label")?;
        let room = non_blank(room, "room")?;
        let items = clean_items(items);
        if items.is_empty() {
            return Err(StoreError::Invalid("a tote needs at least one item".into()));
        }
        if self.label_taken(&label, None) {
            return Err(StoreError::Conflict(format!(
                "a tote labelled \"{}\" already exists",
                label
            )));
        }

        let tote = Tote {
            id: self.next_tote_id(),
            label,
            room,
            items,
            image_url: image_url.filter(|u| !u.trim().is_empty()),
            created_date: self.clock.now().format("%Y-%m-%d").to_string(),
        };
        self.write_tote(tote.clone()).await?;
        self.reindex();
        if let Err(e) = self.store.delete(DRAFT_KEY).await {
            warn!(namespace = %self.store.namespace(), error = %e, "could not clear draft after adding tote");
        }
        info!(namespace = %self.store.namespace(), id = tote.id, label = %tote.label, "tote added");
        Ok(tote)
    }

    pub async fn delete_tote(&mut self, id: i64) -> StoreResult<()> {
        self.require_tote(id)?;
        self.remove_tote(id).await?;
        self.reindex();
        Ok(())
    }

    pub async fn update_tote_room(&mut self, id: i64, room: &str) -> StoreResult<Tote> {
        let room = non_blank(room, "room")?;
        let mut tote = self.require_tote(id)?.clone();
        tote.room = room;
        self.write_tote(tote.clone()).await?;
        self.reindex();
        Ok(tote)
    }

    pub async fn rename_tote(&mut self, id: i64, label: &str) -> StoreResult<Tote> {
        let label = non_blank(label, "tote label")?;
        if self.label_taken(&label, Some(id)) {
            return Err(StoreError::Conflict(format!(
                "a tote labelled \"{}\" already exists",
                label
            )));
        }
        let mut tote = self.require_tote(id)?.clone();
        tote.label = label;
        self.write_tote(tote.clone()).await?;
        self.reindex();
        Ok(tote)
    }

    // ─── Items ──────────────────────────────────────────────────────────

    /// Append an item. `tags` is a comma-joined list.
    pub async fn add_item(&mut self, id: i64, description: &str, tags: &str) -> StoreResult<Tote> {
        let item = make_item(description, tags)?;
        let mut tote = self.require_tote(id)?.clone();
        tote.items.push(item);
        self.write_tote(tote.clone()).await?;
        self.reindex();
        Ok(tote)
    }

    pub async fn edit_item(
        &mut self,
        id: i64,
        index: usize,
        description: &str,
        tags: &str,
    ) -> StoreResult<Tote> {
        let item = make_item(description, tags)?;
        let mut tote = self.require_tote(id)?.clone();
        let slot = tote
            .items
            .get_mut(index)
            .ok_or_else(|| StoreError::not_found("item", format!("{}#{}", id, index)))?;
        *slot = item;
        self.write_tote(tote.clone()).await?;
        self.reindex();
        Ok(tote)
    }

    /// Remove one item. Returns true when that emptied and deleted the tote.
    pub async fn delete_item(&mut self, id: i64, index: usize) -> StoreResult<bool> {
        let mut tote = self.require_tote(id)?.clone();
        if index >= tote.items.len() {
            return Err(StoreError::not_found("item", format!("{}#{}", id, index)));
        }
        tote.items.remove(index);
        let emptied = tote.items.is_empty();
        self.write_tote(tote).await?;
        self.reindex();
        Ok(emptied)
    }

    /// Remove several items at once. Indices refer to the catalog as it was
    /// before the call. Unknown totes and out-of-range indices are ignored.
    /// Returns the number of totes deleted because they were emptied.
    pub async fn delete_items(&mut self, selection: &[(i64, usize)]) -> StoreResult<usize> {
        let mut by_tote: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for &(id, index) in selection {
            by_tote.entry(id).or_default().push(index);
        }

        let result = self.delete_items_inner(by_tote).await;
        self.reindex();
        result
    }

    async fn delete_items_inner(&mut self, by_tote: BTreeMap<i64, Vec<usize>>) -> StoreResult<usize> {
        let mut deleted = 0;
        for (id, indices) in by_tote {
            let Some(tote) = self.tote(id) else {
                continue;
            };
            let mut tote = tote.clone();
            let before = tote.items.len();
            tote.items = tote
                .items
                .into_iter()
                .enumerate()
                .filter(|(i, _)| !indices.contains(i))
                .map(|(_, item)| item)
                .collect();
            if tote.items.len() == before {
                continue;
            }
            if tote.items.is_empty() {
                deleted += 1;
            }
            self.write_tote(tote).await?;
        }
        Ok(deleted)
    }

    /// Move an item to the end of another tote. The destination is written
    /// before the source, so a failure in between duplicates rather than
    /// loses the item. Returns true when the source tote was emptied and
    /// deleted.
    pub async fn move_item(&mut self, from: i64, index: usize, to: i64) -> StoreResult<bool> {
        if from == to {
            return Err(StoreError::Invalid("source and destination tote are the same".into()));
        }
        let mut source = self.require_tote(from)?.clone();
        let mut destination = self.require_tote(to)?.clone();
        if index >= source.items.len() {
            return Err(StoreError::not_found("item", format!("{}#{}", from, index)));
        }

        let item = source.items.remove(index);
        destination.items.push(item);
        let emptied = source.items.is_empty();

        let result = async {
            self.write_tote(destination).await?;
            self.write_tote(source).await
        }
        .await;
        self.reindex();
        result.map(|_| emptied)
    }

    // ─── Rooms ──────────────────────────────────────────────────────────

    pub async fn add_room(&mut self, name: &str, icon: &str) -> StoreResult<Room> {
        let name = non_blank(name, "room name")?;
        if self.rooms.iter().any(|r| r.name == name) {
            return Err(StoreError::Conflict(format!("room \"{}\" already exists", name)));
        }
        let room = Room {
            name,
            icon: self.icon_or_default(icon),
        };
        let mut rooms = self.rooms.clone();
        rooms.push(room.clone());
        self.write_rooms(rooms).await?;
        Ok(room)
    }

    /// Change a room's name and icon. A rename rewrites every tote in the
    /// old room, one key at a time. Returns how many totes were moved.
    pub async fn update_room(&mut self, old_name: &str, new_name: &str, icon: &str) -> StoreResult<usize> {
        let new_name = non_blank(new_name, "room name")?;
        if !self.rooms.iter().any(|r| r.name == old_name) {
            return Err(StoreError::not_found("room", old_name));
        }
        if new_name != old_name && self.rooms.iter().any(|r| r.name == new_name) {
            return Err(StoreError::Conflict(format!("room \"{}\" already exists", new_name)));
        }

        let icon = self.icon_or_default(icon);
        let rooms: Vec<Room> = self
            .rooms
            .iter()
            .map(|r| {
                if r.name == old_name {
                    Room {
                        name: new_name.clone(),
                        icon: icon.clone(),
                    }
                } else {
                    r.clone()
                }
            })
            .collect();
        self.write_rooms(rooms).await?;

        if new_name == old_name {
            return Ok(0);
        }
        let result = self.cascade_room_rename(old_name, &new_name).await;
        self.reindex();
        result
    }

    async fn cascade_room_rename(&mut self, old_name: &str, new_name: &str) -> StoreResult<usize> {
        let affected: Vec<Tote> = self
            .totes
            .iter()
            .filter(|t| t.room == old_name)
            .cloned()
            .collect();
        let count = affected.len();
        for mut tote in affected {
            tote.room = new_name.to_string();
            self.write_tote(tote).await?;
        }
        Ok(count)
    }

    /// Remove a room. Refused while any tote still references it.
    pub async fn delete_room(&mut self, name: &str) -> StoreResult<()> {
        if !self.rooms.iter().any(|r| r.name == name) {
            return Err(StoreError::not_found("room", name));
        }
        let in_use = self.totes.iter().filter(|t| t.room == name).count();
        if in_use > 0 {
            return Err(StoreError::Conflict(format!(
                "cannot delete \"{}\": it contains {} tote(s). Move or delete them first.",
                name, in_use
            )));
        }
        let rooms = self.rooms.iter().filter(|r| r.name != name).cloned().collect();
        self.write_rooms(rooms).await
    }

    fn icon_or_default(&self, icon: &str) -> String {
        let icon = icon.trim();
        if icon.is_empty() {
            self.options.default_room_icon.clone()
        } else {
            icon.to_string()
        }
    }

    // ─── Import / export / backups ──────────────────────────────────────

    pub fn export(&self) -> ExportFile {
        ExportFile {
            totes: self.totes.clone(),
            rooms: self.rooms.clone(),
            export_date: Some(iso_timestamp(self.clock.now())),
        }
    }

    /// Merge an import file into the catalog. Totes overwrite same-id totes;
    /// the room list is replaced only if the file carries one. Invalid
    /// entries become warnings.
    pub async fn import(&mut self, raw: &Value) -> StoreResult<ImportReport> {
        let payload = normalize_import_payload(raw, &self.options.default_room_icon);
        let (totes, empty) = split_empty(payload.totes);

        let mut report = ImportReport {
            totes: totes.len(),
            rooms: if payload.has_rooms { payload.rooms.len() } else { 0 },
            warnings: payload.warnings,
        };
        if empty > 0 {
            report
                .warnings
                .push(format!("{} tote(s) skipped because they have no items.", empty));
        }

        let result = self
            .import_inner(totes, payload.has_rooms.then_some(payload.rooms))
            .await;
        self.reindex();
        result?;

        info!(
            namespace = %self.store.namespace(),
            totes = report.totes,
            rooms = report.rooms,
            warnings = report.warnings.len(),
            "import finished"
        );
        Ok(report)
    }

    async fn import_inner(&mut self, totes: Vec<Tote>, rooms: Option<Vec<Room>>) -> StoreResult<()> {
        for tote in totes {
            self.write_tote(tote).await?;
        }
        if let Some(rooms) = rooms {
            self.write_rooms(rooms).await?;
        }
        Ok(())
    }

    /// Take a backup now, independent of the automatic schedule.
    pub async fn create_backup(&self) -> StoreResult<BackupEntry> {
        self.backups.create_backup(&self.totes, &self.rooms).await
    }

    /// Replace the live catalog with a retained snapshot: every current
    /// tote key is deleted, then the snapshot's totes and rooms are written.
    pub async fn restore_backup(&mut self, timestamp: &str) -> StoreResult<ImportReport> {
        let snapshot = self
            .backups
            .restore_backup(timestamp)
            .await?
            .ok_or_else(|| StoreError::not_found("backup", timestamp))?;
        let (totes, empty) = split_empty(snapshot.totes);
        let mut report = ImportReport {
            totes: totes.len(),
            rooms: snapshot.rooms.len(),
            warnings: Vec::new(),
        };
        if empty > 0 {
            report
                .warnings
                .push(format!("{} tote(s) skipped because they have no items.", empty));
        }

        let result = self.restore_inner(totes, snapshot.rooms).await;
        self.reindex();
        result?;
        info!(namespace = %self.store.namespace(), timestamp, totes = report.totes, "backup restored");
        Ok(report)
    }

    async fn restore_inner(&mut self, totes: Vec<Tote>, rooms: Vec<Room>) -> StoreResult<()> {
        for key in self.store.list(TOTE_KEY_PREFIX).await? {
            self.store.delete(&key).await?;
            self.totes.retain(|t| t.key() != key);
        }
        self.totes.clear();
        for tote in totes {
            self.write_tote(tote).await?;
        }
        self.write_rooms(rooms).await
    }

    // ─── Draft ──────────────────────────────────────────────────────────

    /// In-progress capture state, opaque to the catalog.
    pub async fn load_draft(&self) -> StoreResult<Option<Value>> {
        self.store.get_json(DRAFT_KEY).await
    }

    pub async fn save_draft(&self, draft: &Value) -> StoreResult<()> {
        self.store.set_json(DRAFT_KEY, draft).await
    }

    pub async fn clear_draft(&self) -> StoreResult<()> {
        self.store.delete(DRAFT_KEY).await
    }

    // ─── Stats ──────────────────────────────────────────────────────────

    pub fn stats(&self) -> CatalogStats {
        let mut rooms: Vec<RoomStats> = self
            .rooms
            .iter()
            .map(|r| RoomStats {
                name: r.name.clone(),
                icon: r.icon.clone(),
                ..RoomStats::default()
            })
            .collect();
        let mut tag_counts: HashMap<&str, usize> = HashMap::new();

        for tote in &self.totes {
            let slot = match rooms.iter().position(|r| r.name == tote.room) {
                Some(i) => i,
                None => {
                    rooms.push(RoomStats {
                        name: tote.room.clone(),
                        icon: UNKNOWN_ROOM_ICON.to_string(),
                        ..RoomStats::default()
                    });
                    rooms.len() - 1
                }
            };
            rooms[slot].tote_count += 1;
            rooms[slot].item_count += tote.items.len();
            for tag in tote.items.iter().flat_map(|i| i.tags.iter()) {
                *tag_counts.entry(tag.as_str()).or_default() += 1;
            }
        }

        let mut top_tags: Vec<(String, usize)> = tag_counts
            .into_iter()
            .map(|(t, n)| (t.to_string(), n))
            .collect();
        top_tags.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_tags.truncate(TOP_TAGS);

        CatalogStats {
            tote_count: self.totes.len(),
            item_count: self.totes.iter().map(|t| t.items.len()).sum(),
            room_count: self.rooms.len(),
            rooms,
            top_tags,
        }
    }
}

fn non_blank(value: &str, what: &str) -> StoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(StoreError::Invalid(format!("{} must not be empty", what)))
    } else {
        Ok(trimmed.to_string())
    }
}

fn make_item(description: &str, tags: &str) -> StoreResult<Item> {
    Ok(Item {
        description: non_blank(description, "item description")?,
        tags: parse_tag_list(tags),
    })
}

/// Trim descriptions, normalize tags, and drop items without a description.
fn clean_items(items: Vec<Item>) -> Vec<Item> {
    items
        .into_iter()
        .filter_map(|item| {
            let description = item.description.trim();
            if description.is_empty() {
                return None;
            }
            Some(Item {
                description: description.to_string(),
                tags: item
                    .tags
                    .iter()
                    .map(|t| t.trim().to_lowercase())
                    .filter(|t| !t.is_empty())
                    .collect(),
            })
        })
        .collect()
}

fn split_empty(totes: Vec<Tote>) -> (Vec<Tote>, usize) {
    let before = totes.len();
    let kept: Vec<Tote> = totes.into_iter().filter(|t| !t.items.is_empty()).collect();
    let dropped = before - kept.len();
    (kept, dropped)
}
