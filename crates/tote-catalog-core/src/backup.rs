//! Rolling point-in-time snapshots of a namespace's catalog.
//!
//! # Storage layout
//!
//! | Key | Value |
//! |-----|-------|
//! | `backup:<timestamp>` | versioned snapshot `{totes, rooms}` |
//! | `backup:list` | JSON array of [`BackupEntry`], oldest first |
//! | `backup:lastAuto` | ISO-8601 time of the last automatic backup |
//!
//! The index (`backup:list`) is the source of truth for what can be
//! restored. [`BackupManager::create_backup`] writes the new blob, then the
//! trimmed index, and only then deletes evicted blobs. A crash anywhere in
//! that sequence can leave an unreferenced blob behind but never an index
//! entry pointing at a deleted one; unreferenced blobs are swept on the
//! next backup.
//!
//! The manager only reads snapshots back. Clearing live totes and writing
//! restored ones is the caller's job (see `Catalog::restore_backup`).

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Duration;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::error::StoreResult;
use crate::models::{
    BackupEntry, Room, Tote, BACKUP_KEY_PREFIX, BACKUP_LAST_AUTO_KEY, BACKUP_LIST_KEY,
};
use crate::normalize::{normalize_rooms, normalize_tote};
use crate::store::NamespacedStore;
use crate::versioning::{iso_timestamp, parse_iso_timestamp, unwrap_versioned, Versioned};

/// Number of snapshots retained per namespace.
pub const MAX_BACKUPS: usize = 3;

/// Minimum spacing between automatic backups.
pub const AUTO_BACKUP_INTERVAL_HOURS: i64 = 24;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    totes: &'a [Tote],
    rooms: &'a [Room],
}

/// A snapshot read back by [`BackupManager::restore_backup`], already normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct BackupSnapshot {
    pub timestamp: String,
    pub totes: Vec<Tote>,
    pub rooms: Vec<Room>,
}

pub struct BackupManager {
    store: NamespacedStore,
    clock: Arc<dyn Clock>,
    max_backups: usize,
    interval: Duration,
    default_icon: String,
}

impl BackupManager {
    pub fn new(store: NamespacedStore, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            max_backups: MAX_BACKUPS,
            interval: Duration::hours(AUTO_BACKUP_INTERVAL_HOURS),
            default_icon: crate::DEFAULT_ROOM_ICON.to_string(),
        }
    }

    /// Override retention (clamped to at least one snapshot) and the
    /// auto-backup interval.
    pub fn with_retention(mut self, max_backups: usize, interval: Duration) -> Self {
        self.max_backups = max_backups.max(1);
        self.interval = interval;
        self
    }

    /// Icon given to rooms restored from legacy snapshots.
    pub fn with_default_icon(mut self, icon: impl Into<String>) -> Self {
        self.default_icon = icon.into();
        self
    }

    pub fn max_backups(&self) -> usize {
        self.max_backups
    }

    /// True when no automatic backup was ever recorded, the marker is
    /// unreadable, or at least the configured interval has passed.
    pub async fn should_auto_backup(&self) -> StoreResult<bool> {
        let Some(raw) = self.store.get(BACKUP_LAST_AUTO_KEY).await? else {
            return Ok(true);
        };
        let Some(last) = parse_iso_timestamp(raw.trim().trim_matches('"')) else {
            warn!(namespace = %self.store.namespace(), marker = %raw, "unreadable auto-backup marker");
            return Ok(true);
        };
        Ok(self.clock.now() - last >= self.interval)
    }

    /// Record that an automatic backup just completed.
    pub async fn mark_auto_backup_done(&self) -> StoreResult<()> {
        self.store
            .set(BACKUP_LAST_AUTO_KEY, &iso_timestamp(self.clock.now()))
            .await
    }

    /// Retained snapshots, oldest first. Malformed index data reads as empty
    /// (or loses just the malformed entries).
    pub async fn get_backups(&self) -> StoreResult<Vec<BackupEntry>> {
        let Some(Value::Array(entries)) = self.store.get_json(BACKUP_LIST_KEY).await? else {
            return Ok(Vec::new());
        };
        Ok(entries
            .into_iter()
            .filter_map(|e| serde_json::from_value::<BackupEntry>(e).ok())
            .collect())
    }

    /// Snapshot `totes` and `rooms`, append to the index, and evict the
    /// oldest snapshots beyond the retention bound.
    pub async fn create_backup(&self, totes: &[Tote], rooms: &[Room]) -> StoreResult<BackupEntry> {
        let mut index = self.get_backups().await?;

        let mut at = self.clock.now();
        let mut timestamp = iso_timestamp(at);
        while index.iter().any(|e| e.timestamp == timestamp) {
            at += Duration::milliseconds(1);
            timestamp = iso_timestamp(at);
        }

        let blob_key = backup_key(&timestamp);
        let snapshot = Versioned::current(SnapshotRef { totes, rooms }, at);
        self.store.set_json(&blob_key, &snapshot).await?;

        let entry = BackupEntry {
            timestamp,
            tote_count: totes.len(),
            room_count: rooms.len(),
        };
        index.push(entry.clone());
        let excess = index.len().saturating_sub(self.max_backups);
        let evicted: Vec<BackupEntry> = index.drain(..excess).collect();

        if let Err(e) = self.store.set_json(BACKUP_LIST_KEY, &index).await {
            // The blob is unreferenced now; best effort to not leave it behind.
            let _ = self.store.delete(&blob_key).await;
            return Err(e);
        }

        info!(
            namespace = %self.store.namespace(),
            timestamp = %entry.timestamp,
            totes = entry.tote_count,
            rooms = entry.room_count,
            evicted = evicted.len(),
            "backup created"
        );

        self.sweep_unreferenced(&index).await;
        Ok(entry)
    }

    /// Delete snapshot blobs the index no longer references. Failures are
    /// logged; the next backup retries.
    async fn sweep_unreferenced(&self, index: &[BackupEntry]) {
        let keep: HashSet<String> = index.iter().map(|e| backup_key(&e.timestamp)).collect();
        let keys = match self.store.list(BACKUP_KEY_PREFIX).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(namespace = %self.store.namespace(), error = %e, "could not list backup blobs");
                return;
            }
        };
        for key in keys {
            if key == BACKUP_LIST_KEY || key == BACKUP_LAST_AUTO_KEY || keep.contains(&key) {
                continue;
            }
            if let Err(e) = self.store.delete(&key).await {
                warn!(namespace = %self.store.namespace(), key = %key, error = %e, "could not delete evicted backup");
            }
        }
    }

    /// Read back the snapshot recorded at `timestamp`.
    ///
    /// Returns `None` when the index does not list it, the blob is missing,
    /// or the blob is corrupt.
    pub async fn restore_backup(&self, timestamp: &str) -> StoreResult<Option<BackupSnapshot>> {
        let listed = self
            .get_backups()
            .await?
            .iter()
            .any(|e| e.timestamp == timestamp);
        if !listed {
            return Ok(None);
        }

        let Some(raw) = self.store.get_json(&backup_key(timestamp)).await? else {
            warn!(namespace = %self.store.namespace(), timestamp, "backup blob missing or corrupt");
            return Ok(None);
        };
        let (payload, _) = unwrap_versioned(raw);
        let Some(map) = payload.as_object() else {
            warn!(namespace = %self.store.namespace(), timestamp, "backup blob has no snapshot object");
            return Ok(None);
        };

        let totes = match map.get("totes") {
            Some(Value::Array(entries)) => entries.iter().filter_map(normalize_tote).collect(),
            _ => Vec::new(),
        };
        let rooms = map
            .get("rooms")
            .map(|r| normalize_rooms(r, &self.default_icon).rooms)
            .unwrap_or_default();

        Ok(Some(BackupSnapshot {
            timestamp: timestamp.to_string(),
            totes,
            rooms,
        }))
    }
}

pub fn backup_key(timestamp: &str) -> String {
    format!("{}{}", BACKUP_KEY_PREFIX, timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::StoreError;
    use crate::models::Item;
    use crate::store::memory::MemoryBackend;
    use chrono::{TimeZone, Utc};

    fn setup() -> (Arc<ManualClock>, NamespacedStore, BackupManager) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
        ));
        let store = NamespacedStore::new(Arc::new(MemoryBackend::new()), "alice");
        let manager = BackupManager::new(store.clone(), clock.clone());
        (clock, store, manager)
    }

    fn tote(id: i64) -> Tote {
        Tote {
            id,
            label: format!("Tote {}", id),
            room: "Garage".to_string(),
            items: vec![Item {
                description: "Drill".to_string(),
                tags: vec!["tools".to_string()],
            }],
            image_url: None,
            created_date: "3/1/2024".to_string(),
        }
    }

    fn rooms() -> Vec<Room> {
        vec![Room {
            name: "Garage".to_string(),
            icon: "🚗".to_string(),
        }]
    }

    #[tokio::test]
    async fn auto_backup_due_without_marker() {
        let (_, _, manager) = setup();
        assert!(manager.should_auto_backup().await.unwrap());
    }

    #[tokio::test]
    async fn auto_backup_respects_interval() {
        let (clock, _, manager) = setup();
        manager.mark_auto_backup_done().await.unwrap();
        assert!(!manager.should_auto_backup().await.unwrap());

        clock.advance(Duration::hours(23));
        assert!(!manager.should_auto_backup().await.unwrap());

        clock.advance(Duration::hours(1));
        assert!(manager.should_auto_backup().await.unwrap());
    }

    #[tokio::test]
    async fn garbage_marker_means_due() {
        let (_, store, manager) = setup();
        store.set(BACKUP_LAST_AUTO_KEY, "yesterday-ish").await.unwrap();
        assert!(manager.should_auto_backup().await.unwrap());
    }

    #[tokio::test]
    async fn rotation_keeps_three_and_drops_oldest_blob() {
        let (clock, store, manager) = setup();
        let mut stamps = Vec::new();
        for i in 0..4 {
            let entry = manager.create_backup(&[tote(i)], &rooms()).await.unwrap();
            stamps.push(entry.timestamp);
            clock.advance(Duration::minutes(5));
        }

        let backups = manager.get_backups().await.unwrap();
        assert_eq!(backups.len(), 3);
        assert_eq!(
            backups.iter().map(|b| b.timestamp.clone()).collect::<Vec<_>>(),
            stamps[1..].to_vec()
        );

        assert!(manager.restore_backup(&stamps[0]).await.unwrap().is_none());
        assert!(store.get(&backup_key(&stamps[0])).await.unwrap().is_none());

        let blobs: Vec<String> = store
            .list(BACKUP_KEY_PREFIX)
            .await
            .unwrap()
            .into_iter()
            .filter(|k| k != BACKUP_LIST_KEY)
            .collect();
        assert_eq!(blobs.len(), 3);
    }

    #[tokio::test]
    async fn same_instant_backups_get_distinct_keys() {
        let (_, _, manager) = setup();
        let a = manager.create_backup(&[], &[]).await.unwrap();
        let b = manager.create_backup(&[], &[]).await.unwrap();
        assert_ne!(a.timestamp, b.timestamp);
        assert_eq!(manager.get_backups().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn restore_returns_snapshot_contents() {
        let (_, _, manager) = setup();
        let entry = manager
            .create_backup(&[tote(1), tote(2)], &rooms())
            .await
            .unwrap();
        assert_eq!(entry.tote_count, 2);
        assert_eq!(entry.room_count, 1);

        let snapshot = manager.restore_backup(&entry.timestamp).await.unwrap().unwrap();
        assert_eq!(snapshot.totes, vec![tote(1), tote(2)]);
        assert_eq!(snapshot.rooms, rooms());
    }

    #[tokio::test]
    async fn restore_unknown_or_corrupt_is_none() {
        let (_, store, manager) = setup();
        assert!(manager.restore_backup("2020-01-01T00:00:00.000Z").await.unwrap().is_none());

        let entry = manager.create_backup(&[tote(1)], &rooms()).await.unwrap();
        store
            .set(&backup_key(&entry.timestamp), "{{{ truncated")
            .await
            .unwrap();
        assert!(manager.restore_backup(&entry.timestamp).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn malformed_index_reads_as_empty() {
        let (_, store, manager) = setup();
        store.set(BACKUP_LIST_KEY, "{\"not\": \"a list\"}").await.unwrap();
        assert!(manager.get_backups().await.unwrap().is_empty());
        store.set(BACKUP_LIST_KEY, "not json").await.unwrap();
        assert!(manager.get_backups().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn orphaned_blob_is_swept_on_next_backup() {
        let (clock, store, manager) = setup();
        store
            .set(&backup_key("2000-01-01T00:00:00.000Z"), "{}")
            .await
            .unwrap();
        manager.create_backup(&[tote(1)], &rooms()).await.unwrap();
        clock.advance(Duration::seconds(1));
        assert!(store
            .get(&backup_key("2000-01-01T00:00:00.000Z"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn failed_index_write_removes_blob() {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()));
        let backend = MemoryBackend::new().fail_writes_to(BACKUP_LIST_KEY);
        let store = NamespacedStore::new(Arc::new(backend), "alice");
        let manager = BackupManager::new(store.clone(), clock);

        let result = manager.create_backup(&[tote(1)], &rooms()).await;
        assert!(matches!(result, Err(StoreError::Backend { .. })));
        assert!(manager.get_backups().await.unwrap().is_empty());
        assert!(store.list(BACKUP_KEY_PREFIX).await.unwrap().is_empty());
    }
}
