//! Recent search queries, most recent first.

use serde_json::Value;

use crate::error::StoreResult;
use crate::models::SEARCH_HISTORY_KEY;
use crate::store::NamespacedStore;

pub const MAX_SEARCH_HISTORY: usize = 5;

/// Search history for one namespace, persisted under `search-history`.
#[derive(Clone)]
pub struct SearchHistory {
    store: NamespacedStore,
    limit: usize,
}

impl SearchHistory {
    pub fn new(store: NamespacedStore) -> Self {
        Self {
            store,
            limit: MAX_SEARCH_HISTORY,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    /// Stored queries, most recent first. Unreadable history is empty.
    pub async fn get(&self) -> StoreResult<Vec<String>> {
        let Some(Value::Array(entries)) = self.store.get_json(SEARCH_HISTORY_KEY).await? else {
            return Ok(Vec::new());
        };
        Ok(entries
            .into_iter()
            .filter_map(|e| e.as_str().map(str::to_string))
            .take(self.limit)
            .collect())
    }

    /// Record `query` as the latest search. Blank queries are ignored and a
    /// case-insensitive duplicate is replaced by the new casing.
    pub async fn add(&self, query: &str) -> StoreResult<()> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(());
        }
        let lowered = query.to_lowercase();
        let mut history = self.get().await?;
        history.retain(|q| q.to_lowercase() != lowered);
        history.insert(0, query.to_string());
        history.truncate(self.limit);
        self.store.set_json(SEARCH_HISTORY_KEY, &history).await
    }

    pub async fn clear(&self) -> StoreResult<()> {
        self.store.delete(SEARCH_HISTORY_KEY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryBackend;
    use std::sync::Arc;

    fn history() -> SearchHistory {
        SearchHistory::new(NamespacedStore::new(Arc::new(MemoryBackend::new()), "alice"))
    }

    #[tokio::test]
    async fn case_insensitive_dedup_keeps_latest_casing() {
        let h = history();
        h.add("Drill").await.unwrap();
        h.add("drill").await.unwrap();
        assert_eq!(h.get().await.unwrap(), vec!["drill"]);
    }

    #[tokio::test]
    async fn most_recent_first_and_bounded() {
        let h = history();
        for q in ["a1", "b2", "c3", "d4", "e5", "f6"] {
            h.add(q).await.unwrap();
        }
        assert_eq!(h.get().await.unwrap(), vec!["f6", "e5", "d4", "c3", "b2"]);

        h.add("c3").await.unwrap();
        assert_eq!(h.get().await.unwrap(), vec!["c3", "f6", "e5", "d4", "b2"]);
    }

    #[tokio::test]
    async fn blank_queries_are_ignored() {
        let h = history();
        h.add("   ").await.unwrap();
        h.add("").await.unwrap();
        assert!(h.get().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn clear_empties_history() {
        let h = history();
        h.add("tent").await.unwrap();
        h.clear().await.unwrap();
        assert!(h.get().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_history_reads_empty() {
        let store = NamespacedStore::new(Arc::new(MemoryBackend::new()), "alice");
        store.set(SEARCH_HISTORY_KEY, "[\"ok\", 3, null").await.unwrap();
        let h = SearchHistory::new(store.clone());
        assert!(h.get().await.unwrap().is_empty());

        store.set(SEARCH_HISTORY_KEY, "[\"ok\", 3]").await.unwrap();
        assert_eq!(h.get().await.unwrap(), vec!["ok"]);
    }
}
