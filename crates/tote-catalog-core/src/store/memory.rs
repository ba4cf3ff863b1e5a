//! In-memory [`KvBackend`] for tests and WASM targets.
//!
//! Uses a `BTreeMap` behind `std::sync::RwLock`. An optional byte quota
//! (key + value lengths, like browser local storage) makes write
//! rejection testable without a real medium. Write and delete failures
//! can be injected the same way.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};

use super::KvBackend;

/// In-memory key-value medium.
pub struct MemoryBackend {
    entries: RwLock<BTreeMap<String, String>>,
    quota_bytes: Option<u64>,
    failing_suffix: Option<String>,
    deletes_left: Option<AtomicUsize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            quota_bytes: None,
            failing_suffix: None,
            deletes_left: None,
        }
    }

    /// A backend that rejects any write pushing total usage past `bytes`.
    pub fn with_quota(bytes: u64) -> Self {
        Self {
            quota_bytes: Some(bytes),
            ..Self::new()
        }
    }

    /// Reject every `set` whose key ends with `suffix`.
    pub fn fail_writes_to(mut self, suffix: impl Into<String>) -> Self {
        self.failing_suffix = Some(suffix.into());
        self
    }

    /// Let `count` deletes through, then reject every delete after them.
    pub fn fail_deletes_after(mut self, count: usize) -> Self {
        self.deletes_left = Some(AtomicUsize::new(count));
        self
    }

    /// Total bytes held (keys plus values).
    pub fn usage_bytes(&self) -> u64 {
        self.entries
            .read()
            .map(|e| e.iter().map(|(k, v)| entry_size(k, v)).sum())
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn entry_size(key: &str, value: &str) -> u64 {
    (key.len() + value.len()) as u64
}

#[async_trait]
impl KvBackend for MemoryBackend {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| StoreError::backend(key, e))?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| StoreError::backend(key, e))?;
        if self.failing_suffix.as_deref().is_some_and(|s| key.ends_with(s)) {
            return Err(StoreError::backend(key, "injected write failure"));
        }
        if let Some(limit) = self.quota_bytes {
            let current: u64 = entries.iter().map(|(k, v)| entry_size(k, v)).sum();
            let replaced = entries.get(key).map(|v| entry_size(key, v)).unwrap_or(0);
            let needed = current - replaced + entry_size(key, value);
            if needed > limit {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    limit,
                });
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        if let Some(left) = &self.deletes_left {
            let allowed = left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if !allowed {
                return Err(StoreError::backend(key, "injected delete failure"));
            }
        }
        let mut entries = self
            .entries
            .write()
            .map_err(|e| StoreError::backend(key, e))?;
        entries.remove(key);
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| StoreError::backend(prefix, e))?;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_delete() {
        let backend = MemoryBackend::new();
        backend.set("k", "v").await.unwrap();
        assert_eq!(backend.get("k").await.unwrap().as_deref(), Some("v"));
        backend.delete("k").await.unwrap();
        assert!(backend.get("k").await.unwrap().is_none());
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn injected_failures() {
        let backend = MemoryBackend::new()
            .fail_writes_to(":list")
            .fail_deletes_after(1);
        assert!(backend.set("backup:list", "[]").await.is_err());
        backend.set("a", "1").await.unwrap();
        backend.set("b", "2").await.unwrap();
        backend.delete("a").await.unwrap();
        assert!(backend.delete("b").await.is_err());
        assert_eq!(backend.get("b").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn prefix_scan_is_bounded() {
        let backend = MemoryBackend::new();
        for k in ["a:1", "a:2", "b:1", "a"] {
            backend.set(k, "x").await.unwrap();
        }
        let keys = backend.keys_with_prefix("a:").await.unwrap();
        assert_eq!(keys, vec!["a:1", "a:2"]);
    }

    #[tokio::test]
    async fn quota_rejects_and_keeps_old_value() {
        let backend = MemoryBackend::with_quota(10);
        backend.set("k", "12345").await.unwrap();
        let err = backend.set("k", "1234567890").await.unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { needed: 11, limit: 10, .. }));
        assert_eq!(backend.get("k").await.unwrap().as_deref(), Some("12345"));
    }

    #[tokio::test]
    async fn quota_counts_replacement_not_addition() {
        let backend = MemoryBackend::with_quota(6);
        backend.set("k", "12345").await.unwrap();
        backend.set("k", "54321").await.unwrap();
        assert_eq!(backend.usage_bytes(), 6);
    }
}
