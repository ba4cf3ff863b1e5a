//! Namespaced key-value storage.
//!
//! The [`KvBackend`] trait is the persistent medium: a flat, global
//! string-to-string map (SQLite, in-memory, browser storage, ...).
//! [`NamespacedStore`] layers the product prefix and a per-user
//! [`Namespace`] on top, so every key a caller sees is relative:
//!
//! ```text
//! caller key      tote:1717171717171
//! physical key    tote-organizer:alice:tote:1717171717171
//! ```
//!
//! A `NamespacedStore` is an explicit handle rather than process-wide
//! state. Retargeting one handle with [`NamespacedStore::set_namespace`]
//! never touches data under the old namespace, and independent handles
//! (see [`NamespacedStore::with_namespace`]) can address different
//! namespaces at the same time.
//!
//! # Consistency
//!
//! A single `set`/`delete` is as atomic as the backend makes it. Nothing
//! groups several calls: a multi-key sequence that fails halfway leaves
//! the keys it already wrote in place. Concurrent writers to one key are
//! last-write-wins.

pub mod memory;

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::StoreResult;

/// Fixed tag in front of every physical key.
pub const PRODUCT_PREFIX: &str = "tote-organizer:";

/// Namespace used when a raw user name sanitizes to nothing.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Abstract persistent medium.
///
/// Keys are global; implementations know nothing about namespaces.
/// Write failures (quota, I/O) must be returned as errors.
#[async_trait]
pub trait KvBackend: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// All physical keys starting with `prefix`, in any order.
    async fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>>;
}

/// A sanitized storage namespace: lowercase `[a-z0-9_-]` only.
///
/// Distinct raw names that sanitize to the same string share storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace(String);

impl Namespace {
    pub fn sanitize(raw: &str) -> Self {
        let cleaned: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_' || *c == '-')
            .collect();
        if cleaned.is_empty() {
            Self::default()
        } else {
            Self(cleaned)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self(DEFAULT_NAMESPACE.to_string())
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle scoping every key to one namespace.
#[derive(Clone)]
pub struct NamespacedStore {
    backend: Arc<dyn KvBackend>,
    namespace: Namespace,
}

impl NamespacedStore {
    pub fn new(backend: Arc<dyn KvBackend>, raw_user: &str) -> Self {
        Self {
            backend,
            namespace: Namespace::sanitize(raw_user),
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Point this handle at another namespace. Data under the previous
    /// namespace is neither moved nor touched.
    pub fn set_namespace(&mut self, raw_user: &str) {
        self.namespace = Namespace::sanitize(raw_user);
    }

    /// A second handle on the same backend, scoped to `raw_user`.
    pub fn with_namespace(&self, raw_user: &str) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            namespace: Namespace::sanitize(raw_user),
        }
    }

    fn scope_prefix(&self) -> String {
        format!("{}{}:", PRODUCT_PREFIX, self.namespace)
    }

    fn physical_key(&self, key: &str) -> String {
        format!("{}{}", self.scope_prefix(), key)
    }

    /// Keys under this namespace starting with `prefix`, with the product
    /// tag and namespace stripped.
    pub async fn list(&self, prefix: &str) -> StoreResult<BTreeSet<String>> {
        let scope = self.scope_prefix();
        let physical = self
            .backend
            .keys_with_prefix(&format!("{}{}", scope, prefix))
            .await?;
        Ok(physical
            .into_iter()
            .filter_map(|k| k.strip_prefix(&scope).map(str::to_string))
            .collect())
    }

    pub async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.backend.get(&self.physical_key(key)).await
    }

    pub async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.backend.set(&self.physical_key(key), value).await
    }

    pub async fn delete(&self, key: &str) -> StoreResult<()> {
        self.backend.delete(&self.physical_key(key)).await
    }

    /// Read and parse a JSON value. Corrupt JSON is logged and treated as
    /// absent; only medium failures are errors.
    pub async fn get_json(&self, key: &str) -> StoreResult<Option<Value>> {
        let Some(raw) = self.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(namespace = %self.namespace, key, error = %e, "ignoring corrupt stored JSON");
                Ok(None)
            }
        }
    }

    pub async fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StoreResult<()> {
        let raw = serde_json::to_string(value)?;
        self.set(key, &raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryBackend;
    use super::*;

    fn store(user: &str) -> (Arc<MemoryBackend>, NamespacedStore) {
        let backend = Arc::new(MemoryBackend::new());
        let store = NamespacedStore::new(backend.clone(), user);
        (backend, store)
    }

    #[test]
    fn sanitize_lowercases_and_filters() {
        assert_eq!(Namespace::sanitize("  Alice Smith! ").as_str(), "alicesmith");
        assert_eq!(Namespace::sanitize("bob_2-x").as_str(), "bob_2-x");
        assert_eq!(Namespace::sanitize("***").as_str(), DEFAULT_NAMESPACE);
        assert_eq!(Namespace::sanitize("").as_str(), DEFAULT_NAMESPACE);
    }

    #[test]
    fn distinct_names_can_collide() {
        assert_eq!(Namespace::sanitize("Alice"), Namespace::sanitize("a.l.i.c.e"));
    }

    #[tokio::test]
    async fn keys_are_prefixed_physically() {
        let (backend, store) = store("Alice");
        store.set("tote:1", "{}").await.unwrap();
        assert!(backend
            .get("tote-organizer:alice:tote:1")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn list_strips_prefix_and_filters() {
        let (_, store) = store("alice");
        store.set("tote:1", "{}").await.unwrap();
        store.set("tote:2", "{}").await.unwrap();
        store.set("rooms", "[]").await.unwrap();
        let keys = store.list("tote:").await.unwrap();
        assert_eq!(
            keys.into_iter().collect::<Vec<_>>(),
            vec!["tote:1".to_string(), "tote:2".to_string()]
        );
    }

    #[tokio::test]
    async fn namespace_switch_isolates_data() {
        let (_, mut store) = store("alice");
        store.set("tote:1", "{}").await.unwrap();

        store.set_namespace("bob");
        assert!(store.list("tote:").await.unwrap().is_empty());
        assert!(store.get("tote:1").await.unwrap().is_none());

        store.set_namespace("alice");
        assert_eq!(store.list("tote:").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn prefix_namespaces_do_not_leak() {
        let (_, store) = store("a");
        let other = store.with_namespace("ab");
        other.set("tote:1", "{}").await.unwrap();
        assert!(store.list("tote:").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn colliding_names_share_storage() {
        let (_, store) = store("Alice");
        store.set("rooms", "[]").await.unwrap();
        let twin = store.with_namespace("alice!");
        assert_eq!(twin.get("rooms").await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn get_json_treats_corrupt_as_absent() {
        let (_, store) = store("alice");
        store.set("rooms", "{not json").await.unwrap();
        assert!(store.get_json("rooms").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_removes_key() {
        let (_, store) = store("alice");
        store.set_json("search-history", &["drill"]).await.unwrap();
        store.delete("search-history").await.unwrap();
        assert!(store.get("search-history").await.unwrap().is_none());
        store.delete("search-history").await.unwrap();
    }
}
