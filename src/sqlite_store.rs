//! SQLite-backed [`KvBackend`] implementation.
//!
//! One row per physical key in `kv_entries`. Namespacing happens above this
//! layer, so the backend sees keys like `tote-organizer:alice:tote:17`.

use async_trait::async_trait;
use sqlx::SqlitePool;

use tote_catalog_core::error::{StoreError, StoreResult};
use tote_catalog_core::store::KvBackend;

/// SQLite implementation of the [`KvBackend`] trait.
///
/// With a quota set, a write that would push the total stored size (key
/// bytes plus value bytes across all rows) past the limit fails with
/// [`StoreError::QuotaExceeded`] and leaves the previous value in place.
pub struct SqliteBackend {
    pool: SqlitePool,
    quota_bytes: Option<u64>,
}

impl SqliteBackend {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            quota_bytes: None,
        }
    }

    pub fn with_quota(mut self, quota_bytes: Option<u64>) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    /// Total stored bytes, as counted against the quota.
    pub async fn usage_bytes(&self) -> StoreResult<u64> {
        let used: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(length(CAST(key AS BLOB)) + length(CAST(value AS BLOB))), 0) FROM kv_entries",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::backend("kv_entries", e))?;
        Ok(used.max(0) as u64)
    }
}

fn entry_size(key: &str, value: &str) -> u64 {
    (key.len() + value.len()) as u64
}

#[async_trait]
impl KvBackend for SqliteBackend {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        sqlx::query_scalar("SELECT value FROM kv_entries WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::backend(key, e))
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::backend(key, e))?;

        if let Some(limit) = self.quota_bytes {
            let current: i64 = sqlx::query_scalar(
                "SELECT COALESCE(SUM(length(CAST(key AS BLOB)) + length(CAST(value AS BLOB))), 0) FROM kv_entries",
            )
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| StoreError::backend(key, e))?;
            let replaced: Option<String> =
                sqlx::query_scalar("SELECT value FROM kv_entries WHERE key = ?")
                    .bind(key)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(|e| StoreError::backend(key, e))?;

            let replaced = replaced.map(|v| entry_size(key, &v)).unwrap_or(0);
            let needed = (current.max(0) as u64).saturating_sub(replaced) + entry_size(key, value);
            if needed > limit {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    limit,
                });
            }
        }

        sqlx::query(
            r#"
            INSERT INTO kv_entries (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::backend(key, e))?;

        tx.commit().await.map_err(|e| StoreError::backend(key, e))
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM kv_entries WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::backend(key, e))?;
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        // substr/length instead of LIKE so `_` and `%` in keys match literally.
        sqlx::query_scalar(
            "SELECT key FROM kv_entries WHERE substr(key, 1, length(?)) = ? ORDER BY key",
        )
        .bind(prefix)
        .bind(prefix)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::backend(prefix, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate::ensure_schema;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn backend(quota: Option<u64>) -> SqliteBackend {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        ensure_schema(&pool).await.unwrap();
        SqliteBackend::new(pool).with_quota(quota)
    }

    #[tokio::test]
    async fn set_get_overwrite_delete() {
        let b = backend(None).await;
        assert!(b.get("a").await.unwrap().is_none());

        b.set("a", "1").await.unwrap();
        b.set("a", "2").await.unwrap();
        assert_eq!(b.get("a").await.unwrap().as_deref(), Some("2"));

        b.delete("a").await.unwrap();
        b.delete("a").await.unwrap();
        assert!(b.get("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn prefix_listing_is_literal() {
        let b = backend(None).await;
        for key in ["ns_a:tote:1", "ns_a:tote:2", "nsXa:tote:3", "ns_a:rooms"] {
            b.set(key, "{}").await.unwrap();
        }
        let keys = b.keys_with_prefix("ns_a:tote:").await.unwrap();
        assert_eq!(keys, vec!["ns_a:tote:1", "ns_a:tote:2"]);
    }

    #[tokio::test]
    async fn quota_rejects_and_keeps_old_value() {
        let b = backend(Some(20)).await;
        b.set("k", "small").await.unwrap();

        let err = b.set("k", &"x".repeat(50)).await.unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { limit: 20, .. }));
        assert_eq!(b.get("k").await.unwrap().as_deref(), Some("small"));

        // Replacing an entry only counts the difference.
        b.set("k", &"y".repeat(19)).await.unwrap();
        assert_eq!(b.usage_bytes().await.unwrap(), 20);
    }
}
