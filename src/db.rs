use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tote_catalog_core::clock::SystemClock;
use tote_catalog_core::{Catalog, LoadReport, NamespacedStore};

use crate::config::Config;
use crate::migrate;
use crate::sqlite_store::SqliteBackend;

pub async fn connect(config: &Config) -> Result<SqlitePool> {
    let db_path = &config.db.path;

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Open the catalog for `user` (or `catalog.user` from the config).
///
/// Creates the schema on first use, so commands work without a prior
/// `totes init`.
pub async fn open_catalog(config: &Config, user: Option<&str>) -> Result<(Catalog, LoadReport)> {
    let pool = connect(config).await?;
    migrate::ensure_schema(&pool).await?;

    let backend = SqliteBackend::new(pool).with_quota(config.db.quota_bytes);
    let user = user.unwrap_or(&config.catalog.user);
    let store = NamespacedStore::new(Arc::new(backend), user);

    let (catalog, report) =
        Catalog::load(store, Arc::new(SystemClock), config.catalog_options())
            .await
            .with_context(|| format!("Failed to load catalog for '{}'", user))?;

    if let Some(err) = &report.auto_backup_error {
        eprintln!("Warning: automatic backup failed: {}", err);
    }
    Ok((catalog, report))
}
