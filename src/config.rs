//! TOML configuration for the `totes` binary.
//!
//! Every section except `[db]` is optional and falls back to the defaults
//! the catalog core uses.
//!
//! ```toml
//! [db]
//! path = "./data/totes.sqlite"
//! quota_bytes = 5242880      # optional
//!
//! [catalog]
//! user = "alice"
//! default_room_icon = "🏠"
//!
//! [backup]
//! max_backups = 3
//! auto_interval_hours = 24
//!
//! [search]
//! threshold = 0.4
//! min_token_len = 2
//! history_limit = 5
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use tote_catalog_core::backup::{AUTO_BACKUP_INTERVAL_HOURS, MAX_BACKUPS};
use tote_catalog_core::history::MAX_SEARCH_HISTORY;
use tote_catalog_core::search::{SearchOptions, DEFAULT_MIN_TOKEN_LEN, DEFAULT_THRESHOLD};
use tote_catalog_core::{CatalogOptions, DEFAULT_ROOM_ICON};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub backup: BackupConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
    /// Upper bound on stored bytes (keys plus values). Unlimited when unset.
    #[serde(default)]
    pub quota_bytes: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    /// Namespace used when `--user` is not given.
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default = "default_room_icon")]
    pub default_room_icon: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            user: default_user(),
            default_room_icon: default_room_icon(),
        }
    }
}

fn default_user() -> String {
    "default".to_string()
}
fn default_room_icon() -> String {
    DEFAULT_ROOM_ICON.to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackupConfig {
    #[serde(default = "default_max_backups")]
    pub max_backups: usize,
    #[serde(default = "default_auto_interval_hours")]
    pub auto_interval_hours: i64,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            max_backups: default_max_backups(),
            auto_interval_hours: default_auto_interval_hours(),
        }
    }
}

fn default_max_backups() -> usize {
    MAX_BACKUPS
}
fn default_auto_interval_hours() -> i64 {
    AUTO_BACKUP_INTERVAL_HOURS
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_min_token_len")]
    pub min_token_len: usize,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            min_token_len: default_min_token_len(),
            history_limit: default_history_limit(),
        }
    }
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}
fn default_min_token_len() -> usize {
    DEFAULT_MIN_TOKEN_LEN
}
fn default_history_limit() -> usize {
    MAX_SEARCH_HISTORY
}

impl Config {
    /// Catalog tunables derived from the `[catalog]`, `[backup]` and
    /// `[search]` sections.
    pub fn catalog_options(&self) -> CatalogOptions {
        CatalogOptions {
            default_room_icon: self.catalog.default_room_icon.clone(),
            max_backups: self.backup.max_backups,
            auto_backup_interval: chrono::Duration::hours(self.backup.auto_interval_hours),
            search: SearchOptions {
                threshold: self.search.threshold,
                min_token_len: self.search.min_token_len,
            },
            history_limit: self.search.history_limit,
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.db.quota_bytes == Some(0) {
        anyhow::bail!("db.quota_bytes must be > 0 when set");
    }

    if config.catalog.default_room_icon.trim().is_empty() {
        anyhow::bail!("catalog.default_room_icon must not be empty");
    }

    if config.backup.max_backups == 0 {
        anyhow::bail!("backup.max_backups must be >= 1");
    }
    if config.backup.auto_interval_hours < 0 {
        anyhow::bail!("backup.auto_interval_hours must be >= 0");
    }

    if !(0.0..=1.0).contains(&config.search.threshold) {
        anyhow::bail!("search.threshold must be in [0.0, 1.0]");
    }
    if config.search.min_token_len == 0 {
        anyhow::bail!("search.min_token_len must be >= 1");
    }
    if config.search.history_limit == 0 {
        anyhow::bail!("search.history_limit must be >= 1");
    }

    Ok(())
}
