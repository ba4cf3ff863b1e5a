//! # Tote Catalog
//!
//! A local-first inventory of storage totes: what is in each tote, which
//! room it lives in, and a typo-tolerant search to find things again.
//!
//! This crate is the `totes` command-line application. The catalog logic
//! lives in [`tote_catalog_core`]; this crate adds TOML configuration, a
//! SQLite-backed key/value store, logging, and the CLI commands.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────┐   ┌──────────────┐
//! │  CLI (totes) │──▶│ Catalog (core)   │──▶│ NamespacedKV │
//! │  commands    │   │ search / backups │   │   (core)     │
//! └──────────────┘   └──────────────────┘   └──────┬───────┘
//!                                                  ▼
//!                                           ┌──────────────┐
//!                                           │ SQLite       │
//!                                           │ kv_entries   │
//!                                           └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! totes init
//! totes room add Garage --icon 🚗
//! totes tote add --label "Tote 1" --room Garage --item "Cordless drill|tools, power"
//! totes search "drll"
//! totes --user bob tote list
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection and catalog opening |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite key/value backend |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`search`] | Search and history commands |

pub mod backup_cmd;
pub mod config;
pub mod db;
pub mod draft_cmd;
pub mod export;
pub mod logging;
pub mod migrate;
pub mod room_cmd;
pub mod search;
pub mod sqlite_store;
pub mod stats;
pub mod tote_cmd;
