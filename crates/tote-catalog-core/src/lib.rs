//! # Tote Catalog Core
//!
//! Storage-agnostic logic for Tote Catalog: data models, record
//! normalization, the namespaced key/value store, rolling backups, fuzzy
//! search, and search history.
//!
//! This crate does no filesystem or database I/O of its own. Persistence
//! goes through the [`store::KvBackend`] trait; an in-memory backend ships
//! here and the `tote-catalog` binary provides a SQLite one.

pub mod backup;
pub mod catalog;
pub mod clock;
pub mod error;
pub mod history;
pub mod models;
pub mod normalize;
pub mod search;
pub mod store;
pub mod versioning;

pub use catalog::{Catalog, CatalogOptions, CatalogStats, ImportReport, LoadReport};
pub use error::{StoreError, StoreResult};
pub use store::{KvBackend, Namespace, NamespacedStore};

/// Icon given to rooms that arrive without one.
pub const DEFAULT_ROOM_ICON: &str = "🏠";
