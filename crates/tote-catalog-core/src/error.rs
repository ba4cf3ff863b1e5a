//! Error types for store, backup, and catalog operations.
//!
//! Only failures of the persistent medium and caller mistakes (unknown
//! tote, duplicate room) become errors. Malformed stored data never does:
//! the normalizer filters it and the loaders log and skip it.

use thiserror::Error;

/// Errors surfaced by the store and the catalog service.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The medium refused the write because it would exceed its quota.
    #[error("storage quota exceeded writing '{key}': need {needed} bytes, limit {limit}")]
    QuotaExceeded {
        key: String,
        needed: u64,
        limit: u64,
    },

    /// The medium failed for any other reason.
    #[error("storage backend error on '{key}': {message}")]
    Backend { key: String, message: String },

    /// A value could not be serialized before writing.
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A referenced entity does not exist.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// The requested change conflicts with existing data.
    #[error("{0}")]
    Conflict(String),

    /// The caller supplied input the catalog cannot accept.
    #[error("invalid input: {0}")]
    Invalid(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        StoreError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn backend(key: &str, err: impl std::fmt::Display) -> Self {
        StoreError::Backend {
            key: key.to_string(),
            message: err.to_string(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
