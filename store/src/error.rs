//! Errors surfaced by every storage backend.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key not found: {0}")]
    NotFound(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// A persisted state value that cannot be interpreted (e.g. a non-numeric cursor).
    #[error("invalid value for state key '{key}': {value}")]
    InvalidState { key: String, value: String },

    #[error("database is corrupted: {0}")]
    Corruption(String),
}
