//! Top-level error type shared across crates.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuillError {
    #[error("invalid block height: {0}")]
    InvalidHeight(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("{0}")]
    Other(String),
}
