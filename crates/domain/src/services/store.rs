//! Error type shared by the persistence-facing traits.

use thiserror::Error;

/// Failure reported by a store implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("record already exists")]
    Conflict,

    #[error("storage backend error: {0}")]
    Backend(String),
}
