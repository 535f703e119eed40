//! Error types for the cache.
//!
//! Every fallible cache operation returns [`CacheError`]. The key-level
//! variants (`AlreadyExists`, `NotFound`, `InvalidType`) are resolved at the
//! call site and never retried by the cache itself.

use std::io;
use thiserror::Error;

/// Unified error type for cache operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// `add` found a live entry under the key.
    #[error("key already exists: {0}")]
    AlreadyExists(String),

    /// `replace` or a numeric delta found no live entry under the key.
    #[error("key not found: {0}")]
    NotFound(String),

    /// A numeric delta targeted a value of an incompatible type.
    #[error("incompatible value type for key {key}: {found}")]
    InvalidType {
        /// The key whose value could not be mutated
        key: String,
        /// Type name of the stored value
        found: &'static str,
    },

    /// Reading or writing a snapshot failed at the I/O layer.
    #[error("snapshot I/O error: {0}")]
    Io(#[from] io::Error),

    /// A snapshot could not be encoded or decoded.
    #[error("snapshot encoding error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The janitor thread or its runtime could not be started.
    #[error("failed to start background janitor: {0}")]
    Spawn(#[source] io::Error),
}

impl CacheError {
    /// Returns true for the per-key conditions (`AlreadyExists`, `NotFound`,
    /// `InvalidType`) as opposed to I/O or startup failures.
    pub fn is_key_error(&self) -> bool {
        matches!(
            self,
            CacheError::AlreadyExists(_) | CacheError::NotFound(_) | CacheError::InvalidType { .. }
        )
    }
}

/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
