//! Error types for the daily_cache crate

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or writing cache entries
#[derive(Debug, Error)]
pub enum CacheError {
    /// Key is empty or contains characters unsafe in a file name
    #[error("Invalid cache key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The finished temporary file could not be moved into place
    #[error("Failed to promote cache entry: {0}")]
    PersistError(#[from] tempfile::PersistError),

    /// An entry file holds a different identity than its name says
    #[error("Cache entry {} holds '{found}', expected '{expected}'", path.display())]
    KeyMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },
}

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;
