//! Error types for the cache
//!
//! Provides unified error handling using thiserror.
//!
//! Expected outcomes are not errors: a cache miss and a dogpile skip are
//! ordinary values (`Lookup::Miss`, `SaveOutcome::Skipped`). This enum covers
//! the conditions that genuinely went wrong.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key is empty, escapes the cache root, or contains invalid components
    #[error("invalid cache key: {0}")]
    InvalidKey(String),

    /// Creating the target directory failed for a reason other than
    /// "already exists"
    #[error("failed to create cache directory {path}: {source}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The entry file to snapshot onto the marker vanished mid-copy
    #[error("snapshot source missing: {0}")]
    CopySourceMissing(PathBuf),

    /// Structured value could not be encoded or decoded
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other filesystem failure
    #[error("filesystem error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CacheError {
    /// Wraps an `io::Error` with the path it occurred at.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
