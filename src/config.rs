//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Default entry freshness window in seconds.
pub const DEFAULT_MAX_FILE_LIFESPAN: u64 = 1200;

/// Default marker staleness window in seconds: how long a write may plausibly
/// take before the writer is presumed dead.
pub const DEFAULT_MAX_WRITE_TIME_ELAPSED: u64 = 60;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
/// The cache root is an explicit value threaded into the store at construction;
/// there is no ambient global directory.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory of the cache tree
    pub cache_dir: PathBuf,
    /// Entry freshness window in seconds
    pub max_file_lifespan: u64,
    /// Marker staleness window in seconds
    pub max_write_time_elapsed: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DIR` - Root directory of the cache tree (default: "cache")
    /// - `MAX_FILE_LIFESPAN` - Entry freshness window in seconds (default: 1200)
    /// - `MAX_WRITE_TIME_ELAPSED` - Marker staleness window in seconds (default: 60)
    pub fn from_env() -> Self {
        Self {
            cache_dir: env::var("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("cache")),
            max_file_lifespan: env::var("MAX_FILE_LIFESPAN")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_FILE_LIFESPAN),
            max_write_time_elapsed: env::var("MAX_WRITE_TIME_ELAPSED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_WRITE_TIME_ELAPSED),
        }
    }

    /// Creates a Config with the default windows rooted at the given directory.
    pub fn with_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ..Self::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("cache"),
            max_file_lifespan: DEFAULT_MAX_FILE_LIFESPAN,
            max_write_time_elapsed: DEFAULT_MAX_WRITE_TIME_ELAPSED,
        }
    }
}
