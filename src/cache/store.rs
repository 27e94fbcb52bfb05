//! Cache Store Module
//!
//! Main cache engine over a directory tree: each entry is a file whose
//! modification time is the sole timestamp of record, and writes are guarded
//! by the dogpile marker protocol. The store holds no in-memory index; every
//! operation round-trips through disk state.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::cache::{
    Acquisition, CacheKey, CacheStats, DogpileCoordinator, StalenessPolicy, StatsSnapshot,
    ENTRY_EXTENSION, MARKER_EXTENSION,
};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::fsio::{DiskFs, FileSystem};

// == Lookup Outcome ==
/// Result of a retrieval: the stored value, or a miss.
///
/// A miss covers both "never saved" and "saved but stale"; it is an ordinary
/// value, never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// The entry exists and is fresh
    Hit(T),
    /// The entry is absent or past its lifespan
    Miss,
}

impl<T> Lookup<T> {
    /// Returns true if this is a hit.
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }

    /// Returns true if this is a miss.
    pub fn is_miss(&self) -> bool {
        matches!(self, Lookup::Miss)
    }

    /// Converts into `Option`, discarding the hit/miss distinction.
    pub fn into_option(self) -> Option<T> {
        match self {
            Lookup::Hit(value) => Some(value),
            Lookup::Miss => None,
        }
    }
}

// == Save Outcome ==
/// Result of a save that did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The entry was written and the marker released
    Saved,
    /// Another writer held the marker; nothing was written
    Skipped,
}

impl SaveOutcome {
    /// Returns true if the entry was written.
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved)
    }
}

// == Cache Store ==
/// Filesystem-backed key/value cache with TTL expiration and dogpile
/// avoidance around writes.
///
/// Generic over the filesystem capability; production code uses the `DiskFs`
/// default.
#[derive(Debug)]
pub struct CacheStore<F: FileSystem = DiskFs> {
    /// Root directory of the cache tree
    root: PathBuf,
    /// Entry freshness window
    entry_lifespan: Duration,
    /// Marker staleness window
    write_window: Duration,
    /// Freshness evaluation
    policy: StalenessPolicy,
    /// Marker acquisition and release
    coordinator: DogpileCoordinator,
    /// Performance counters
    stats: CacheStats,
    /// Filesystem capability
    fs: F,
}

impl CacheStore<DiskFs> {
    // == Constructor ==
    /// Creates a store over the real filesystem from the given configuration.
    pub fn new(config: &Config) -> Self {
        Self::with_fs(config, DiskFs)
    }
}

impl<F: FileSystem> CacheStore<F> {
    /// Creates a store over an explicit filesystem capability.
    pub fn with_fs(config: &Config, fs: F) -> Self {
        let write_window = Duration::from_secs(config.max_write_time_elapsed);
        Self {
            root: config.cache_dir.clone(),
            entry_lifespan: Duration::from_secs(config.max_file_lifespan),
            write_window,
            policy: StalenessPolicy,
            coordinator: DogpileCoordinator::new(write_window),
            stats: CacheStats::new(),
            fs,
        }
    }

    /// Returns the cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // == Retrieve ==
    /// Retrieves and deserializes the value stored under `key`.
    ///
    /// # Returns
    /// - `Ok(Lookup::Hit(value))` if the entry exists and is fresh
    /// - `Ok(Lookup::Miss)` if the entry is absent or stale
    /// - `Err` on filesystem or deserialization failure
    pub fn retrieve<T: DeserializeOwned>(&self, key: &str) -> Result<Lookup<T>> {
        match self.retrieve_raw(key)? {
            Lookup::Hit(bytes) => Ok(Lookup::Hit(serde_json::from_slice(&bytes)?)),
            Lookup::Miss => Ok(Lookup::Miss),
        }
    }

    /// Retrieves the raw stored bytes under `key`, bypassing deserialization.
    ///
    /// No lock is taken on read: a read may race a concurrent write and
    /// observe a partially written file. Accepted limitation of the
    /// marker-based coordination model.
    pub fn retrieve_raw(&self, key: &str) -> Result<Lookup<Vec<u8>>> {
        let key = CacheKey::parse(key)?;
        let entry = key.entry_path(&self.root);

        if !self.fs.exists(&entry) {
            debug!(entry = %entry.display(), "cache miss, entry absent");
            self.stats.record_miss();
            return Ok(Lookup::Miss);
        }

        let modified = match self.fs.modified(&entry) {
            Ok(modified) => modified,
            // entry removed between the existence check and the stat
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                self.stats.record_miss();
                return Ok(Lookup::Miss);
            }
            Err(err) => return Err(CacheError::io(&entry, err)),
        };

        if !self.policy.is_fresh(modified, self.entry_lifespan) {
            debug!(entry = %entry.display(), "cache miss, entry stale");
            self.stats.record_miss();
            return Ok(Lookup::Miss);
        }

        let bytes = match self.fs.read(&entry) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                self.stats.record_miss();
                return Ok(Lookup::Miss);
            }
            Err(err) => return Err(CacheError::io(&entry, err)),
        };

        self.stats.record_hit();
        Ok(Lookup::Hit(bytes))
    }

    // == Save ==
    /// Serializes `value` as JSON and stores it under `key`.
    ///
    /// # Returns
    /// - `Ok(SaveOutcome::Saved)` if the entry was written
    /// - `Ok(SaveOutcome::Skipped)` if another writer appears to own this
    ///   regeneration; the previous entry content is left untouched
    /// - `Err` on directory-creation, serialization, or write failure
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<SaveOutcome> {
        let contents = serde_json::to_vec(value)?;
        self.save_raw(key, &contents)
    }

    /// Stores raw bytes under `key`, bypassing serialization.
    pub fn save_raw(&self, key: &str, contents: &[u8]) -> Result<SaveOutcome> {
        let key = CacheKey::parse(key)?;
        let dir = key.directory(&self.root);
        self.fs
            .create_dir_all(&dir)
            .map_err(|source| CacheError::DirectoryCreate {
                path: dir.clone(),
                source,
            })?;

        let entry = key.entry_path(&self.root);
        let marker = key.marker_path(&self.root);

        match self.coordinator.try_acquire(&self.fs, &entry, &marker)? {
            Acquisition::Busy => {
                self.stats.record_dogpile_skip();
                return Ok(SaveOutcome::Skipped);
            }
            Acquisition::Acquired => {}
        }

        if let Err(err) = self.fs.write(&entry, contents) {
            // The marker is left in place on this path; it self-expires after
            // the write window.
            error!(entry = %entry.display(), error = %err, "failed to write cache entry");
            return Err(CacheError::io(&entry, err));
        }

        self.coordinator.release(&self.fs, &marker)?;
        self.stats.record_write();
        debug!(entry = %entry.display(), "cache entry written");
        Ok(SaveOutcome::Saved)
    }

    // == Invalidate ==
    /// Deletes the entry stored under `key`. A no-op if the entry is absent.
    pub fn invalidate(&self, key: &str) -> Result<()> {
        let key = CacheKey::parse(key)?;
        let entry = key.entry_path(&self.root);

        match self.fs.remove_file(&entry) {
            Ok(()) => {
                debug!(entry = %entry.display(), "cache entry invalidated");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(CacheError::io(&entry, err)),
        }
    }

    // == Purge Expired ==
    /// Walks the cache tree and removes expired entry files and stale marker
    /// files left behind by crashed writers.
    ///
    /// Returns the number of files removed. Files that are neither entries
    /// nor markers are left alone.
    pub fn purge_expired(&self) -> Result<usize> {
        if !self.fs.exists(&self.root) {
            return Ok(0);
        }

        let mut removed = 0;
        self.purge_dir(&self.root, &mut removed)?;

        if removed > 0 {
            info!(removed, "purged expired cache files");
        }
        Ok(removed)
    }

    fn purge_dir(&self, dir: &Path, removed: &mut usize) -> Result<()> {
        let children = self
            .fs
            .read_dir(dir)
            .map_err(|err| CacheError::io(dir, err))?;

        for path in children {
            if self.fs.is_dir(&path) {
                self.purge_dir(&path, removed)?;
                continue;
            }

            let name = match path.file_name().and_then(|name| name.to_str()) {
                Some(name) => name,
                None => continue,
            };
            let window = if name.ends_with(MARKER_EXTENSION) {
                self.write_window
            } else if name.ends_with(ENTRY_EXTENSION) {
                self.entry_lifespan
            } else {
                continue;
            };

            let modified = match self.fs.modified(&path) {
                Ok(modified) => modified,
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(err) => return Err(CacheError::io(&path, err)),
            };
            if self.policy.is_fresh(modified, window) {
                continue;
            }

            match self.fs.remove_file(&path) {
                Ok(()) => *removed += 1,
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(CacheError::io(&path, err)),
            }
        }
        Ok(())
    }

    // == Stats ==
    /// Returns a snapshot of the performance counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}
