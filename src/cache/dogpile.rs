//! Dogpile Coordination Module
//!
//! Best-effort stampede avoidance around entry writes. A sibling marker file
//! signals "a write is in progress" for a key; at most one writer per expiry
//! window should pay the regeneration cost, while everyone else keeps serving
//! the previous stale-but-present value.
//!
//! Acquisition uses an atomic create-if-absent on the marker, so two writers
//! cannot both create it. The marker's own modification time bounds how long
//! an acquisition is honored: a marker older than the write window belongs to
//! a presumed-dead writer and is taken over rather than deadlocking the key.

use std::io;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::StalenessPolicy;
use crate::error::{CacheError, Result};
use crate::fsio::FileSystem;

// == Acquisition Outcome ==
/// Result of attempting to claim regeneration rights for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
    /// This caller owns the write; it must release the marker when done
    Acquired,
    /// Another writer appears active; the caller should skip the write
    Busy,
}

// == Dogpile Coordinator ==
/// Acquires and releases per-key write markers.
#[derive(Debug, Clone, Copy)]
pub struct DogpileCoordinator {
    policy: StalenessPolicy,
    /// How long a marker is honored before its writer is presumed dead
    write_window: Duration,
}

impl DogpileCoordinator {
    /// Creates a coordinator with the given marker staleness window.
    pub fn new(write_window: Duration) -> Self {
        Self {
            policy: StalenessPolicy,
            write_window,
        }
    }

    // == Acquire ==
    /// Attempts to claim the write marker for a key.
    ///
    /// On success, if a previous entry file exists its content is copied onto
    /// the marker: the previous good value doubles as a fallback snapshot
    /// while the new value is being computed.
    ///
    /// # Arguments
    /// * `fs` - Filesystem capability
    /// * `entry` - Path of the entry file the caller intends to write
    /// * `marker` - Path of the sibling marker file
    pub fn try_acquire<F: FileSystem>(
        &self,
        fs: &F,
        entry: &Path,
        marker: &Path,
    ) -> Result<Acquisition> {
        match fs.create_exclusive(marker) {
            Ok(()) => {
                self.snapshot_previous(fs, entry, marker)?;
                Ok(Acquisition::Acquired)
            }
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                self.contend(fs, entry, marker)
            }
            Err(err) => Err(CacheError::io(marker, err)),
        }
    }

    /// Handles an existing marker: honor it while fresh, take it over once
    /// its writer is presumed dead.
    fn contend<F: FileSystem>(&self, fs: &F, entry: &Path, marker: &Path) -> Result<Acquisition> {
        let modified = match fs.modified(marker) {
            Ok(modified) => modified,
            // The other writer finished between our create and stat; their
            // value is fresh anyway, so skip this regeneration.
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(marker = %marker.display(), "marker released mid-check, skipping write");
                return Ok(Acquisition::Busy);
            }
            Err(err) => return Err(CacheError::io(marker, err)),
        };

        if self.policy.is_fresh(modified, self.write_window) {
            debug!(marker = %marker.display(), "write in progress elsewhere, skipping");
            return Ok(Acquisition::Busy);
        }

        // Presumed-dead writer: clear the stale marker and retry the
        // exclusive create exactly once. Losing that race means someone else
        // took over first.
        warn!(marker = %marker.display(), "taking over stale write marker");
        match fs.remove_file(marker) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(CacheError::io(marker, err)),
        }
        match fs.create_exclusive(marker) {
            Ok(()) => {
                self.snapshot_previous(fs, entry, marker)?;
                Ok(Acquisition::Acquired)
            }
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Ok(Acquisition::Busy),
            Err(err) => Err(CacheError::io(marker, err)),
        }
    }

    /// Copies the current entry onto the marker path, if an entry exists.
    fn snapshot_previous<F: FileSystem>(&self, fs: &F, entry: &Path, marker: &Path) -> Result<()> {
        if !fs.exists(entry) {
            return Ok(());
        }
        match fs.copy(entry, marker) {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(CacheError::CopySourceMissing(entry.to_path_buf()))
            }
            Err(err) => Err(CacheError::io(marker, err)),
        }
    }

    // == Release ==
    /// Removes the marker, signaling write completion. Tolerates a marker
    /// that is already gone.
    pub fn release<F: FileSystem>(&self, fs: &F, marker: &Path) -> Result<()> {
        match fs.remove_file(marker) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(CacheError::io(marker, err)),
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsio::DiskFs;
    use std::fs;
    use std::thread::sleep;
    use tempfile::TempDir;

    const WINDOW: Duration = Duration::from_secs(60);

    fn paths(dir: &TempDir) -> (std::path::PathBuf, std::path::PathBuf) {
        (
            dir.path().join("leaf.cache"),
            dir.path().join("leaf.cache.dogpile"),
        )
    }

    #[test]
    fn test_acquire_creates_marker() {
        let dir = TempDir::new().unwrap();
        let (entry, marker) = paths(&dir);
        let coordinator = DogpileCoordinator::new(WINDOW);

        let outcome = coordinator.try_acquire(&DiskFs, &entry, &marker).unwrap();

        assert_eq!(outcome, Acquisition::Acquired);
        assert!(marker.exists());
    }

    #[test]
    fn test_fresh_marker_reports_busy() {
        let dir = TempDir::new().unwrap();
        let (entry, marker) = paths(&dir);
        let coordinator = DogpileCoordinator::new(WINDOW);

        coordinator.try_acquire(&DiskFs, &entry, &marker).unwrap();
        let second = coordinator.try_acquire(&DiskFs, &entry, &marker).unwrap();

        assert_eq!(second, Acquisition::Busy);
    }

    #[test]
    fn test_release_removes_marker() {
        let dir = TempDir::new().unwrap();
        let (entry, marker) = paths(&dir);
        let coordinator = DogpileCoordinator::new(WINDOW);

        coordinator.try_acquire(&DiskFs, &entry, &marker).unwrap();
        coordinator.release(&DiskFs, &marker).unwrap();

        assert!(!marker.exists());
    }

    #[test]
    fn test_release_tolerates_missing_marker() {
        let dir = TempDir::new().unwrap();
        let (_, marker) = paths(&dir);
        let coordinator = DogpileCoordinator::new(WINDOW);

        coordinator.release(&DiskFs, &marker).unwrap();
    }

    #[test]
    fn test_stale_marker_is_taken_over() {
        let dir = TempDir::new().unwrap();
        let (entry, marker) = paths(&dir);
        let coordinator = DogpileCoordinator::new(Duration::from_secs(1));

        fs::write(&marker, b"").unwrap();
        sleep(Duration::from_millis(1100));

        let outcome = coordinator.try_acquire(&DiskFs, &entry, &marker).unwrap();

        assert_eq!(outcome, Acquisition::Acquired);
        assert!(marker.exists());
    }

    #[test]
    fn test_acquire_snapshots_previous_entry() {
        let dir = TempDir::new().unwrap();
        let (entry, marker) = paths(&dir);
        let coordinator = DogpileCoordinator::new(WINDOW);

        fs::write(&entry, b"previous value").unwrap();
        coordinator.try_acquire(&DiskFs, &entry, &marker).unwrap();

        assert_eq!(fs::read(&marker).unwrap(), b"previous value");
    }
}
