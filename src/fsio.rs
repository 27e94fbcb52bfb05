//! Filesystem Access Module
//!
//! The cache never touches `std::fs` directly; it goes through the
//! `FileSystem` trait so tests can substitute failure-injecting
//! implementations. `DiskFs` is the production implementation.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

// == FileSystem Trait ==
/// Capability interface over the operations the cache performs on disk.
pub trait FileSystem {
    /// Returns true if a file or directory exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Reads the full contents of the file at `path`.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Writes `contents` to the file at `path`, truncating any previous content.
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Copies the file at `from` onto `to`, replacing `to` if it exists.
    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64>;

    /// Recursively creates the directory at `path` and any missing parents.
    /// Succeeds if the directory already exists.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Removes the file at `path`.
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Lists the paths directly under the directory at `path`.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Returns true if `path` exists and is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Returns the modification time of the file at `path`.
    fn modified(&self, path: &Path) -> io::Result<SystemTime>;

    /// Creates an empty file at `path`, failing with `AlreadyExists` if a file
    /// is already there. The atomic create-if-absent primitive the dogpile
    /// marker protocol is built on.
    fn create_exclusive(&self, path: &Path) -> io::Result<()>;
}

// == Disk Implementation ==
/// `FileSystem` backed by the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskFs;

impl FileSystem for DiskFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        fs::write(path, contents)
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        fs::copy(from, to)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(path)? {
            paths.push(entry?.path());
        }
        Ok(paths)
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        fs::metadata(path)?.modified()
    }

    fn create_exclusive(&self, path: &Path) -> io::Result<()> {
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map(|_| ())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_read_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("file.bin");

        DiskFs.write(&path, b"payload").unwrap();
        assert!(DiskFs.exists(&path));
        assert_eq!(DiskFs.read(&path).unwrap(), b"payload");
    }

    #[test]
    fn test_create_exclusive_fails_when_present() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("marker");

        DiskFs.create_exclusive(&path).unwrap();
        let err = DiskFs.create_exclusive(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }

    #[test]
    fn test_create_exclusive_after_remove() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("marker");

        DiskFs.create_exclusive(&path).unwrap();
        DiskFs.remove_file(&path).unwrap();
        DiskFs.create_exclusive(&path).unwrap();
    }

    #[test]
    fn test_modified_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = DiskFs.modified(&dir.path().join("absent")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
