//! Cache Key Module
//!
//! Resolves string keys to on-disk paths. A key may contain `/` separators
//! addressing sub-directories under the cache root: `"sub/dir/leaf"` stores
//! its entry at `<root>/sub/dir/leaf.cache`.

use std::path::{Path, PathBuf};

use crate::cache::{ENTRY_EXTENSION, MARKER_EXTENSION};
use crate::error::{CacheError, Result};

// == Cache Key ==
/// A validated cache key, decomposed into directory components and a leaf name.
///
/// The leaf name, separator-stripped, is the on-disk file stem; the dogpile
/// marker is always a sibling of the entry file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    /// Directory components between the cache root and the entry file
    dirs: Vec<String>,
    /// File stem of the entry
    leaf: String,
}

impl CacheKey {
    // == Parse ==
    /// Parses and validates a raw key string.
    ///
    /// Rejected keys: empty, leading or trailing separator, interior empty
    /// components, `.` or `..` components, NUL bytes.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(CacheError::InvalidKey("key is empty".to_string()));
        }
        if raw.contains('\0') {
            return Err(CacheError::InvalidKey(format!(
                "key contains NUL byte: {raw:?}"
            )));
        }
        if raw.starts_with('/') {
            return Err(CacheError::InvalidKey(format!(
                "key must be relative: {raw:?}"
            )));
        }

        let mut components: Vec<String> = Vec::new();
        for component in raw.split('/') {
            match component {
                "" => {
                    return Err(CacheError::InvalidKey(format!(
                        "key contains empty component: {raw:?}"
                    )))
                }
                "." | ".." => {
                    return Err(CacheError::InvalidKey(format!(
                        "key must not traverse directories: {raw:?}"
                    )))
                }
                _ => components.push(component.to_string()),
            }
        }

        // split() on a non-empty string yields at least one component
        let leaf = components.pop().expect("validated key has a leaf");
        Ok(Self {
            dirs: components,
            leaf,
        })
    }

    // == Path Resolution ==
    /// Returns the directory the entry file lives in, under `root`.
    pub fn directory(&self, root: &Path) -> PathBuf {
        let mut dir = root.to_path_buf();
        for component in &self.dirs {
            dir.push(component);
        }
        dir
    }

    /// Returns the entry file path `<root>/<dirs>/<leaf>.cache`.
    pub fn entry_path(&self, root: &Path) -> PathBuf {
        self.directory(root)
            .join(format!("{}{}", self.leaf, ENTRY_EXTENSION))
    }

    /// Returns the marker file path `<root>/<dirs>/<leaf>.cache.dogpile`.
    pub fn marker_path(&self, root: &Path) -> PathBuf {
        self.directory(root)
            .join(format!("{}{}", self.leaf, MARKER_EXTENSION))
    }

    /// Returns the leaf name (the on-disk file stem).
    pub fn leaf(&self) -> &str {
        &self.leaf
    }
}
