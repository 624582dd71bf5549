//! CDX cache management.
//!
//! One JSON file per entity id under the cache directory. Writes go to a
//! temporary file in the same directory which is then renamed over the target,
//! so concurrent readers never observe a partial entry. Concurrent writers for
//! the same id race and the last rename wins.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::types::CdxCacheEntry;
use crate::error_handling::CdxError;

/// On-disk CDX cache.
#[derive(Debug, Clone)]
pub struct CdxCache {
    dir: PathBuf,
}

impl CdxCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache file for an entity id.
    ///
    /// Ids are reduced to `[A-Za-z0-9_-]` so a hostile id cannot escape the
    /// cache directory.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let sanitized: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{sanitized}.json"))
    }

    /// Loads the entry for `key`, if one exists and can be decoded.
    ///
    /// A corrupt or unreadable entry is logged and treated as a miss; cache
    /// entries are derived data and the next store replaces them.
    pub fn load(&self, key: &str) -> Option<CdxCacheEntry> {
        let path = self.path_for(key);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                log::warn!("Failed to read CDX cache file {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_str::<CdxCacheEntry>(&content) {
            Ok(entry) if entry.key == key => Some(entry),
            Ok(entry) => {
                log::warn!(
                    "CDX cache file {} belongs to '{}', not '{}'; ignoring",
                    path.display(),
                    entry.key,
                    key
                );
                None
            }
            Err(e) => {
                log::warn!("Failed to parse CDX cache file {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Replaces the entry for `entry.key` atomically.
    ///
    /// # Errors
    ///
    /// Returns `CdxError::Cache` if the directory cannot be created or the file
    /// cannot be written; this is a configuration problem and is not retried.
    pub fn store(&self, entry: &CdxCacheEntry) -> Result<(), CdxError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| CdxError::Cache {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.path_for(&entry.key);
        let content = serde_json::to_vec_pretty(entry).map_err(|e| CdxError::Cache {
            path: path.clone(),
            source: std::io::Error::other(e),
        })?;

        let cache_err = |source: std::io::Error| CdxError::Cache {
            path: path.clone(),
            source,
        };
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(cache_err)?;
        tmp.write_all(&content).map_err(cache_err)?;
        tmp.flush().map_err(cache_err)?;
        tmp.persist(&path).map_err(|e| cache_err(e.error))?;
        Ok(())
    }

    /// Removes the entry for `key`. Missing entries are not an error.
    pub fn invalidate(&self, key: &str) -> Result<(), CdxError> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CdxError::Cache { path, source }),
        }
    }
}
