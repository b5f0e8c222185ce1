//! Persistent record of script hashes between runs
//!
//! The cache is a single JSON object keyed by script file name:
//!
//! ```json
//! {
//!   "lamp_base.py": {
//!     "hash": "9f86d0...",
//!     "last_processed": "2024-05-01T12:00:00.123456"
//!   }
//! }
//! ```
//!
//! Loading never fails: a missing, unreadable or malformed file yields an
//! empty cache. Saving is atomic but callers treat failures as warnings.

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use lampsmith_core::{Error, Result};
use lampsmith_utils::write_atomic_string;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Cached state of a single script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Content digest, `None` when the script could not be read
    pub hash: Option<String>,

    /// When the script last ran successfully (or was first seen)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_processed: Option<NaiveDateTime>,
}

/// How a script's current digest compares with the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// No entry for the script
    New,
    /// Entry exists but the digest differs, or either digest is missing
    Modified,
    /// Entry exists with an identical digest
    Unchanged,
}

/// In-memory view of the cache file
#[derive(Debug, Clone)]
pub struct BuildCache {
    path: PathBuf,
    entries: IndexMap<String, CacheEntry>,
}

impl BuildCache {
    /// An empty cache that will be written to `path`
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: IndexMap::new(),
        }
    }

    /// Load the cache, falling back to an empty one on any problem
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no build cache yet");
                return Self::empty(path);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not read build cache, starting empty");
                return Self::empty(path);
            }
        };

        match serde_json::from_str::<IndexMap<String, CacheEntry>>(&content) {
            Ok(entries) => {
                tracing::debug!(path = %path.display(), entries = entries.len(), "loaded build cache");
                Self { path, entries }
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "malformed build cache, starting empty");
                Self::empty(path)
            }
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn get(&self, script: &str) -> Option<&CacheEntry> {
        self.entries.get(script)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &CacheEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Compare a freshly computed digest with the cached one
    #[must_use]
    pub fn classify(&self, script: &str, current_hash: Option<&str>) -> CacheState {
        match self.entries.get(script) {
            None => CacheState::New,
            Some(entry) => match (entry.hash.as_deref(), current_hash) {
                (Some(cached), Some(current)) if cached == current => CacheState::Unchanged,
                _ => CacheState::Modified,
            },
        }
    }

    /// Record the digest seen for `script` in this run
    ///
    /// `last_processed` moves to `now` only when the script ran successfully;
    /// otherwise the previous timestamp is kept, or `now` on first sight.
    pub fn record(
        &mut self,
        script: &str,
        hash: Option<String>,
        processed: bool,
        now: NaiveDateTime,
    ) {
        let last_processed = if processed {
            now
        } else {
            self.entries
                .get(script)
                .and_then(|entry| entry.last_processed)
                .unwrap_or(now)
        };

        self.entries.insert(
            script.to_string(),
            CacheEntry {
                hash,
                last_processed: Some(last_processed),
            },
        );
    }

    /// Drop entries for which `keep` returns false, returning their names
    pub fn prune<F>(&mut self, keep: F) -> Vec<String>
    where
        F: Fn(&str) -> bool,
    {
        let removed: Vec<String> = self
            .entries
            .keys()
            .filter(|script| !keep(script))
            .cloned()
            .collect();

        for script in &removed {
            self.entries.shift_remove(script);
        }

        removed
    }

    /// Persist the cache as pretty-printed JSON
    pub fn save(&self) -> Result<()> {
        let data = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| Error::json("failed to serialize build cache", e))?;
        write_atomic_string(&self.path, &data)?;
        tracing::debug!(path = %self.path.display(), entries = self.entries.len(), "saved build cache");
        Ok(())
    }

    /// Delete the cache file, returning whether one existed
    pub fn clear(path: &Path) -> Result<bool> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::file_system(path, "remove build cache", e)),
        }
    }
}
