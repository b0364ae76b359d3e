//! In-memory build cache and its persistence.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CacheError;
use crate::format;

/// The persisted record of a file's last successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Source path; the cache key.
    pub input_path: PathBuf,
    /// Where the rendered artifact was last written.
    pub output_path: PathBuf,
    /// Source modification time at the last build, in epoch seconds.
    pub last_modified: i64,
    /// FNV-1a digest of the source bytes at the last build.
    pub content_hash: u64,
}

/// Mapping from input path to its last build record.
///
/// Holds at most one [`CacheEntry`] per input path: every write goes through
/// [`upsert`](Self::upsert).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildCache {
    entries: HashMap<PathBuf, CacheEntry>,
}

impl BuildCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the cache from `path`, failing closed.
    ///
    /// A missing file yields an empty cache. A file that fails validation in
    /// any way (bad magic, oversized or unterminated path, truncated record)
    /// is discarded entirely and also yields an empty cache, which forces a
    /// full rebuild rather than trusting a partially decoded one.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(cache) => {
                tracing::debug!(path = %path.display(), entries = cache.len(), "Loaded build cache");
                cache
            }
            Err(CacheError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No build cache found, starting fresh");
                Self::new()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Discarding unreadable build cache");
                Self::new()
            }
        }
    }

    /// Load the cache from `path`, reporting why decoding failed.
    pub fn try_load(path: &Path) -> Result<Self, CacheError> {
        let bytes = fs::read(path).map_err(|source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            entries: format::decode(&bytes)?,
        })
    }

    /// Persist every entry to `path`.
    ///
    /// The cache is written to a sibling temporary file first and then renamed
    /// over `path`, so readers never observe a half-written cache. The parent
    /// directory is created if needed.
    pub fn save(&self, path: &Path) -> Result<(), CacheError> {
        let bytes = format::encode(self.entries.values())?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| CacheError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        fs::write(&tmp_path, &bytes).map_err(|source| CacheError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, path).map_err(|source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!(path = %path.display(), entries = self.len(), "Saved build cache");
        Ok(())
    }

    /// Look up the record for an input path.
    pub fn get(&self, input_path: &Path) -> Option<&CacheEntry> {
        self.entries.get(input_path)
    }

    /// Insert a record, or update the existing record for `input_path` in place.
    ///
    /// Applying the same upsert twice leaves the cache unchanged.
    pub fn upsert(&mut self, input_path: &Path, output_path: &Path, last_modified: i64, content_hash: u64) {
        match self.entries.entry(input_path.to_path_buf()) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                output_path.clone_into(&mut entry.output_path);
                entry.last_modified = last_modified;
                entry.content_hash = content_hash;
            }
            Entry::Vacant(vacant) => {
                let input_path = vacant.key().clone();
                vacant.insert(CacheEntry {
                    input_path,
                    output_path: output_path.to_path_buf(),
                    last_modified,
                    content_hash,
                });
            }
        }
    }

    /// Upsert every record from a worker's private shard.
    pub fn merge(&mut self, shard: impl IntoIterator<Item = CacheEntry>) {
        for entry in shard {
            self.upsert(
                &entry.input_path,
                &entry.output_path,
                entry.last_modified,
                entry.content_hash,
            );
        }
    }

    /// Remove the record for an input path, returning it if present.
    pub fn remove(&mut self, input_path: &Path) -> Option<CacheEntry> {
        self.entries.remove(input_path)
    }

    /// Remove every record whose source file no longer exists.
    ///
    /// Must only run when no worker holds a shard that is still to be merged.
    /// Returns the number of records removed.
    pub fn purge_missing(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|input_path, _| {
            let exists = input_path.exists();
            if !exists {
                tracing::debug!(path = %input_path.display(), "Purging cache entry for deleted source");
            }
            exists
        });
        before - self.entries.len()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no records.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all records in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &CacheEntry> {
        self.entries.values()
    }
}

impl FromIterator<CacheEntry> for BuildCache {
    fn from_iter<I: IntoIterator<Item = CacheEntry>>(iter: I) -> Self {
        let mut cache = Self::new();
        cache.merge(iter);
        cache
    }
}
