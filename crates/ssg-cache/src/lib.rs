//! Persistent build cache and staleness detection for ssg.
//!
//! This crate provides the pieces of the incremental build that survive
//! between runs:
//!
//! - [`BuildCache`]: Mapping from input path to its last [`CacheEntry`]
//! - [`content_hash`] / [`file_hash`]: FNV-1a content fingerprints
//! - [`StalenessOracle`]: Decides whether an input must be rebuilt
//! - [`needs_copy`]: Two-state check for non-Markdown assets
//!
//! The cache is stored in a small binary file (see [`BuildCache::save`]).
//! Loading fails closed: a corrupted file yields an empty cache, which forces
//! a full rebuild instead of trusting a partial one.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use ssg_cache::{BuildCache, StalenessOracle};
//!
//! let mut cache = BuildCache::load(Path::new(".ssgcache"));
//! let oracle = StalenessOracle::default();
//!
//! let input = Path::new("content/index.md");
//! if oracle.needs_rebuild(input, cache.get(input)).needs_rebuild() {
//!     // render, write, then record the build
//!     cache.upsert(input, Path::new("public/index.html"), 1_700_000_000, 42);
//! }
//! cache.purge_missing();
//! cache.save(Path::new(".ssgcache"))?;
//! # Ok::<(), ssg_cache::CacheError>(())
//! ```

mod cache;
mod error;
mod format;
mod hash;
mod staleness;

pub use cache::{BuildCache, CacheEntry};
pub use error::CacheError;
pub use format::{CACHE_MAGIC, MAX_PATH_LEN};
pub use hash::{Fnv1a, content_hash, file_hash};
pub use staleness::{Staleness, StalenessMode, StalenessOracle, modified_secs, needs_copy};
