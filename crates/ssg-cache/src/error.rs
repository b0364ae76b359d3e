//! Error types for cache operations.

use std::path::PathBuf;

/// Errors that can occur while loading or saving the build cache.
///
/// Loading through [`BuildCache::load`](crate::BuildCache::load) never
/// surfaces these: any decode error there results in an empty cache. They are
/// returned by [`BuildCache::try_load`](crate::BuildCache::try_load) and
/// [`BuildCache::save`](crate::BuildCache::save).
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing the cache file.
    #[error("cache I/O error at {}: {source}", path.display())]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The file does not start with the cache magic number.
    #[error("not a build cache file (bad magic number)")]
    BadMagic,

    /// The file ended in the middle of a record.
    #[error("cache file truncated at byte {offset}")]
    Truncated {
        /// Byte offset at which more data was expected.
        offset: usize,
    },

    /// A stored path length is zero or exceeds [`MAX_PATH_LEN`](crate::MAX_PATH_LEN).
    #[error("cache record declares invalid path length {len}")]
    PathTooLong {
        /// The declared length (including the terminator).
        len: u64,
    },

    /// A stored path is not NUL-terminated UTF-8.
    #[error("cache record contains a malformed path")]
    InvalidPath,

    /// Extra bytes follow the last declared record.
    #[error("unexpected trailing bytes after {entries} cache entries")]
    TrailingBytes {
        /// Number of entries decoded before the trailing data.
        entries: u64,
    },

    /// A path cannot be stored because it is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let err = CacheError::Io {
            path: PathBuf::from("/tmp/site/.ssgcache"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("cache I/O error"));
        assert!(msg.contains(".ssgcache"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_truncated_display() {
        let err = CacheError::Truncated { offset: 27 };
        assert_eq!(err.to_string(), "cache file truncated at byte 27");
    }

    #[test]
    fn test_path_too_long_display() {
        let err = CacheError::PathTooLong { len: 70_000 };
        assert!(err.to_string().contains("70000"));
    }
}
