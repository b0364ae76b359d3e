//! Error types for site builds.

use std::path::PathBuf;

use ssg_cache::CacheError;

/// Errors that abort a build.
///
/// Failures confined to a single source file are not represented here: they
/// are logged, counted in [`BuildReport::failed_files`](crate::BuildReport::failed_files)
/// and the file is left stale.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The input root does not exist or is not a directory.
    #[error("input directory not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// One of the input and output roots contains the other.
    #[error("output directory {} and input directory {} must not contain each other", output.display(), input.display())]
    OverlappingRoots {
        /// Input root.
        input: PathBuf,
        /// Output root.
        output: PathBuf,
    },

    /// The template could not be read or lacks a placeholder.
    #[error("invalid template {}: {message}", path.display())]
    Template {
        /// Template path.
        path: PathBuf,
        /// What is wrong with it.
        message: String,
    },

    /// Filesystem error outside per-file processing.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Path that caused the error.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The worker pool could not be started.
    #[error("failed to create thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// The cache could not be saved.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
