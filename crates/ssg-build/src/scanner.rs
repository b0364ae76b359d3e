//! Source discovery and output tree preparation.
//!
//! Discovery walks the input root once, single-threaded, before any page is
//! rendered. It only records paths; no file content is read here.

use std::fs;
use std::path::{Path, PathBuf};

use ssg_cache::needs_copy;

use crate::error::BuildError;
use crate::metrics::BuildMetrics;

/// Files and directories found under the input root.
///
/// All paths are relative to the input root and sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceTree {
    /// Every non-hidden subdirectory.
    pub dirs: Vec<PathBuf>,
    /// Markdown sources (`.md`).
    pub markdown: Vec<PathBuf>,
    /// Every other regular file.
    pub assets: Vec<PathBuf>,
}

/// Walks an input root.
pub struct Scanner {
    input_root: PathBuf,
}

impl Scanner {
    /// Create a scanner for `input_root`.
    pub fn new(input_root: impl Into<PathBuf>) -> Self {
        Self {
            input_root: input_root.into(),
        }
    }

    /// Walk the input root.
    ///
    /// Hidden entries (leading `.`) and names that are not valid UTF-8 are
    /// skipped. Symlinks are followed for files but not for directories.
    pub fn scan(&self) -> Result<SourceTree, BuildError> {
        let mut tree = SourceTree::default();
        // The root itself must be readable; unreadable subdirectories are skipped
        let entries = fs::read_dir(&self.input_root).map_err(|e| BuildError::io(&self.input_root, e))?;
        self.scan_entries(entries, Path::new(""), &mut tree);

        tree.dirs.sort();
        tree.markdown.sort();
        tree.assets.sort();
        Ok(tree)
    }

    fn scan_directory(&self, relative: &Path, tree: &mut SourceTree) {
        let dir = self.input_root.join(relative);
        match fs::read_dir(&dir) {
            Ok(entries) => self.scan_entries(entries, relative, tree),
            Err(e) => {
                tracing::warn!(path = %dir.display(), error = %e, "Failed to read directory");
            }
        }
    }

    fn scan_entries(&self, entries: fs::ReadDir, relative: &Path, tree: &mut SourceTree) {
        for entry in entries.filter_map(Result::ok) {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                tracing::warn!(path = %entry.path().display(), "Skipping non-UTF-8 file name");
                continue;
            };
            if name.starts_with('.') {
                continue;
            }

            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            let child = relative.join(name);

            if file_type.is_dir() {
                tree.dirs.push(child.clone());
                self.scan_directory(&child, tree);
                continue;
            }

            let is_file = file_type.is_file()
                || (file_type.is_symlink() && fs::metadata(entry.path()).is_ok_and(|m| m.is_file()));
            if !is_file {
                continue;
            }

            if child.extension().is_some_and(|e| e == "md") {
                tree.markdown.push(child);
            } else {
                tree.assets.push(child);
            }
        }
    }
}

/// Output location of a Markdown source: same relative path, `.html` extension.
pub fn output_path(output_root: &Path, relative: &Path) -> PathBuf {
    output_root.join(relative).with_extension("html")
}

/// Create the output root and every source directory beneath it.
pub fn mirror_directories(tree: &SourceTree, output_root: &Path) -> Result<(), BuildError> {
    fs::create_dir_all(output_root).map_err(|e| BuildError::io(output_root, e))?;
    for dir in &tree.dirs {
        let target = output_root.join(dir);
        fs::create_dir_all(&target).map_err(|e| BuildError::io(target, e))?;
    }
    Ok(())
}

/// Copy every asset whose output copy is missing or older.
///
/// Failures are logged and do not stop the remaining copies.
pub fn copy_assets(tree: &SourceTree, input_root: &Path, output_root: &Path, metrics: &BuildMetrics) {
    for asset in &tree.assets {
        let src = input_root.join(asset);
        let dst = output_root.join(asset);
        if !needs_copy(&src, &dst) {
            continue;
        }
        match fs::copy(&src, &dst) {
            Ok(_) => {
                tracing::debug!(path = %asset.display(), "Copied asset");
                metrics.inc_copied();
            }
            Err(e) => {
                tracing::warn!(path = %src.display(), error = %e, "Failed to copy asset");
            }
        }
    }
}
