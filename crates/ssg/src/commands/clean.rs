//! `ssg clean` command implementation.

use std::io;
use std::path::{Path, PathBuf};

use clap::Args;
use ssg_build::template_stamp_path;
use ssg_config::Config;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the clean command.
#[derive(Args)]
pub(crate) struct CleanArgs {
    /// Path to configuration file (default: auto-discover ssg.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl CleanArgs {
    /// Remove the output directory, the build cache and its template stamp.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = Config::load(self.config.as_deref(), None)?;
        let build = &config.build_resolved;

        let stamp = template_stamp_path(&build.cache_file);
        for path in [&build.output_dir, &build.cache_file, &stamp] {
            if remove(path)? {
                output.info(&format!("Removed {}", path.display()));
            }
        }
        output.success("Clean complete");
        Ok(())
    }
}

/// Remove a file or directory tree. Returns `false` if nothing was there.
fn remove(path: &Path) -> io::Result<bool> {
    let result = if path.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    match result {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_directory_tree() {
        let dir = tempfile::tempdir().unwrap();
        let public = dir.path().join("public");
        std::fs::create_dir_all(public.join("guide")).unwrap();
        std::fs::write(public.join("guide/intro.html"), "x").unwrap();

        assert!(remove(&public).unwrap());
        assert!(!public.exists());
    }

    #[test]
    fn test_remove_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join(".ssgcache");
        std::fs::write(&cache, "x").unwrap();

        assert!(remove(&cache).unwrap());
        assert!(!cache.exists());
    }

    #[test]
    fn test_remove_missing_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!remove(&dir.path().join("absent")).unwrap());
    }
}
