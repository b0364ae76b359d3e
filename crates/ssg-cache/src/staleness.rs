//! Rebuild decisions for Markdown sources and copy decisions for assets.

use std::fs;
use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::cache::CacheEntry;
use crate::hash::file_hash;

/// How much evidence the oracle reads before declaring a source unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StalenessMode {
    /// Trust the modification time and the presence of the output.
    ///
    /// The content hash is still recorded on every rebuild, it is just not
    /// consulted when deciding.
    #[default]
    Mtime,
    /// Additionally re-hash the source and rebuild when the digest differs.
    ///
    /// Catches edits that did not advance the modification time, at the cost
    /// of reading every source on every run.
    Content,
}

/// Outcome of a staleness check, in decision order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staleness {
    /// Rebuild requested unconditionally.
    Forced,
    /// The source has never been built.
    New,
    /// The source could not be stat'ed. Not rebuilt; purge reconciles it.
    Missing,
    /// The source hash differs from the recorded one.
    ContentChanged,
    /// The source is newer than the recorded modification time.
    Modified,
    /// The recorded output no longer exists.
    OutputMissing,
    /// Nothing to do.
    UpToDate,
}

impl Staleness {
    /// Whether this outcome requires rendering the source again.
    #[must_use]
    pub const fn needs_rebuild(self) -> bool {
        !matches!(self, Self::Missing | Self::UpToDate)
    }
}

/// Decides whether an input file must be rebuilt.
#[derive(Debug, Clone, Copy, Default)]
pub struct StalenessOracle {
    /// Evidence consulted for cached sources.
    pub mode: StalenessMode,
    /// Rebuild everything regardless of the cache.
    pub force: bool,
}

impl StalenessOracle {
    /// Create an oracle with the given mode.
    #[must_use]
    pub const fn new(mode: StalenessMode) -> Self {
        Self { mode, force: false }
    }

    /// Return a copy of this oracle that rebuilds unconditionally when `force` is set.
    #[must_use]
    pub const fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Check `input` against its cached record.
    ///
    /// A source that cannot be stat'ed is reported as [`Staleness::Missing`]
    /// even in content mode: it has most likely been deleted since discovery.
    pub fn needs_rebuild(&self, input: &Path, entry: Option<&CacheEntry>) -> Staleness {
        if self.force {
            return Staleness::Forced;
        }
        let Some(entry) = entry else {
            return Staleness::New;
        };
        let Ok(mtime) = modified_secs(input) else {
            return Staleness::Missing;
        };

        if self.mode == StalenessMode::Content {
            match file_hash(input) {
                Ok(hash) if hash != entry.content_hash => return Staleness::ContentChanged,
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(path = %input.display(), error = %e, "Failed to hash source");
                    return Staleness::Missing;
                }
            }
        }

        if mtime > entry.last_modified {
            return Staleness::Modified;
        }
        if !entry.output_path.exists() {
            return Staleness::OutputMissing;
        }
        Staleness::UpToDate
    }
}

/// Modification time of `path` in whole seconds since the Unix epoch.
///
/// Times before the epoch are negative.
pub fn modified_secs(path: &Path) -> io::Result<i64> {
    let modified = fs::metadata(path)?.modified()?;
    Ok(system_time_secs(modified))
}

fn system_time_secs(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_secs()).unwrap_or(i64::MAX),
        Err(before) => i64::try_from(before.duration().as_secs()).map_or(i64::MIN, |s| -s),
    }
}

/// Whether an asset at `src` must be copied to `dst`.
///
/// True when the source exists and the destination is missing or strictly
/// older. A source that cannot be stat'ed is never copied.
#[must_use]
pub fn needs_copy(src: &Path, dst: &Path) -> bool {
    let Ok(src_mtime) = fs::metadata(src).and_then(|m| m.modified()) else {
        return false;
    };
    match fs::metadata(dst).and_then(|m| m.modified()) {
        Ok(dst_mtime) => src_mtime > dst_mtime,
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::path::PathBuf;
    use std::time::Duration;

    use super::*;
    use crate::hash::content_hash;

    fn set_mtime(path: &Path, time: SystemTime) {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(time)
            .unwrap();
    }

    /// A built source: input and output exist, entry matches the current state.
    fn built(dir: &Path, content: &str) -> (PathBuf, CacheEntry) {
        let input = dir.join("page.md");
        let output = dir.join("page.html");
        fs::write(&input, content).unwrap();
        fs::write(&output, "<html></html>").unwrap();
        let entry = CacheEntry {
            input_path: input.clone(),
            output_path: output,
            last_modified: modified_secs(&input).unwrap(),
            content_hash: content_hash(content.as_bytes()),
        };
        (input, entry)
    }

    #[test]
    fn test_force_overrides_everything() {
        let dir = tempfile::tempdir().unwrap();
        let (input, entry) = built(dir.path(), "# Page");
        let oracle = StalenessOracle::default().with_force(true);

        assert_eq!(oracle.needs_rebuild(&input, Some(&entry)), Staleness::Forced);
        assert_eq!(
            oracle.needs_rebuild(&dir.path().join("gone.md"), Some(&entry)),
            Staleness::Forced
        );
    }

    #[test]
    fn test_no_entry_is_new() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("fresh.md");
        fs::write(&input, "# Fresh").unwrap();

        assert_eq!(
            StalenessOracle::default().needs_rebuild(&input, None),
            Staleness::New
        );
    }

    #[test]
    fn test_unstatable_source_is_not_rebuilt() {
        let dir = tempfile::tempdir().unwrap();
        let (input, entry) = built(dir.path(), "# Page");
        fs::remove_file(&input).unwrap();

        let staleness = StalenessOracle::default().needs_rebuild(&input, Some(&entry));
        assert_eq!(staleness, Staleness::Missing);
        assert!(!staleness.needs_rebuild());
    }

    #[test]
    fn test_unchanged_source_is_up_to_date() {
        let dir = tempfile::tempdir().unwrap();
        let (input, entry) = built(dir.path(), "# Page");

        let staleness = StalenessOracle::default().needs_rebuild(&input, Some(&entry));
        assert_eq!(staleness, Staleness::UpToDate);
        assert!(!staleness.needs_rebuild());
    }

    #[test]
    fn test_newer_mtime_is_modified() {
        let dir = tempfile::tempdir().unwrap();
        let (input, entry) = built(dir.path(), "# Page");
        set_mtime(&input, SystemTime::now() + Duration::from_secs(10));

        assert_eq!(
            StalenessOracle::default().needs_rebuild(&input, Some(&entry)),
            Staleness::Modified
        );
    }

    #[test]
    fn test_older_mtime_is_not_modified() {
        let dir = tempfile::tempdir().unwrap();
        let (input, entry) = built(dir.path(), "# Page");
        set_mtime(&input, SystemTime::now() - Duration::from_secs(3600));

        assert_eq!(
            StalenessOracle::default().needs_rebuild(&input, Some(&entry)),
            Staleness::UpToDate
        );
    }

    #[test]
    fn test_missing_output_is_rebuilt() {
        let dir = tempfile::tempdir().unwrap();
        let (input, entry) = built(dir.path(), "# Page");
        fs::remove_file(&entry.output_path).unwrap();

        assert_eq!(
            StalenessOracle::default().needs_rebuild(&input, Some(&entry)),
            Staleness::OutputMissing
        );
    }

    #[test]
    fn test_modified_checked_before_output() {
        let dir = tempfile::tempdir().unwrap();
        let (input, entry) = built(dir.path(), "# Page");
        fs::remove_file(&entry.output_path).unwrap();
        set_mtime(&input, SystemTime::now() + Duration::from_secs(10));

        assert_eq!(
            StalenessOracle::default().needs_rebuild(&input, Some(&entry)),
            Staleness::Modified
        );
    }

    #[test]
    fn test_mtime_mode_ignores_content_change() {
        let dir = tempfile::tempdir().unwrap();
        let (input, mut entry) = built(dir.path(), "# Page");
        entry.content_hash ^= 1;

        assert_eq!(
            StalenessOracle::new(StalenessMode::Mtime).needs_rebuild(&input, Some(&entry)),
            Staleness::UpToDate
        );
    }

    #[test]
    fn test_content_mode_detects_same_mtime_edit() {
        let dir = tempfile::tempdir().unwrap();
        let (input, entry) = built(dir.path(), "# Page");
        let original = fs::metadata(&input).unwrap().modified().unwrap();
        fs::write(&input, "# Edited").unwrap();
        set_mtime(&input, original);

        assert_eq!(
            StalenessOracle::new(StalenessMode::Content).needs_rebuild(&input, Some(&entry)),
            Staleness::ContentChanged
        );
    }

    #[test]
    fn test_content_mode_unchanged_hash_falls_through() {
        let dir = tempfile::tempdir().unwrap();
        let (input, entry) = built(dir.path(), "# Page");

        assert_eq!(
            StalenessOracle::new(StalenessMode::Content).needs_rebuild(&input, Some(&entry)),
            Staleness::UpToDate
        );
    }

    #[test]
    fn test_needs_rebuild_mapping() {
        assert!(Staleness::Forced.needs_rebuild());
        assert!(Staleness::New.needs_rebuild());
        assert!(Staleness::ContentChanged.needs_rebuild());
        assert!(Staleness::Modified.needs_rebuild());
        assert!(Staleness::OutputMissing.needs_rebuild());
        assert!(!Staleness::Missing.needs_rebuild());
        assert!(!Staleness::UpToDate.needs_rebuild());
    }

    #[test]
    fn test_system_time_secs_before_epoch() {
        let before = UNIX_EPOCH - Duration::from_secs(90);
        assert_eq!(system_time_secs(before), -90);
        assert_eq!(system_time_secs(UNIX_EPOCH + Duration::from_secs(5)), 5);
    }

    #[test]
    fn test_needs_copy_missing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("logo.png");
        fs::write(&src, b"png").unwrap();

        assert!(needs_copy(&src, &dir.path().join("out.png")));
    }

    #[test]
    fn test_needs_copy_older_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("logo.png");
        let dst = dir.path().join("out.png");
        fs::write(&src, b"png").unwrap();
        fs::write(&dst, b"png").unwrap();
        set_mtime(&dst, SystemTime::now() - Duration::from_secs(60));

        assert!(needs_copy(&src, &dst));
    }

    #[test]
    fn test_needs_copy_fresh_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("logo.png");
        let dst = dir.path().join("out.png");
        fs::write(&src, b"png").unwrap();
        fs::write(&dst, b"png").unwrap();
        set_mtime(&src, SystemTime::now() - Duration::from_secs(60));

        assert!(!needs_copy(&src, &dst));
    }

    #[test]
    fn test_needs_copy_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!needs_copy(
            &dir.path().join("gone.png"),
            &dir.path().join("out.png")
        ));
    }
}
