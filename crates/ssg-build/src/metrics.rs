//! Build counters shared by all workers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Atomic build counters.
///
/// Workers only ever add to the counters; they are read through
/// [`snapshot`](Self::snapshot) once the parallel phase has joined.
#[derive(Debug, Default)]
pub struct BuildMetrics {
    total_files: AtomicUsize,
    built_files: AtomicUsize,
    copied_files: AtomicUsize,
    failed_files: AtomicUsize,
    skipped_files: AtomicUsize,
}

impl BuildMetrics {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_total(&self, n: usize) {
        self.total_files.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn add_built(&self, n: usize) {
        self.built_files.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn inc_copied(&self) {
        self.copied_files.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_failed(&self, n: usize) {
        self.failed_files.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn inc_skipped(&self) {
        self.skipped_files.fetch_add(1, Ordering::Relaxed);
    }

    /// Read every counter into a plain report.
    pub fn snapshot(&self, elapsed: Duration) -> BuildReport {
        BuildReport {
            total_files: self.total_files.load(Ordering::Relaxed),
            built_files: self.built_files.load(Ordering::Relaxed),
            copied_files: self.copied_files.load(Ordering::Relaxed),
            failed_files: self.failed_files.load(Ordering::Relaxed),
            skipped_files: self.skipped_files.load(Ordering::Relaxed),
            purged_entries: 0,
            elapsed,
        }
    }
}

/// Summary of a finished build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Markdown sources discovered.
    pub total_files: usize,
    /// Pages rendered and written.
    pub built_files: usize,
    /// Assets copied.
    pub copied_files: usize,
    /// Sources that failed and were left stale.
    pub failed_files: usize,
    /// Sources that were already up to date.
    pub skipped_files: usize,
    /// Cache entries dropped because their source was deleted.
    pub purged_entries: usize,
    /// Wall-clock build time.
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_snapshot_reads_counters() {
        let metrics = BuildMetrics::new();
        metrics.add_total(5);
        metrics.add_built(2);
        metrics.inc_copied();
        metrics.add_failed(1);
        metrics.inc_skipped();
        metrics.inc_skipped();

        let report = metrics.snapshot(Duration::from_millis(12));

        assert_eq!(
            report,
            BuildReport {
                total_files: 5,
                built_files: 2,
                copied_files: 1,
                failed_files: 1,
                skipped_files: 2,
                purged_entries: 0,
                elapsed: Duration::from_millis(12),
            }
        );
    }

    #[test]
    fn test_concurrent_increments() {
        let metrics = BuildMetrics::new();
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..1000 {
                        metrics.add_built(1);
                    }
                });
            }
        });
        assert_eq!(metrics.snapshot(Duration::ZERO).built_files, 8000);
    }
}
