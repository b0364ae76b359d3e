//! Parallel page rendering.
//!
//! Every thread of the pool runs the same worker loop:
//!
//! ```text
//! claim next job -> check staleness -> skip
//!                                   -> map + hash + render + assemble -> batch
//! batch full or jobs exhausted -> flush -> keep records of written pages
//! jobs exhausted -> merge kept records into the shared cache
//! ```
//!
//! Jobs are claimed through a shared atomic cursor, so the processing order
//! is unspecified. The shared cache is locked only to clone one entry during
//! the staleness check and once per worker for the final merge.

use std::collections::HashSet;
use std::io;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use rayon::ThreadPool;
use ssg_cache::{BuildCache, CacheEntry, StalenessOracle, content_hash, modified_secs};
use ssg_render::{PageRenderer, RenderError};

use crate::arena::Arena;
use crate::batch::{FlushReport, WriteBatch};
use crate::mapped::MappedFile;
use crate::metrics::BuildMetrics;
use crate::template::TemplateParts;

/// One Markdown source and where its page goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildJob {
    /// Source path, also the cache key.
    pub input_path: PathBuf,
    /// Page output path.
    pub output_path: PathBuf,
}

/// Why a single page could not be built.
#[derive(Debug, thiserror::Error)]
enum PageError {
    #[error("cannot stat source: {0}")]
    Stat(#[source] io::Error),
    #[error("cannot map source: {0}")]
    Map(#[source] io::Error),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Number of workers to start.
///
/// `requested == 0` means the available hardware parallelism. The result is
/// never more than the number of jobs and never less than one.
pub fn resolve_workers(requested: usize, jobs: usize) -> usize {
    let workers = if requested == 0 {
        std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
    } else {
        requested
    };
    workers.min(jobs).max(1)
}

/// Shared, read-only state of the parallel phase.
pub struct Orchestrator<'a, R: ?Sized> {
    template: &'a TemplateParts,
    renderer: &'a R,
    oracle: StalenessOracle,
    batch_size: usize,
    metrics: &'a BuildMetrics,
}

impl<'a, R: PageRenderer + ?Sized> Orchestrator<'a, R> {
    /// Create the shared state for one build.
    pub fn new(
        template: &'a TemplateParts,
        renderer: &'a R,
        oracle: StalenessOracle,
        batch_size: usize,
        metrics: &'a BuildMetrics,
    ) -> Self {
        Self {
            template,
            renderer,
            oracle,
            batch_size: batch_size.max(1),
            metrics,
        }
    }

    /// Process every job on `pool`, returning once all workers have merged.
    pub fn run(&self, pool: &ThreadPool, jobs: &[BuildJob], cache: &Mutex<BuildCache>) {
        let cursor = AtomicUsize::new(0);
        pool.broadcast(|ctx| {
            tracing::debug!(worker = ctx.index(), "Worker started");
            self.worker(jobs, &cursor, cache);
        });
    }

    /// Process jobs on the current thread only.
    pub fn run_local(&self, jobs: &[BuildJob], cache: &Mutex<BuildCache>) {
        let cursor = AtomicUsize::new(0);
        self.worker(jobs, &cursor, cache);
    }

    fn worker(&self, jobs: &[BuildJob], cursor: &AtomicUsize, cache: &Mutex<BuildCache>) {
        let mut scratch = Arena::new();
        let mut batch_arena = Arena::new();
        let mut shard: Vec<CacheEntry> = Vec::new();

        loop {
            let mut pending = Vec::with_capacity(self.batch_size);
            let mut report = FlushReport::default();
            let more = {
                // Pages borrow from batch_arena; the batch must be gone before it resets
                let mut batch = WriteBatch::with_capacity(self.batch_size);
                let more = self.fill_batch(
                    jobs,
                    cursor,
                    cache,
                    &mut scratch,
                    &batch_arena,
                    &mut batch,
                    &mut pending,
                    &mut report,
                );
                report.extend(batch.flush());
                more
            };
            self.commit(&report, pending, &mut shard);
            batch_arena.reset();
            if !more {
                break;
            }
        }

        if !shard.is_empty() {
            lock(cache).merge(shard);
        }
    }

    /// Claim and process jobs until the batch is full (returns `true`) or
    /// no jobs remain (returns `false`).
    #[allow(clippy::too_many_arguments)]
    fn fill_batch<'b>(
        &self,
        jobs: &[BuildJob],
        cursor: &AtomicUsize,
        cache: &Mutex<BuildCache>,
        scratch: &mut Arena,
        batch_arena: &'b Arena,
        batch: &mut WriteBatch<&'b [u8]>,
        pending: &mut Vec<CacheEntry>,
        report: &mut FlushReport,
    ) -> bool {
        while !batch.is_full() {
            let Some(job) = jobs.get(cursor.fetch_add(1, Ordering::Relaxed)) else {
                return false;
            };

            let result = self.process(job, cache, scratch, batch_arena);
            scratch.reset();

            match result {
                Ok(Some((page, entry))) => {
                    report.extend(batch.add(job.output_path.clone(), page));
                    pending.push(entry);
                }
                Ok(None) => self.metrics.inc_skipped(),
                Err(e) => {
                    tracing::warn!(path = %job.input_path.display(), error = %e, "Failed to build page");
                    self.metrics.add_failed(1);
                }
            }
        }
        true
    }

    /// Build one page into `batch_arena`, or return `None` if it is up to date.
    fn process<'b>(
        &self,
        job: &BuildJob,
        cache: &Mutex<BuildCache>,
        scratch: &Arena,
        batch_arena: &'b Arena,
    ) -> Result<Option<(&'b [u8], CacheEntry)>, PageError> {
        let cached = lock(cache).get(&job.input_path).cloned();
        let staleness = self.oracle.needs_rebuild(&job.input_path, cached.as_ref());
        if !staleness.needs_rebuild() {
            tracing::debug!(path = %job.input_path.display(), ?staleness, "Skipping page");
            return Ok(None);
        }
        tracing::debug!(path = %job.input_path.display(), ?staleness, "Rebuilding page");

        let last_modified = modified_secs(&job.input_path).map_err(PageError::Stat)?;
        let source = MappedFile::open(&job.input_path).map_err(PageError::Map)?;
        let hash = content_hash(&source);
        let rendered = self.renderer.render(&source, scratch.bump())?;
        let page = self
            .template
            .assemble_into(batch_arena, rendered.title, rendered.html);
        drop(source);

        Ok(Some((
            page,
            CacheEntry {
                input_path: job.input_path.clone(),
                output_path: job.output_path.clone(),
                last_modified,
                content_hash: hash,
            },
        )))
    }

    /// Move records of successfully written pages into the worker's shard.
    fn commit(&self, report: &FlushReport, pending: Vec<CacheEntry>, shard: &mut Vec<CacheEntry>) {
        self.metrics.add_built(report.written.len());
        self.metrics.add_failed(report.failed.len());

        let failed: HashSet<&Path> = report.failed.iter().map(|(path, _)| path.as_path()).collect();
        shard.extend(
            pending
                .into_iter()
                .filter(|entry| !failed.contains(entry.output_path.as_path())),
        );
    }
}

fn lock(cache: &Mutex<BuildCache>) -> MutexGuard<'_, BuildCache> {
    // Entries are replaced whole, so a poisoned map is still consistent
    cache.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use pretty_assertions::assert_eq;
    use ssg_render::Rendered;
    use std::fs;
    use std::time::Duration;

    /// Echoes the source as the body; fails on sources starting with `FAIL`.
    struct EchoRenderer;

    impl PageRenderer for EchoRenderer {
        fn render<'a>(&self, source: &[u8], bump: &'a Bump) -> Result<Rendered<'a>, RenderError> {
            let text = std::str::from_utf8(source)?;
            if text.starts_with("FAIL") {
                return Err(RenderError::Write(std::fmt::Error));
            }
            let title: &'a str = bump.alloc_str("T");
            Ok(Rendered {
                title: Some(title),
                html: bump.alloc_str(text),
            })
        }
    }

    struct Fixture {
        dir: tempfile::TempDir,
        template: TemplateParts,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            fs::create_dir_all(dir.path().join("in")).unwrap();
            fs::create_dir_all(dir.path().join("out")).unwrap();
            let template_path = dir.path().join("t.html");
            fs::write(&template_path, "<{{title}}>{{content}}").unwrap();
            let template = TemplateParts::load(&template_path).unwrap();
            Self { dir, template }
        }

        fn job(&self, name: &str, content: &str) -> BuildJob {
            let input_path = self.dir.path().join("in").join(name);
            fs::write(&input_path, content).unwrap();
            BuildJob {
                input_path,
                output_path: self.dir.path().join("out").join(name).with_extension("html"),
            }
        }
    }

    #[test]
    fn test_resolve_workers() {
        assert_eq!(resolve_workers(4, 100), 4);
        assert_eq!(resolve_workers(8, 3), 3);
        assert_eq!(resolve_workers(4, 0), 1);
        assert!(resolve_workers(0, 1000) >= 1);
    }

    #[test]
    fn test_run_local_builds_and_records() {
        let fx = Fixture::new();
        let jobs = vec![fx.job("a.md", "alpha"), fx.job("b.md", "beta")];
        let metrics = BuildMetrics::new();
        let cache = Mutex::new(BuildCache::new());

        Orchestrator::new(&fx.template, &EchoRenderer, StalenessOracle::default(), 1, &metrics)
            .run_local(&jobs, &cache);

        assert_eq!(fs::read_to_string(&jobs[0].output_path).unwrap(), "<T>alpha");
        assert_eq!(fs::read_to_string(&jobs[1].output_path).unwrap(), "<T>beta");
        let cache = cache.into_inner().unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(
            cache.get(&jobs[0].input_path).unwrap().content_hash,
            content_hash(b"alpha")
        );
        assert_eq!(metrics.snapshot(Duration::ZERO).built_files, 2);
    }

    #[test]
    fn test_render_failure_is_skipped_and_counted() {
        let fx = Fixture::new();
        let jobs = vec![fx.job("bad.md", "FAIL here"), fx.job("good.md", "fine")];
        let metrics = BuildMetrics::new();
        let cache = Mutex::new(BuildCache::new());

        Orchestrator::new(&fx.template, &EchoRenderer, StalenessOracle::default(), 8, &metrics)
            .run_local(&jobs, &cache);

        let report = metrics.snapshot(Duration::ZERO);
        assert_eq!(report.built_files, 1);
        assert_eq!(report.failed_files, 1);
        assert!(!jobs[0].output_path.exists());
        let cache = cache.into_inner().unwrap();
        assert!(cache.get(&jobs[0].input_path).is_none());
        assert!(cache.get(&jobs[1].input_path).is_some());
    }

    #[test]
    fn test_write_failure_leaves_file_stale() {
        let fx = Fixture::new();
        let mut unwritable = fx.job("lost.md", "content");
        unwritable.output_path = fx.dir.path().join("no-such-dir/lost.html");
        let jobs = vec![unwritable, fx.job("kept.md", "content")];
        let metrics = BuildMetrics::new();
        let cache = Mutex::new(BuildCache::new());

        Orchestrator::new(&fx.template, &EchoRenderer, StalenessOracle::default(), 8, &metrics)
            .run_local(&jobs, &cache);

        let report = metrics.snapshot(Duration::ZERO);
        assert_eq!(report.built_files, 1);
        assert_eq!(report.failed_files, 1);
        let cache = cache.into_inner().unwrap();
        assert!(cache.get(&jobs[0].input_path).is_none());
        assert!(cache.get(&jobs[1].input_path).is_some());
    }

    #[test]
    fn test_up_to_date_is_skipped() {
        let fx = Fixture::new();
        let jobs = vec![fx.job("a.md", "alpha")];
        let cache = Mutex::new(BuildCache::new());
        let first = BuildMetrics::new();
        Orchestrator::new(&fx.template, &EchoRenderer, StalenessOracle::default(), 4, &first)
            .run_local(&jobs, &cache);

        let second = BuildMetrics::new();
        Orchestrator::new(&fx.template, &EchoRenderer, StalenessOracle::default(), 4, &second)
            .run_local(&jobs, &cache);

        let report = second.snapshot(Duration::ZERO);
        assert_eq!(report.built_files, 0);
        assert_eq!(report.skipped_files, 1);
    }

    #[test]
    fn test_pool_processes_every_job_once() {
        let fx = Fixture::new();
        let jobs: Vec<_> = (0..50)
            .map(|i| fx.job(&format!("p{i}.md"), &format!("page {i}")))
            .collect();
        let metrics = BuildMetrics::new();
        let cache = Mutex::new(BuildCache::new());
        let pool = rayon::ThreadPoolBuilder::new().num_threads(4).build().unwrap();

        Orchestrator::new(&fx.template, &EchoRenderer, StalenessOracle::default(), 3, &metrics)
            .run(&pool, &jobs, &cache);

        let report = metrics.snapshot(Duration::ZERO);
        assert_eq!(report.built_files, 50);
        assert_eq!(report.skipped_files, 0);
        assert_eq!(cache.into_inner().unwrap().len(), 50);
        for (i, job) in jobs.iter().enumerate() {
            assert_eq!(
                fs::read_to_string(&job.output_path).unwrap(),
                format!("<T>page {i}")
            );
        }
    }
}
