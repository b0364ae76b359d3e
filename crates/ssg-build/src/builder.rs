//! Build driver: runs every phase of an incremental build in order.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use ssg_cache::{BuildCache, StalenessMode, StalenessOracle};
use ssg_render::PageRenderer;

use crate::batch::DEFAULT_BATCH_SIZE;
use crate::error::BuildError;
use crate::metrics::{BuildMetrics, BuildReport};
use crate::orchestrator::{BuildJob, Orchestrator, resolve_workers};
use crate::scanner::{Scanner, copy_assets, mirror_directories, output_path};
use crate::template::TemplateParts;

/// Everything a build needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Root of the Markdown source tree.
    pub input_dir: PathBuf,
    /// Root of the generated site.
    pub output_dir: PathBuf,
    /// Page template.
    pub template_path: PathBuf,
    /// Build cache file.
    pub cache_path: PathBuf,
    /// Worker threads; 0 uses the available hardware parallelism.
    pub workers: usize,
    /// Pending writes per worker.
    pub batch_size: usize,
    /// Evidence the staleness check consults.
    pub staleness_mode: StalenessMode,
    /// Rebuild every page regardless of the cache.
    pub force: bool,
}

impl BuildOptions {
    /// Options with default tuning for the given paths.
    pub fn new(
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        template_path: impl Into<PathBuf>,
        cache_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            template_path: template_path.into(),
            cache_path: cache_path.into(),
            workers: 0,
            batch_size: DEFAULT_BATCH_SIZE,
            staleness_mode: StalenessMode::default(),
            force: false,
        }
    }
}

/// Incremental site builder.
///
/// Phases run strictly in order: validate, load cache, scan, mirror
/// directories and copy assets, render pages in parallel, purge deleted
/// sources, save cache. Only the rendering phase is concurrent.
pub struct SiteBuilder<R> {
    options: BuildOptions,
    renderer: R,
}

impl<R: PageRenderer> SiteBuilder<R> {
    /// Create a builder.
    pub fn new(options: BuildOptions, renderer: R) -> Self {
        Self { options, renderer }
    }

    /// Run one build.
    ///
    /// Per-file failures are logged and counted in the report; they do not
    /// make the build fail.
    pub fn build(&self) -> Result<BuildReport, BuildError> {
        let started = Instant::now();
        let opts = &self.options;

        if !opts.input_dir.is_dir() {
            return Err(BuildError::InputNotFound(opts.input_dir.clone()));
        }
        if opts.output_dir.starts_with(&opts.input_dir) || opts.input_dir.starts_with(&opts.output_dir) {
            return Err(BuildError::OverlappingRoots {
                input: opts.input_dir.clone(),
                output: opts.output_dir.clone(),
            });
        }
        let template = TemplateParts::load(&opts.template_path)?;

        // Every recorded page embeds the template it was built with
        let stamp = template_stamp(&opts.template_path, &template);
        let stamp_path = template_stamp_path(&opts.cache_path);
        let cache = match fs::read_to_string(&stamp_path) {
            Ok(stored) if stored == stamp => BuildCache::load(&opts.cache_path),
            Ok(stored) => {
                tracing::info!(%stored, current = %stamp, "Template changed, rebuilding all pages");
                BuildCache::new()
            }
            Err(e) => {
                tracing::debug!(path = %stamp_path.display(), error = %e, "No template stamp, rebuilding all pages");
                BuildCache::new()
            }
        };

        let tree = Scanner::new(&opts.input_dir).scan()?;
        tracing::debug!(
            markdown = tree.markdown.len(),
            assets = tree.assets.len(),
            dirs = tree.dirs.len(),
            "Scanned sources"
        );

        let metrics = BuildMetrics::new();
        mirror_directories(&tree, &opts.output_dir)?;
        copy_assets(&tree, &opts.input_dir, &opts.output_dir, &metrics);

        let jobs: Vec<BuildJob> = tree
            .markdown
            .iter()
            .map(|relative| BuildJob {
                input_path: opts.input_dir.join(relative),
                output_path: output_path(&opts.output_dir, relative),
            })
            .collect();
        metrics.add_total(jobs.len());

        let cache = Mutex::new(cache);
        if !jobs.is_empty() {
            let workers = resolve_workers(opts.workers, jobs.len());
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("ssg-worker-{i}"))
                .build()?;
            tracing::info!(pages = jobs.len(), workers, "Building pages");

            let oracle = StalenessOracle::new(opts.staleness_mode).with_force(opts.force);
            Orchestrator::new(&template, &self.renderer, oracle, opts.batch_size, &metrics)
                .run(&pool, &jobs, &cache);
        }

        let mut cache = cache.into_inner().unwrap_or_else(PoisonError::into_inner);
        let purged = cache.purge_missing();
        cache.save(&opts.cache_path)?;
        fs::write(&stamp_path, &stamp).map_err(|e| BuildError::io(&stamp_path, e))?;

        let mut report = metrics.snapshot(started.elapsed());
        report.purged_entries = purged;
        tracing::info!(
            total = report.total_files,
            built = report.built_files,
            skipped = report.skipped_files,
            failed = report.failed_files,
            copied = report.copied_files,
            purged = report.purged_entries,
            elapsed = ?report.elapsed,
            "Build finished"
        );
        Ok(report)
    }
}

/// Sidecar of `cache_path` recording which template the cached pages embed.
pub fn template_stamp_path(cache_path: &Path) -> PathBuf {
    let mut name = cache_path.as_os_str().to_owned();
    name.push(".template");
    PathBuf::from(name)
}

/// Template identity: content hash and path.
fn template_stamp(path: &Path, template: &TemplateParts) -> String {
    format!("{:016x} {}", template.content_hash(), path.display())
}
