//! Incremental, parallel site build engine for ssg.
//!
//! [`SiteBuilder`] drives a build: it loads the [`ssg_cache::BuildCache`],
//! scans the input tree, mirrors directories and copies assets, then renders
//! stale Markdown sources on a worker pool and saves the updated cache.
//!
//! The lower-level pieces are public for reuse and testing:
//!
//! - [`Arena`]: Bump allocator with explicit reset
//! - [`MappedFile`]: Read-only memory-mapped source
//! - [`TemplateParts`]: Template split around `{{title}}` and `{{content}}`
//! - [`WriteBatch`]: Bounded deferred writes
//! - [`BuildMetrics`]: Atomic counters, read as a [`BuildReport`]
//! - [`Orchestrator`]: The parallel worker loop
//!
//! # Example
//!
//! ```no_run
//! use ssg_build::{BuildOptions, SiteBuilder};
//! use ssg_render::MarkdownRenderer;
//!
//! let options = BuildOptions::new("content", "public", "templates/default.html", ".ssgcache");
//! let report = SiteBuilder::new(options, MarkdownRenderer::new()).build()?;
//! println!("{} of {} pages rebuilt", report.built_files, report.total_files);
//! # Ok::<(), ssg_build::BuildError>(())
//! ```

mod arena;
mod batch;
mod builder;
mod error;
mod mapped;
mod metrics;
mod orchestrator;
mod scanner;
mod template;

pub use arena::{Arena, ArenaError, DEFAULT_BLOCK_SIZE};
pub use batch::{DEFAULT_BATCH_SIZE, FlushReport, WriteBatch};
pub use builder::{BuildOptions, SiteBuilder, template_stamp_path};
pub use error::BuildError;
pub use mapped::MappedFile;
pub use metrics::{BuildMetrics, BuildReport};
pub use orchestrator::{BuildJob, Orchestrator, resolve_workers};
pub use scanner::{Scanner, SourceTree, copy_assets, mirror_directories, output_path};
pub use template::{CONTENT_PLACEHOLDER, TITLE_PLACEHOLDER, TemplateParts};
