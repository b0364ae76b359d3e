//! `ssg build` command implementation.

use std::path::PathBuf;

use clap::Args;
use ssg_build::{BuildOptions, SiteBuilder};
use ssg_cache::StalenessMode;
use ssg_config::{BuildConfig, CliSettings, Config};
use ssg_render::MarkdownRenderer;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Path to configuration file (default: auto-discover ssg.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Markdown source directory (overrides config).
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output directory (overrides config).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Page template (overrides config).
    #[arg(short, long)]
    template: Option<PathBuf>,

    /// Worker threads, 0 for one per CPU (overrides config).
    #[arg(short, long, env = "SSG_JOBS")]
    jobs: Option<usize>,

    /// Re-hash sources to detect edits that kept the modification time.
    #[arg(long)]
    strict: bool,

    /// Rebuild every page, ignoring the cache.
    #[arg(short, long)]
    force: bool,

    /// Enable verbose output (per-phase logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl BuildArgs {
    /// Execute the build command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the build cannot start.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            input_dir: self.input,
            output_dir: self.output,
            template: self.template,
            workers: self.jobs,
            strict_hash: self.strict.then_some(true),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        tracing::debug!(config_path = ?config.config_path, "Loaded configuration");
        let options = build_options(&config.build_resolved, self.force);

        output.info(&format!("Source: {}", options.input_dir.display()));
        output.info(&format!("Output: {}", options.output_dir.display()));

        let report = SiteBuilder::new(options, MarkdownRenderer::new()).build()?;
        output.summary(&report);

        if report.failed_files == 0 {
            output.success("Site built successfully");
        }
        Ok(())
    }
}

fn build_options(config: &BuildConfig, force: bool) -> BuildOptions {
    let mut options = BuildOptions::new(
        &config.input_dir,
        &config.output_dir,
        &config.template,
        &config.cache_file,
    );
    options.workers = config.workers;
    options.batch_size = config.batch_size;
    options.staleness_mode = if config.strict_hash {
        StalenessMode::Content
    } else {
        StalenessMode::Mtime
    };
    options.force = force;
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_build_options_from_config() {
        let config = BuildConfig {
            input_dir: PathBuf::from("/p/content"),
            output_dir: PathBuf::from("/p/public"),
            template: PathBuf::from("/p/t.html"),
            cache_file: PathBuf::from("/p/.ssgcache"),
            workers: 3,
            batch_size: 16,
            strict_hash: true,
        };

        let options = build_options(&config, true);

        assert_eq!(
            options,
            BuildOptions {
                input_dir: PathBuf::from("/p/content"),
                output_dir: PathBuf::from("/p/public"),
                template_path: PathBuf::from("/p/t.html"),
                cache_path: PathBuf::from("/p/.ssgcache"),
                workers: 3,
                batch_size: 16,
                staleness_mode: StalenessMode::Content,
                force: true,
            }
        );
    }

    #[test]
    fn test_default_config_uses_mtime_mode() {
        let options = build_options(&BuildConfig::default(), false);
        assert_eq!(options.staleness_mode, StalenessMode::Mtime);
        assert!(!options.force);
    }
}
