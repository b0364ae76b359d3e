//! Configuration management for ssg.
//!
//! Parses `ssg.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories. Relative paths in
//! the file are resolved against the directory containing it.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ```toml
//! [build]
//! input_dir = "content"
//! output_dir = "public"
//! template = "templates/default.html"
//! cache_file = ".ssgcache"
//! workers = 0
//! batch_size = 64
//! strict_hash = false
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the Markdown source directory.
    pub input_dir: Option<PathBuf>,
    /// Override the output directory.
    pub output_dir: Option<PathBuf>,
    /// Override the page template.
    pub template: Option<PathBuf>,
    /// Override the worker count.
    pub workers: Option<usize>,
    /// Override content-hash staleness checking.
    pub strict_hash: Option<bool>,
}

/// Configuration filename to search for.
pub const CONFIG_FILENAME: &str = "ssg.toml";

/// Largest accepted `build.batch_size`.
pub const MAX_BATCH_SIZE: usize = 4096;

const DEFAULT_INPUT_DIR: &str = "content";
const DEFAULT_OUTPUT_DIR: &str = "public";
const DEFAULT_TEMPLATE: &str = "templates/default.html";
const DEFAULT_CACHE_FILE: &str = ".ssgcache";
const DEFAULT_BATCH_SIZE: usize = 64;

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build configuration (paths are relative strings from TOML).
    build: BuildConfigRaw,

    /// Resolved build configuration (set after loading).
    #[serde(skip)]
    pub build_resolved: BuildConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw build configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct BuildConfigRaw {
    input_dir: Option<String>,
    output_dir: Option<String>,
    template: Option<String>,
    cache_file: Option<String>,
    workers: Option<usize>,
    batch_size: Option<usize>,
    strict_hash: Option<bool>,
}

/// Resolved build configuration with paths joined onto the project directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// Root of the Markdown source tree.
    pub input_dir: PathBuf,
    /// Root of the generated site.
    pub output_dir: PathBuf,
    /// HTML template with `{{title}}` and `{{content}}` placeholders.
    pub template: PathBuf,
    /// Build cache file.
    pub cache_file: PathBuf,
    /// Worker threads; 0 uses the available hardware parallelism.
    pub workers: usize,
    /// Pending writes per worker before a flush.
    pub batch_size: usize,
    /// Re-hash sources when checking staleness.
    pub strict_hash: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self::with_base(Path::new("."))
    }
}

impl BuildConfig {
    fn with_base(base: &Path) -> Self {
        Self {
            input_dir: base.join(DEFAULT_INPUT_DIR),
            output_dir: base.join(DEFAULT_OUTPUT_DIR),
            template: base.join(DEFAULT_TEMPLATE),
            cache_file: base.join(DEFAULT_CACHE_FILE),
            workers: 0,
            batch_size: DEFAULT_BATCH_SIZE,
            strict_hash: false,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

/// Require a string field to be non-empty when set.
fn require_non_empty(value: Option<&str>, field: &str) -> Result<(), ConfigError> {
    if value.is_some_and(str::is_empty) {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `ssg.toml` in current directory and parents,
    /// falling back to defaults relative to the current directory.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the final configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        let build = &mut self.build_resolved;
        if let Some(input_dir) = &settings.input_dir {
            build.input_dir.clone_from(input_dir);
        }
        if let Some(output_dir) = &settings.output_dir {
            build.output_dir.clone_from(output_dir);
        }
        if let Some(template) = &settings.template {
            build.template.clone_from(template);
        }
        if let Some(workers) = settings.workers {
            build.workers = workers;
        }
        if let Some(strict_hash) = settings.strict_hash {
            build.strict_hash = strict_hash;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let cwd = std::env::current_dir().ok()?;
        discover_from(&cwd)
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            build: BuildConfigRaw::default(),
            build_resolved: BuildConfig::with_base(base),
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.validate_raw()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Reject empty path strings before they are joined onto the config directory.
    fn validate_raw(&self) -> Result<(), ConfigError> {
        require_non_empty(self.build.input_dir.as_deref(), "build.input_dir")?;
        require_non_empty(self.build.output_dir.as_deref(), "build.output_dir")?;
        require_non_empty(self.build.template.as_deref(), "build.template")?;
        require_non_empty(self.build.cache_file.as_deref(), "build.cache_file")?;
        Ok(())
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let build = &self.build_resolved;

        if build.batch_size == 0 || build.batch_size > MAX_BATCH_SIZE {
            return Err(ConfigError::Validation(format!(
                "build.batch_size must be between 1 and {MAX_BATCH_SIZE}"
            )));
        }

        // An empty override would make the input and output roots coincide
        // with the working directory
        for (path, field) in [
            (&build.input_dir, "build.input_dir"),
            (&build.output_dir, "build.output_dir"),
            (&build.template, "build.template"),
            (&build.cache_file, "build.cache_file"),
        ] {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Validation(format!("{field} cannot be empty")));
            }
        }

        if build.input_dir == build.output_dir {
            return Err(ConfigError::Validation(
                "build.output_dir must differ from build.input_dir".to_owned(),
            ));
        }
        if build.output_dir.starts_with(&build.input_dir) {
            return Err(ConfigError::Validation(
                "build.output_dir must not be inside build.input_dir".to_owned(),
            ));
        }
        if build.input_dir.starts_with(&build.output_dir) {
            return Err(ConfigError::Validation(
                "build.input_dir must not be inside build.output_dir".to_owned(),
            ));
        }

        Ok(())
    }

    /// Resolve relative paths against the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));
        let raw = &self.build;

        self.build_resolved = BuildConfig {
            input_dir: resolve(raw.input_dir.as_deref(), DEFAULT_INPUT_DIR),
            output_dir: resolve(raw.output_dir.as_deref(), DEFAULT_OUTPUT_DIR),
            template: resolve(raw.template.as_deref(), DEFAULT_TEMPLATE),
            cache_file: resolve(raw.cache_file.as_deref(), DEFAULT_CACHE_FILE),
            workers: raw.workers.unwrap_or(0),
            batch_size: raw.batch_size.unwrap_or(DEFAULT_BATCH_SIZE),
            strict_hash: raw.strict_hash.unwrap_or(false),
        };
    }
}

/// Search for `ssg.toml` in `start` and its parents.
fn discover_from(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(CONFIG_FILENAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}
