//! Configuration structures for the tmpl template pre-compiler.
//!
//! - [`BuildConfig`] - Catalog build settings (root, extension, filters, parallelism)
//! - [`OutputConfig`] - Where the catalog manifest and generated source are written
//! - [`Config`] - Root configuration combining all settings
//!
//! All configuration types implement [`Default`] and deserialize with
//! `#[serde(default)]`, so a configuration file only needs the options it
//! overrides.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// The template file extension used when none is configured.
pub const DEFAULT_TEMPLATE_EXTENSION: &str = ".tmpl";

/// Normalizes a template extension for matching: surrounding whitespace
/// and any leading dots are removed and the rest is lowercased.
///
/// # Examples
///
/// ```
/// use tmpl_core::normalize_extension;
///
/// assert_eq!(normalize_extension(" .TMPL"), "tmpl");
/// assert_eq!(normalize_extension("..tmpl"), "tmpl");
/// assert_eq!(normalize_extension("."), "");
/// ```
#[must_use]
pub fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_ascii_lowercase()
}

/// Configuration for a catalog build.
///
/// # Examples
///
/// ```
/// use tmpl_core::BuildConfig;
///
/// let config = BuildConfig::default();
/// assert_eq!(config.file_extension, ".tmpl");
/// assert!(!config.parallel);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Application base path that templates are discovered under.
    pub root_path: Utf8PathBuf,

    /// Template file extension, matched case-insensitively. The leading dot
    /// is optional.
    pub file_extension: String,

    /// Directory names that are never descended into.
    pub skip_dirs: Vec<String>,

    /// Additional gitignore-style patterns to exclude from the tree.
    pub ignore_patterns: Vec<String>,

    /// Whether a `.gitignore` at the root is honoured.
    pub respect_gitignore: bool,

    /// Descend into symlinked directories. Links that lead back to a
    /// directory already on the current path are skipped either way.
    pub follow_links: bool,

    /// Run per-file translation on a thread pool.
    pub parallel: bool,

    /// Maximum number of worker threads in parallel mode.
    /// `None` means use all available CPU cores.
    pub max_parallel_jobs: Option<usize>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            root_path: Utf8PathBuf::from("."),
            file_extension: DEFAULT_TEMPLATE_EXTENSION.to_owned(),
            skip_dirs: vec![
                ".git".to_owned(),
                "node_modules".to_owned(),
                "target".to_owned(),
            ],
            ignore_patterns: Vec::new(),
            respect_gitignore: true,
            follow_links: false,
            parallel: false,
            max_parallel_jobs: None,
        }
    }
}

impl BuildConfig {
    /// Returns the configured extension without its leading dot, lowercased.
    ///
    /// # Examples
    ///
    /// ```
    /// use tmpl_core::BuildConfig;
    ///
    /// let mut config = BuildConfig::default();
    /// config.file_extension = ".CsHtml".to_owned();
    /// assert_eq!(config.normalized_extension(), "cshtml");
    /// ```
    #[must_use]
    pub fn normalized_extension(&self) -> String {
        normalize_extension(&self.file_extension)
    }

    /// Checks option values that cannot be expressed in the type.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.normalized_extension().is_empty() {
            return Err(ConfigError::invalid_option(
                "file_extension",
                "must not be empty",
            ));
        }

        if self.max_parallel_jobs == Some(0) {
            return Err(ConfigError::invalid_option(
                "max_parallel_jobs",
                "must be positive",
            ));
        }

        Ok(())
    }
}

/// Configuration for build outputs.
///
/// # Examples
///
/// ```
/// use tmpl_core::OutputConfig;
///
/// let config = OutputConfig::default();
/// assert_eq!(config.catalog_path().as_str(), "target/tmpl/catalog.json");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the outputs are written to.
    pub out_dir: Utf8PathBuf,

    /// File name of the JSON catalog manifest.
    pub catalog_file: String,

    /// File name of the generated Rust source.
    pub source_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            out_dir: Utf8PathBuf::from("target/tmpl"),
            catalog_file: "catalog.json".to_owned(),
            source_file: "templates.rs".to_owned(),
        }
    }
}

impl OutputConfig {
    /// Full path of the catalog manifest.
    #[must_use]
    pub fn catalog_path(&self) -> Utf8PathBuf {
        self.out_dir.join(&self.catalog_file)
    }

    /// Full path of the generated source file.
    #[must_use]
    pub fn source_path(&self) -> Utf8PathBuf {
        self.out_dir.join(&self.source_file)
    }
}

/// Root configuration for the tmpl tool.
///
/// # Examples
///
/// ```
/// use tmpl_core::Config;
///
/// let config = Config::default();
/// let json = serde_json::to_string_pretty(&config).unwrap();
/// assert!(json.contains("file_extension"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build configuration.
    pub build: BuildConfig,

    /// Output configuration.
    pub output: OutputConfig,
}

impl Config {
    /// Loads a configuration from a JSON file.
    ///
    /// Missing fields take their default values.
    pub fn from_file(path: &Utf8Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        let config: Self = serde_json::from_str(&contents)?;
        config.build.validate()?;
        Ok(config)
    }
}
