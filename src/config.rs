//! Layered runtime configuration.
//!
//! Settings are merged by `figment` from, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. A TOML file: `--config <FILE>`, or `jomics.toml` in the platform
//!    config directory if it exists
//! 3. `JOMICS_*` environment variables (`JOMICS_THUMB_HEIGHT=300`)
//! 4. Command-line flags
//!
//! ```toml
//! root = "/srv/comics"
//! thumb_height = 300
//! rescan_interval_secs = 600
//! archive_extensions = ["cbz", "cbr", "zip"]
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::scanner::{ScannerConfig, DEFAULT_ARCHIVE_EXTENSIONS};
use crate::thumbnail::DEFAULT_THUMB_HEIGHT;

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "JOMICS_";

/// Name of the configuration file in the platform config directory.
pub const CONFIG_FILE_NAME: &str = "jomics.toml";

/// Accepted thumbnail heights.
pub const THUMB_HEIGHT_RANGE: std::ops::RangeInclusive<u32> = 100..=2000;

/// Default seconds between rescans.
pub const DEFAULT_RESCAN_INTERVAL_SECS: u64 = 300;

/// Errors that can occur while loading configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// A source could not be parsed or a value has the wrong type.
    #[error("Invalid configuration: {0}")]
    Figment(#[from] Box<figment::Error>),

    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    /// No collection root was given.
    #[error("No collection root configured (pass ROOT or set `root` / JOMICS_ROOT)")]
    MissingRoot,

    /// The thumbnail height is outside the accepted range.
    #[error("Thumbnail height {0} out of range (100..=2000)")]
    InvalidThumbHeight(u32),

    /// No archive extensions are configured.
    #[error("No archive extensions configured")]
    NoExtensions,

    /// No cache directory was given and the platform has none.
    #[error("Could not determine a cache directory; set `cache_dir`")]
    NoCacheDir,
}

/// Effective settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Collection root directory.
    pub root: Option<PathBuf>,
    /// Thumbnail height in pixels.
    pub thumb_height: u32,
    /// Seconds between rescans; 0 disables periodic rescans.
    pub rescan_interval_secs: u64,
    /// Thumbnail cache directory; the platform cache dir when unset.
    pub cache_dir: Option<PathBuf>,
    /// Archive extensions to index.
    pub archive_extensions: Vec<String>,
    /// Follow symbolic links while scanning.
    pub follow_symlinks: bool,
    /// Skip names starting with a dot.
    pub skip_hidden: bool,
    /// Scan worker threads; 0 picks one per core.
    pub threads: usize,
    /// Suppress progress output.
    pub quiet: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root: None,
            thumb_height: DEFAULT_THUMB_HEIGHT,
            rescan_interval_secs: DEFAULT_RESCAN_INTERVAL_SECS,
            cache_dir: None,
            archive_extensions: DEFAULT_ARCHIVE_EXTENSIONS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            follow_symlinks: false,
            skip_hidden: false,
            threads: 0,
            quiet: false,
        }
    }
}

/// Values given on the command line. Unset fields leave lower layers alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Overrides {
    /// Collection root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    /// Thumbnail height
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumb_height: Option<u32>,
    /// Rescan interval in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rescan_interval_secs: Option<u64>,
    /// Cache directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
    /// Quiet mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiet: Option<bool>,
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "jomics", "jomics")
}

/// Platform location of `jomics.toml`.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Platform thumbnail cache directory.
#[must_use]
pub fn default_cache_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.cache_dir().join("thumbnails"))
}

impl Settings {
    /// Defaults, file and environment layers.
    ///
    /// With `file` unset the platform config file is used when present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileNotFound`] if `file` is given but missing.
    pub fn figment(file: Option<&Path>) -> Result<Figment, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        match file {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::FileNotFound(path.to_path_buf()));
                }
                log::debug!("Loading config from {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
            None => {
                if let Some(path) = default_config_path().filter(|p| p.is_file()) {
                    log::debug!("Loading config from {}", path.display());
                    figment = figment.merge(Toml::file(path));
                }
            }
        }

        Ok(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Load and validate settings from every layer.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a layer is malformed or the merged
    /// settings fail [`validate`](Self::validate).
    pub fn load(file: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        let figment = Self::figment(file)?.merge(Serialized::defaults(overrides));
        Self::from_figment(&figment)
    }

    /// Extract and validate settings from a prepared figment.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let settings: Self = figment.extract().map_err(Box::new)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check value ranges and required fields.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRoot`],
    /// [`ConfigError::InvalidThumbHeight`] or [`ConfigError::NoExtensions`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.root.is_none() {
            return Err(ConfigError::MissingRoot);
        }
        if !THUMB_HEIGHT_RANGE.contains(&self.thumb_height) {
            return Err(ConfigError::InvalidThumbHeight(self.thumb_height));
        }
        if self.archive_extensions.iter().all(|e| e.trim().is_empty()) {
            return Err(ConfigError::NoExtensions);
        }
        Ok(())
    }

    /// The collection root.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRoot`] if none is configured.
    pub fn root(&self) -> Result<&Path, ConfigError> {
        self.root.as_deref().ok_or(ConfigError::MissingRoot)
    }

    /// The configured cache directory, or the platform default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoCacheDir`] if neither exists.
    pub fn cache_dir(&self) -> Result<PathBuf, ConfigError> {
        self.cache_dir
            .clone()
            .or_else(default_cache_dir)
            .ok_or(ConfigError::NoCacheDir)
    }

    /// Time between periodic rescans; zero when disabled.
    #[must_use]
    pub fn rescan_interval(&self) -> Duration {
        Duration::from_secs(self.rescan_interval_secs)
    }

    /// Scanner options derived from these settings.
    #[must_use]
    pub fn scanner_config(&self) -> ScannerConfig {
        ScannerConfig {
            archive_extensions: self.archive_extensions.clone(),
            follow_symlinks: self.follow_symlinks,
            skip_hidden: self.skip_hidden,
            threads: self.threads,
        }
    }
}
