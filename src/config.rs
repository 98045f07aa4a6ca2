//! Layered application configuration.
//!
//! Settings are merged from lowest to highest precedence:
//!
//! 1. Built-in defaults ([`Settings::default`])
//! 2. A TOML file (`--config <path>`, or `config.toml` in the platform config
//!    directory when it exists)
//! 3. `DUPESCAN_*` environment variables (`DUPESCAN_MIN_SIZE_KIB=64`)
//! 4. Explicit command-line flags ([`Settings::apply_cli`])
//!
//! # Example
//!
//! ```toml
//! min_size_kib = 64
//! thorough = true
//! output = "csv"
//! schedule = "work-stealing"
//! progress = "bar"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::duplicates::{default_parallelism, ScheduleKind};
use crate::output::OutputMode;
use crate::progress::ProgressMode;
use crate::scanner::{DigestStrategy, RootFailurePolicy};

/// Prefix of the environment variables read into [`Settings`].
pub const ENV_PREFIX: &str = "DUPESCAN_";

/// Name of the configuration file inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Errors that can occur while loading configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    /// A layer could not be parsed or has values of the wrong type.
    #[error("invalid configuration: {0}")]
    Extract(Box<figment::Error>),
}

/// Effective settings for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Files smaller than this many KiB are ignored
    pub min_size_kib: u64,
    /// Hash workers, 0 picks one less than the number of cores
    pub parallelism: usize,
    /// Hash whole files with SHA-256 instead of sampling
    pub thorough: bool,
    /// Report mode
    pub output: OutputMode,
    /// Newline-separated basenames to skip, embedded defaults when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusions_file: Option<PathBuf>,
    /// How candidate groups are spread over workers
    pub schedule: ScheduleKind,
    /// What to do when a root cannot be walked
    pub root_failure: RootFailurePolicy,
    /// How hashing progress is shown
    pub progress: ProgressMode,
    /// Milliseconds between progress updates
    pub progress_interval_ms: u64,
    /// Milliseconds before the first progress update
    pub progress_initial_delay_ms: u64,
    /// Directory report files are written to
    pub report_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            min_size_kib: 4,
            parallelism: 0,
            thorough: false,
            output: OutputMode::Text,
            exclusions_file: None,
            schedule: ScheduleKind::Static,
            root_failure: RootFailurePolicy::Continue,
            progress: ProgressMode::Lines,
            progress_interval_ms: 2000,
            progress_initial_delay_ms: 200,
            report_dir: PathBuf::from("."),
        }
    }
}

impl Settings {
    /// Default config file location, if the platform has a config directory.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dupescan")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Build the figment for an optional config file.
    ///
    /// A `None` path falls back to [`Settings::default_config_path`], which is
    /// only merged when the file exists.
    #[must_use]
    pub fn figment(config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        let file = config_path
            .map(Path::to_path_buf)
            .or_else(|| Self::default_config_path().filter(|p| p.is_file()));
        if let Some(file) = file {
            log::debug!("Merging config file {}", file.display());
            figment = figment.merge(Toml::file(file));
        }

        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load settings from defaults, config file and environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if `config_path` is given but missing,
    /// or [`ConfigError::Extract`] if any layer is malformed.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            if !path.is_file() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
        }
        Self::figment(config_path)
            .extract()
            .map_err(|e| ConfigError::Extract(Box::new(e)))
    }

    /// Load settings from defaults and one TOML file, ignoring the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is missing or malformed.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| ConfigError::Extract(Box::new(e)))
    }

    /// Overlay the flags the user passed explicitly.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(kib) = cli.min_size_kib {
            self.min_size_kib = kib;
        }
        if let Some(parallelism) = cli.parallelism {
            self.parallelism = parallelism;
        }
        if cli.thorough {
            self.thorough = true;
        }
        if let Some(output) = cli.output {
            self.output = output;
        }
        if let Some(ref file) = cli.exclusions {
            self.exclusions_file = Some(file.clone());
        }
        if let Some(schedule) = cli.schedule {
            self.schedule = schedule;
        }
        if cli.abort_on_root_failure {
            self.root_failure = RootFailurePolicy::Abort;
        }
        if let Some(progress) = cli.progress {
            self.progress = progress;
        }
        if let Some(ref dir) = cli.report_dir {
            self.report_dir = dir.clone();
        }
    }

    /// Minimum file size in bytes.
    #[must_use]
    pub fn min_size_bytes(&self) -> u64 {
        self.min_size_kib.saturating_mul(1024)
    }

    /// Effective number of hash workers, always at least 1.
    #[must_use]
    pub fn resolve_parallelism(&self) -> usize {
        if self.parallelism == 0 {
            default_parallelism()
        } else {
            self.parallelism
        }
    }

    /// Digest strategy selected by `thorough`.
    #[must_use]
    pub fn strategy(&self) -> DigestStrategy {
        DigestStrategy::from_thorough(self.thorough)
    }

    /// Delay before the first progress update.
    #[must_use]
    pub fn progress_initial_delay(&self) -> Duration {
        Duration::from_millis(self.progress_initial_delay_ms)
    }

    /// Interval between progress updates.
    #[must_use]
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }
}
