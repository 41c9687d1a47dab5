//! Configuration module for treesync.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.
//!
//! ```yaml
//! storage:
//!   root: /srv/drive
//! logging:
//!   level: info
//!   format: text
//! jobs:
//!   - name: photos
//!     source: /photos
//!     destinations: /backup-a/photos:/backup-b/photos
//!     method: mirror
//!     speed: standard
//!     exclude: "*.tmp:.cache/"
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;
use crate::domain::exclude::ExcludeFilter;
use crate::domain::job::{Job, JobSwitch, ListSpeed, SyncMethod};
use crate::domain::newtypes::{parse_destinations, JobId, StoragePath};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for treesync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub jobs: Vec<JobConfig>,
}

/// Storage backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Local directory that backs the `/` storage root.
    pub root: PathBuf,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Output format: `text` or `json`.
    pub format: String,
}

/// Destinations as written in the file: a YAML list or a colon-delimited string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Destinations {
    List(Vec<String>),
    Delimited(String),
}

impl Destinations {
    /// Parses every destination into a normalized path, keeping order.
    pub fn to_paths(&self) -> Result<Vec<StoragePath>, DomainError> {
        match self {
            Destinations::Delimited(raw) => parse_destinations(raw),
            Destinations::List(items) => {
                let paths = items
                    .iter()
                    .map(|item| StoragePath::new(item.trim()))
                    .collect::<Result<Vec<_>, _>>()?;
                if paths.is_empty() {
                    return Err(DomainError::InvalidDestinations(
                        "destination list is empty".to_string(),
                    ));
                }
                Ok(paths)
            }
        }
    }
}

/// One configured sync job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Unique job name, used on the command line.
    pub name: String,
    /// Source directory on the storage backend.
    pub source: String,
    /// One or more destination directories.
    pub destinations: Destinations,
    #[serde(default)]
    pub method: SyncMethod,
    #[serde(default)]
    pub speed: ListSpeed,
    /// Colon-delimited gitignore-style patterns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,
    /// Disabled jobs are skipped unless named explicitly.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl JobConfig {
    /// Creates an enabled add-only job.
    pub fn new(
        name: impl Into<String>,
        source: impl Into<String>,
        destinations: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            destinations: Destinations::Delimited(destinations.into()),
            method: SyncMethod::default(),
            speed: ListSpeed::default(),
            exclude: None,
            enabled: true,
        }
    }

    pub fn source_path(&self) -> Result<StoragePath, DomainError> {
        StoragePath::new(self.source.trim())
    }

    pub fn destination_paths(&self) -> Result<Vec<StoragePath>, DomainError> {
        self.destinations.to_paths()
    }

    /// Runtime job with a fresh switch reflecting `enabled`.
    pub fn to_job(&self) -> Job {
        let switch = JobSwitch::new();
        if !self.enabled {
            switch.disable();
        }
        Job {
            id: JobId::new(),
            switch,
            exclude_patterns: self.exclude.clone(),
            method: self.method,
            speed: self.speed,
        }
    }
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) if path.exists() => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable configuration");
                Self::default()
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Using default configuration");
                Self::default()
            }
        }
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/treesync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("treesync")
            .join("config.yaml")
    }

    /// Looks up a job by name.
    pub fn find_job(&self, name: &str) -> Option<&JobConfig> {
        self.jobs.iter().find(|job| job.name == name)
    }
}

// ---------------------------------------------------------------------------
// Config::default()
// ---------------------------------------------------------------------------

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("~"))
                .join("treesync"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"jobs[0].source"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid values for `logging.format`.
const VALID_LOG_FORMATS: &[&str] = &["text", "json"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- storage ---
        if self.storage.root.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "storage.root".into(),
                message: "must not be empty".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }
        if !VALID_LOG_FORMATS.contains(&self.logging.format.as_str()) {
            errors.push(ValidationError {
                field: "logging.format".into(),
                message: format!(
                    "invalid format '{}'; valid options: {}",
                    self.logging.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        // --- jobs ---
        let mut seen = HashSet::new();
        for (index, job) in self.jobs.iter().enumerate() {
            let field = |name: &str| format!("jobs[{index}].{name}");

            if job.name.trim().is_empty() {
                errors.push(ValidationError {
                    field: field("name"),
                    message: "must not be empty".into(),
                });
            } else if !seen.insert(job.name.as_str()) {
                errors.push(ValidationError {
                    field: field("name"),
                    message: format!("duplicate job name '{}'", job.name),
                });
            }

            let source = match job.source_path() {
                Ok(path) => Some(path),
                Err(e) => {
                    errors.push(ValidationError {
                        field: field("source"),
                        message: e.to_string(),
                    });
                    None
                }
            };

            match job.destination_paths() {
                Ok(destinations) => {
                    if let Some(source) = &source {
                        for dst in &destinations {
                            if dst.overlaps(source) {
                                errors.push(ValidationError {
                                    field: field("destinations"),
                                    message: format!(
                                        "destination {dst} overlaps source {source}"
                                    ),
                                });
                            }
                        }
                    }
                }
                Err(e) => errors.push(ValidationError {
                    field: field("destinations"),
                    message: e.to_string(),
                }),
            }

            if let Some(patterns) = &job.exclude {
                if let Err(e) = ExcludeFilter::parse(patterns) {
                    errors.push(ValidationError {
                        field: field("exclude"),
                        message: e.to_string(),
                    });
                }
            }
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust
/// use treesync_core::config::{ConfigBuilder, JobConfig};
/// use std::path::PathBuf;
///
/// let config = ConfigBuilder::new()
///     .storage_root(PathBuf::from("/srv/drive"))
///     .logging_level("debug")
///     .job(JobConfig::new("docs", "/docs", "/backup/docs"))
///     .build();
/// assert_eq!(config.jobs.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn storage_root(mut self, root: PathBuf) -> Self {
        self.config.storage.root = root;
        self
    }

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_format(mut self, format: impl Into<String>) -> Self {
        self.config.logging.format = format.into();
        self
    }

    pub fn job(mut self, job: JobConfig) -> Self {
        self.config.jobs.push(job);
        self
    }

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
