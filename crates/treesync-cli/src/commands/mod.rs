//! CLI subcommands and the job selection they share

pub mod config;
pub mod diff;
pub mod sync;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use treesync_core::config::Config;
use treesync_core::domain::{
    ensure_disjoint, parse_destinations, Job, ListSpeed, StoragePath, SyncMethod,
};

/// Listing speed as accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SpeedArg {
    Standard,
    Fast,
    Slow,
}

impl From<SpeedArg> for ListSpeed {
    fn from(speed: SpeedArg) -> Self {
        match speed {
            SpeedArg::Standard => ListSpeed::Standard,
            SpeedArg::Fast => ListSpeed::Fast,
            SpeedArg::Slow => ListSpeed::Slow,
        }
    }
}

/// Selects what to sync: a configured job or an ad-hoc source/destinations pair
#[derive(Debug, Clone, Args)]
pub struct JobArgs {
    /// Run the named job from the configuration file
    #[arg(long, conflicts_with_all = ["source", "destinations"])]
    pub job: Option<String>,

    /// Source directory on the storage backend (e.g. /photos)
    #[arg(required_unless_present = "job")]
    pub source: Option<String>,

    /// Destination directories, colon-separated (e.g. /backup-a:/backup-b)
    #[arg(required_unless_present = "job")]
    pub destinations: Option<String>,

    /// Delete destination files that are missing from the source
    #[arg(long)]
    pub mirror: bool,

    /// Colon-separated gitignore-style exclude patterns
    #[arg(long)]
    pub exclude: Option<String>,

    /// Listing speed hint for destination listings
    #[arg(long, value_enum)]
    pub speed: Option<SpeedArg>,

    /// Local directory backing the storage root (overrides storage.root)
    #[arg(long)]
    pub root: Option<PathBuf>,
}

/// A fully resolved run request
#[derive(Debug, Clone)]
pub struct ResolvedJob {
    /// Job name when taken from the configuration file
    pub name: Option<String>,
    pub source: StoragePath,
    pub destinations: Vec<StoragePath>,
    pub job: Job,
    pub root: PathBuf,
}

impl JobArgs {
    /// Loads the configuration file
    ///
    /// A named job needs the file, so read or parse errors are reported
    /// instead of falling back to defaults.
    pub fn load_config(&self, config_path: &Path) -> Result<Config> {
        if self.job.is_some() {
            Config::load(config_path).with_context(|| {
                format!("Failed to load configuration {}", config_path.display())
            })
        } else {
            Ok(Config::load_or_default(config_path))
        }
    }

    /// Combines the arguments with the configuration; flags win over the file
    pub fn resolve(&self, config: &Config) -> Result<ResolvedJob> {
        let (name, source, destinations, mut job) = match &self.job {
            Some(name) => {
                let errors = config.validate();
                if !errors.is_empty() {
                    let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
                    anyhow::bail!("Invalid configuration: {}", messages.join("; "));
                }
                let job_config = config
                    .find_job(name)
                    .with_context(|| format!("No job named '{name}' in configuration"))?;
                (
                    Some(name.clone()),
                    job_config.source_path()?,
                    job_config.destination_paths()?,
                    job_config.to_job(),
                )
            }
            None => {
                let source = self
                    .source
                    .as_deref()
                    .context("A source directory is required")?;
                let destinations = self
                    .destinations
                    .as_deref()
                    .context("At least one destination is required")?;
                (
                    None,
                    StoragePath::new(source)?,
                    parse_destinations(destinations)?,
                    Job::default(),
                )
            }
        };

        ensure_disjoint(&source, &destinations)?;

        if self.mirror {
            job.method = SyncMethod::Mirror;
        }
        if let Some(exclude) = &self.exclude {
            job.exclude_patterns = Some(exclude.clone());
        }
        if let Some(speed) = self.speed {
            job.speed = speed.into();
        }

        Ok(ResolvedJob {
            name,
            source,
            destinations,
            job,
            root: self
                .root
                .clone()
                .unwrap_or_else(|| config.storage.root.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use treesync_core::config::{ConfigBuilder, JobConfig};

    use super::*;

    fn args() -> JobArgs {
        JobArgs {
            job: None,
            source: None,
            destinations: None,
            mirror: false,
            exclude: None,
            speed: None,
            root: None,
        }
    }

    fn config() -> Config {
        let mut photos = JobConfig::new("photos", "/photos", "/a:/b");
        photos.exclude = Some("*.tmp".into());
        ConfigBuilder::new()
            .storage_root(PathBuf::from("/srv/drive"))
            .job(photos)
            .build()
    }

    #[test]
    fn test_resolve_ad_hoc_pair() {
        let args = JobArgs {
            source: Some("/src".into()),
            destinations: Some("/x::/y/".into()),
            mirror: true,
            speed: Some(SpeedArg::Fast),
            ..args()
        };
        let resolved = args.resolve(&config()).unwrap();
        assert!(resolved.name.is_none());
        assert_eq!(resolved.source.as_str(), "/src/");
        let dsts: Vec<&str> = resolved.destinations.iter().map(|d| d.as_str()).collect();
        assert_eq!(dsts, vec!["/x/", "/y/"]);
        assert_eq!(resolved.job.method, SyncMethod::Mirror);
        assert_eq!(resolved.job.speed, ListSpeed::Fast);
        assert_eq!(resolved.root, PathBuf::from("/srv/drive"));
    }

    #[test]
    fn test_resolve_configured_job_with_overrides() {
        let args = JobArgs {
            job: Some("photos".into()),
            exclude: Some("*.raw".into()),
            root: Some(PathBuf::from("/mnt/other")),
            ..args()
        };
        let resolved = args.resolve(&config()).unwrap();
        assert_eq!(resolved.name.as_deref(), Some("photos"));
        assert_eq!(resolved.source.as_str(), "/photos/");
        assert_eq!(resolved.destinations.len(), 2);
        assert_eq!(resolved.job.method, SyncMethod::AddOnly);
        assert_eq!(resolved.job.exclude_patterns.as_deref(), Some("*.raw"));
        assert_eq!(resolved.root, PathBuf::from("/mnt/other"));
    }

    #[test]
    fn test_resolve_unknown_job_fails() {
        let args = JobArgs {
            job: Some("nope".into()),
            ..args()
        };
        let err = args.resolve(&config()).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_resolve_rejects_relative_source() {
        let args = JobArgs {
            source: Some("relative".into()),
            destinations: Some("/x".into()),
            ..args()
        };
        assert!(args.resolve(&config()).is_err());
    }

    #[test]
    fn test_resolve_rejects_overlapping_destination() {
        for dsts in ["/src", "/src/sub", "/", "/ok:/src/deep/er"] {
            let args = JobArgs {
                source: Some("/src".into()),
                destinations: Some(dsts.into()),
                mirror: true,
                ..args()
            };
            let err = args.resolve(&config()).unwrap_err();
            assert!(err.to_string().contains("overlaps"), "{dsts}: {err}");
        }
    }

    #[test]
    fn test_resolve_configured_job_requires_valid_config() {
        let config = ConfigBuilder::new()
            .job(JobConfig::new("loop", "/a", "/a/sub"))
            .build();
        let args = JobArgs {
            job: Some("loop".into()),
            ..args()
        };
        let err = args.resolve(&config).unwrap_err();
        assert!(err.to_string().contains("Invalid configuration"));
    }

    #[test]
    fn test_load_config_for_named_job_reports_parse_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "jobs: [ not : valid").unwrap();

        let named = JobArgs {
            job: Some("photos".into()),
            ..args()
        };
        let err = named.load_config(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to load configuration"));

        let ad_hoc = JobArgs {
            source: Some("/src".into()),
            destinations: Some("/dst".into()),
            ..args()
        };
        assert!(ad_hoc.load_config(&path).is_ok());
    }
}
