//! Sync job settings and the cooperative enable switch
//!
//! A [`Job`] is owned by whoever schedules sync runs. The engine only reads
//! it; the [`JobSwitch`] inside is the one piece that may change while a run
//! is in progress, and the engine polls it before every entry and between
//! phases.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::newtypes::JobId;

/// How a destination is reconciled with the source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMethod {
    /// Copy missing or changed files, never delete
    #[default]
    AddOnly,
    /// Copy, then delete destination files absent from the source
    Mirror,
}

impl std::fmt::Display for SyncMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncMethod::AddOnly => write!(f, "add_only"),
            SyncMethod::Mirror => write!(f, "mirror"),
        }
    }
}

/// Listing speed hint passed opaquely to the storage client
///
/// Remote backends may use it to pick between cached and fresh listings or
/// to pace requests. The engine attaches it to destination listings only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListSpeed {
    #[default]
    Standard,
    Fast,
    Slow,
}

impl std::fmt::Display for ListSpeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListSpeed::Standard => write!(f, "standard"),
            ListSpeed::Fast => write!(f, "fast"),
            ListSpeed::Slow => write!(f, "slow"),
        }
    }
}

/// Shared enabled flag of a job
///
/// Clones share the same flag. Disabling is observed by a running sync at
/// its next poll; nothing in flight is interrupted.
#[derive(Debug, Clone)]
pub struct JobSwitch {
    enabled: Arc<AtomicBool>,
}

impl JobSwitch {
    /// Creates a switch in the enabled state
    #[must_use]
    pub fn new() -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Returns true while the job may keep running
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Asks running syncs to stop at their next poll
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    /// Re-enables the job for subsequent runs
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }
}

impl Default for JobSwitch {
    fn default() -> Self {
        Self::new()
    }
}

/// Runtime view of a sync job as seen by the engine
#[derive(Debug, Clone, Default)]
pub struct Job {
    /// Correlates log lines of runs of this job
    pub id: JobId,
    /// Cooperative enable flag
    pub switch: JobSwitch,
    /// Colon-delimited gitignore-style patterns, if any
    pub exclude_patterns: Option<String>,
    /// Add-only or mirror
    pub method: SyncMethod,
    /// Hint for destination listings
    pub speed: ListSpeed,
}

impl Job {
    /// Creates an enabled job with the given method
    #[must_use]
    pub fn new(method: SyncMethod) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_exclude(mut self, patterns: impl Into<String>) -> Self {
        self.exclude_patterns = Some(patterns.into());
        self
    }

    #[must_use]
    pub fn with_speed(mut self, speed: ListSpeed) -> Self {
        self.speed = speed;
        self
    }

    #[must_use]
    pub fn with_id(mut self, id: JobId) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn with_switch(mut self, switch: JobSwitch) -> Self {
        self.switch = switch;
        self
    }

    /// Shorthand for `self.switch.is_enabled()`
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.switch.is_enabled()
    }
}
