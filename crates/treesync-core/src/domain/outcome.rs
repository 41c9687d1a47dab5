//! Per-file outcome records
//!
//! One record is emitted for every file the engine attempts to copy or
//! delete. Records are final: the engine never updates or retracts one, and
//! a re-run produces fresh records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::{StoragePath, TaskId};

/// Result of one copy or delete attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Accepted by the remote service as an asynchronous task
    Submitted,
    /// Completed before the storage call returned
    Succeeded,
    /// The attempt raised an error
    Failed,
}

impl OutcomeStatus {
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, OutcomeStatus::Failed)
    }
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutcomeStatus::Submitted => write!(f, "submitted"),
            OutcomeStatus::Succeeded => write!(f, "succeeded"),
            OutcomeStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Outcome of copying one file from `src_dir` to `dst_dir`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyOutcome {
    pub src_dir: StoragePath,
    pub dst_dir: StoragePath,
    pub name: String,
    pub size: u64,
    /// Remote task tracking the copy, present only for `Submitted`
    pub task_id: Option<TaskId>,
    pub status: OutcomeStatus,
    pub error: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl CopyOutcome {
    fn new(
        src_dir: &StoragePath,
        dst_dir: &StoragePath,
        name: &str,
        size: u64,
        status: OutcomeStatus,
    ) -> Self {
        Self {
            src_dir: src_dir.clone(),
            dst_dir: dst_dir.clone(),
            name: name.to_string(),
            size,
            task_id: None,
            status,
            error: None,
            recorded_at: Utc::now(),
        }
    }

    /// The remote service accepted the copy as `task_id`
    #[must_use]
    pub fn submitted(
        src_dir: &StoragePath,
        dst_dir: &StoragePath,
        name: &str,
        size: u64,
        task_id: TaskId,
    ) -> Self {
        Self {
            task_id: Some(task_id),
            ..Self::new(src_dir, dst_dir, name, size, OutcomeStatus::Submitted)
        }
    }

    /// The copy completed synchronously
    #[must_use]
    pub fn succeeded(src_dir: &StoragePath, dst_dir: &StoragePath, name: &str, size: u64) -> Self {
        Self::new(src_dir, dst_dir, name, size, OutcomeStatus::Succeeded)
    }

    /// The copy (or its directory preparation) failed
    #[must_use]
    pub fn failed(
        src_dir: &StoragePath,
        dst_dir: &StoragePath,
        name: &str,
        size: u64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(src_dir, dst_dir, name, size, OutcomeStatus::Failed)
        }
    }

    /// Full source path of the file
    #[must_use]
    pub fn src_path(&self) -> String {
        self.src_dir.entry(&self.name)
    }

    /// Full destination path of the file
    #[must_use]
    pub fn dst_path(&self) -> String {
        self.dst_dir.entry(&self.name)
    }
}

/// Outcome of deleting one file from `dst_dir`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub dst_dir: StoragePath,
    pub name: String,
    pub size: u64,
    pub status: OutcomeStatus,
    pub error: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl DeleteOutcome {
    #[must_use]
    pub fn succeeded(dst_dir: &StoragePath, name: &str, size: u64) -> Self {
        Self {
            dst_dir: dst_dir.clone(),
            name: name.to_string(),
            size,
            status: OutcomeStatus::Succeeded,
            error: None,
            recorded_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn failed(dst_dir: &StoragePath, name: &str, size: u64, error: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Failed,
            error: Some(error.into()),
            ..Self::succeeded(dst_dir, name, size)
        }
    }

    /// Full path of the deleted file
    #[must_use]
    pub fn path(&self) -> String {
        self.dst_dir.entry(&self.name)
    }
}
