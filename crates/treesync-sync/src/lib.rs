//! treesync Sync - Tree reconciliation engine
//!
//! Provides:
//! - Recursive tree comparison with optional size checks
//! - Ordered copy-then-delete reconciliation per destination
//! - Cooperative cancellation through the job switch
//! - Fan-out from one source listing to many destinations
//!
//! ## Modules
//!
//! - [`diff`] - Pure tree comparison
//! - [`copy`] / [`delete`] - Walks over a diff tree issuing storage calls
//! - [`engine`] - The [`SyncCoordinator`](engine::SyncCoordinator)
//! - [`sink`] - Outcome sinks (in-memory collector, channel)
//! - [`filesystem`] - Local directory storage adapter

pub mod copy;
pub mod delete;
pub mod diff;
pub mod engine;
pub mod filesystem;
pub mod sink;

use thiserror::Error;
use treesync_core::domain::{errors::DomainError, newtypes::StoragePath};

/// Errors that abort a whole sync run
///
/// Failures of single files never surface here; they are reported as
/// `Failed` outcomes through the sink.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Listing a source or destination tree failed
    #[error("Failed to list {path}: {source:#}")]
    Listing {
        path: StoragePath,
        #[source]
        source: anyhow::Error,
    },

    /// A destination root could not be created before listing it
    #[error("Failed to create destination {path}: {source:#}")]
    CreateDestination {
        path: StoragePath,
        #[source]
        source: anyhow::Error,
    },

    /// A domain-level error propagated from treesync-core
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

/// How a walk over a diff tree ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStatus {
    /// Every entry was visited
    Finished,
    /// The job switch was found disabled before an entry
    Cancelled,
}

pub use engine::{SyncCoordinator, SyncRunState};
