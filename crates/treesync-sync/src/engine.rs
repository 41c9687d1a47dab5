//! Sync coordinator
//!
//! The [`SyncCoordinator`] drives one run of a job: it lists the source once
//! and then reconciles each destination in turn.
//!
//! ## Per-destination flow
//!
//! 1. **Prepare**: create the destination root if missing, list it
//! 2. **Compare**: diff source against destination with size checks
//! 3. **Copy**: report kind conflicts, copy missing and changed files
//! 4. **Delete** (mirror only): diff destination against source by name and
//!    delete what the source lacks
//!
//! The job switch is polled before the run, before every destination,
//! between phases and before every entry of a walk. Listing failures abort
//! the run; everything else is reported per file through the sink.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};
use treesync_core::domain::exclude::ExcludeFilter;
use treesync_core::domain::file_tree::FileTree;
use treesync_core::domain::job::{Job, ListSpeed, SyncMethod};
use treesync_core::domain::newtypes::{ensure_disjoint, StoragePath};
use treesync_core::ports::{IOutcomeSink, IStorageClient};

use crate::copy::CopyOrchestrator;
use crate::delete::DeleteOrchestrator;
use crate::diff::{diff, DiffResult};
use crate::{SyncError, WalkStatus};

/// How a sync run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncRunState {
    /// Every destination was processed
    Completed,
    /// The job was disabled before the run could finish
    Cancelled,
}

impl std::fmt::Display for SyncRunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncRunState::Completed => write!(f, "completed"),
            SyncRunState::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// What a run would do to one destination
#[derive(Debug, Clone, Serialize)]
pub struct DestinationPlan {
    pub destination: StoragePath,
    /// Files to copy and kind conflicts
    pub copy: DiffResult,
    /// Files to delete; always empty for add-only jobs
    pub delete: FileTree,
}

/// Top-level driver of a sync run
///
/// ## Dependencies
///
/// - `client`: storage primitives (list, mkdir, copy, delete)
/// - `sink`: receives one outcome per attempted file
pub struct SyncCoordinator {
    client: Arc<dyn IStorageClient>,
    sink: Arc<dyn IOutcomeSink>,
}

impl SyncCoordinator {
    pub fn new(client: Arc<dyn IStorageClient>, sink: Arc<dyn IOutcomeSink>) -> Self {
        Self { client, sink }
    }

    /// Reconciles every destination with `source`
    ///
    /// Destinations are processed in order, one at a time; for each one
    /// the copy pass finishes before the delete pass starts.
    ///
    /// # Errors
    /// Returns [`SyncError::Domain`] for invalid exclude patterns or a
    /// destination overlapping the source,
    /// [`SyncError::Listing`] when a tree cannot be listed and
    /// [`SyncError::CreateDestination`] when a destination root cannot be
    /// created. Outcomes reported before the error stand.
    #[tracing::instrument(
        skip_all,
        fields(job_id = %job.id, source = %source, destinations = destinations.len(), method = %job.method)
    )]
    pub async fn sync(
        &self,
        source: &StoragePath,
        destinations: &[StoragePath],
        job: &Job,
    ) -> Result<SyncRunState, SyncError> {
        let filter = build_filter(job)?;
        ensure_disjoint(source, destinations)?;

        if !job.is_enabled() {
            info!("Job disabled, not starting");
            return Ok(SyncRunState::Cancelled);
        }

        let start = Instant::now();
        info!("Starting sync run");

        let src_tree = self
            .list(source, ListSpeed::default(), filter.as_ref())
            .await?;
        info!(
            files = src_tree.file_count(),
            bytes = src_tree.total_size(),
            "Listed source"
        );

        for destination in destinations {
            if !job.is_enabled() {
                info!(destination = %destination, "Job disabled, stopping before destination");
                return Ok(SyncRunState::Cancelled);
            }

            let state = self
                .sync_destination(source, &src_tree, destination, job, filter.as_ref())
                .await?;
            if state == SyncRunState::Cancelled {
                info!(destination = %destination, "Job disabled, run cancelled");
                return Ok(SyncRunState::Cancelled);
            }
        }

        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Sync run completed"
        );
        Ok(SyncRunState::Completed)
    }

    /// Computes what [`sync`](Self::sync) would do, without changing anything
    ///
    /// Unlike a real run, a missing destination root is not created, so
    /// listing it fails.
    ///
    /// # Errors
    /// Same as [`sync`](Self::sync).
    #[tracing::instrument(skip_all, fields(job_id = %job.id, source = %source))]
    pub async fn plan(
        &self,
        source: &StoragePath,
        destinations: &[StoragePath],
        job: &Job,
    ) -> Result<Vec<DestinationPlan>, SyncError> {
        let filter = build_filter(job)?;
        ensure_disjoint(source, destinations)?;
        let src_tree = self
            .list(source, ListSpeed::default(), filter.as_ref())
            .await?;

        let mut plans = Vec::with_capacity(destinations.len());
        for destination in destinations {
            let dst_tree = self.list(destination, job.speed, filter.as_ref()).await?;
            let copy = diff(&src_tree, &dst_tree, true);
            let delete = match job.method {
                SyncMethod::Mirror => diff(&dst_tree, &src_tree, false).tree,
                SyncMethod::AddOnly => FileTree::new(),
            };
            plans.push(DestinationPlan {
                destination: destination.clone(),
                copy,
                delete,
            });
        }
        Ok(plans)
    }

    async fn sync_destination(
        &self,
        source: &StoragePath,
        src_tree: &FileTree,
        destination: &StoragePath,
        job: &Job,
        filter: Option<&ExcludeFilter>,
    ) -> Result<SyncRunState, SyncError> {
        self.client
            .make_directory(destination)
            .await
            .map_err(|source| SyncError::CreateDestination {
                path: destination.clone(),
                source,
            })?;

        let dst_tree = self.list(destination, job.speed, filter).await?;

        let forward = diff(src_tree, &dst_tree, true);
        info!(
            destination = %destination,
            files = forward.tree.file_count(),
            bytes = forward.tree.total_size(),
            conflicts = forward.conflicts.len(),
            "Computed copy set"
        );
        if !job.is_enabled() {
            return Ok(SyncRunState::Cancelled);
        }

        let copier =
            CopyOrchestrator::new(self.client.as_ref(), self.sink.as_ref()).with_switch(&job.switch);
        if copier
            .report_conflicts(source, destination, &forward.conflicts)
            .await
            == WalkStatus::Cancelled
        {
            return Ok(SyncRunState::Cancelled);
        }
        if copier.copy(source, destination, &forward.tree).await == WalkStatus::Cancelled {
            return Ok(SyncRunState::Cancelled);
        }

        if job.method == SyncMethod::Mirror {
            if !job.is_enabled() {
                return Ok(SyncRunState::Cancelled);
            }

            let reverse = diff(&dst_tree, src_tree, false);
            info!(
                destination = %destination,
                files = reverse.tree.file_count(),
                "Computed delete set"
            );
            let deleter = DeleteOrchestrator::new(self.client.as_ref(), self.sink.as_ref())
                .with_switch(&job.switch);
            if deleter.delete(destination, &reverse.tree).await == WalkStatus::Cancelled {
                return Ok(SyncRunState::Cancelled);
            }
        }

        Ok(SyncRunState::Completed)
    }

    async fn list(
        &self,
        root: &StoragePath,
        speed: ListSpeed,
        filter: Option<&ExcludeFilter>,
    ) -> Result<FileTree, SyncError> {
        let tree = self
            .client
            .list_tree(root, speed, filter)
            .await
            .map_err(|source| SyncError::Listing {
                path: root.clone(),
                source,
            })?;
        debug!(root = %root, speed = %speed, entries = tree.len(), "Listed tree");
        Ok(tree)
    }
}

/// Compiles the job's exclude patterns; `None` when there is nothing to apply
fn build_filter(job: &Job) -> Result<Option<ExcludeFilter>, SyncError> {
    let Some(patterns) = job.exclude_patterns.as_deref() else {
        return Ok(None);
    };
    let filter = ExcludeFilter::parse(patterns)?;
    Ok((!filter.is_empty()).then_some(filter))
}
