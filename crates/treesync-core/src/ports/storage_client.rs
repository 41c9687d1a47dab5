//! Storage client port (driven/secondary port)
//!
//! This module defines the interface the sync engine uses to reach a storage
//! backend. The primary target is a cloud-drive aggregation service where one
//! API fronts many providers, but the trait makes no assumption about
//! transport; the workspace ships a local filesystem adapter.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are adapter-specific
//!   and don't need domain-level classification.
//! - Uses `#[async_trait]` for async trait methods.
//! - Retries and timeouts belong to the implementation; the engine calls
//!   each method once per entry.

use crate::domain::exclude::ExcludeFilter;
use crate::domain::file_tree::FileTree;
use crate::domain::job::ListSpeed;
use crate::domain::newtypes::{StoragePath, TaskId};

/// Port trait for storage backend operations
///
/// All directory arguments are [`StoragePath`]s, which always end with `/`.
/// File arguments are bare entry names inside such a directory.
#[async_trait::async_trait]
pub trait IStorageClient: Send + Sync {
    /// Lists the full tree below `root`
    ///
    /// Entries for which `filter` reports exclusion (paths relative to
    /// `root`) must be left out, and excluded directories must not be
    /// descended into.
    ///
    /// # Arguments
    /// * `root` - Directory to list
    /// * `speed` - Opaque pacing/caching hint
    /// * `filter` - Exclude rules, if the job has any
    async fn list_tree(
        &self,
        root: &StoragePath,
        speed: ListSpeed,
        filter: Option<&ExcludeFilter>,
    ) -> anyhow::Result<FileTree>;

    /// Creates `path` and any missing parents
    ///
    /// Must succeed when the directory already exists.
    async fn make_directory(&self, path: &StoragePath) -> anyhow::Result<()>;

    /// Copies `src_dir/name` into `dst_dir`, overwriting a same-name file
    ///
    /// # Returns
    /// `Some(task_id)` when the backend accepted the copy as an asynchronous
    /// task, `None` when the copy completed before returning.
    async fn copy_file(
        &self,
        src_dir: &StoragePath,
        dst_dir: &StoragePath,
        name: &str,
    ) -> anyhow::Result<Option<TaskId>>;

    /// Deletes the named files from `dir`
    async fn delete_files(&self, dir: &StoragePath, names: &[String]) -> anyhow::Result<()>;
}
