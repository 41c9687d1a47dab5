//! Copy pass
//!
//! Walks a forward diff tree and copies every file it names from the source
//! root to the destination root, one storage call at a time.

use std::future::Future;
use std::pin::Pin;

use tracing::{debug, warn};
use treesync_core::domain::file_tree::{FileTree, Node};
use treesync_core::domain::job::JobSwitch;
use treesync_core::domain::newtypes::StoragePath;
use treesync_core::domain::outcome::CopyOutcome;
use treesync_core::ports::{IOutcomeSink, IStorageClient};

use crate::diff::KindConflict;
use crate::WalkStatus;

type WalkFuture<'a> = Pin<Box<dyn Future<Output = WalkStatus> + Send + 'a>>;

/// Issues copy calls for a diff tree and reports one outcome per file
///
/// Directory creation happens lazily: the destination directory of a level
/// is created right before the first file copied into it. A failed creation
/// fails that file and is retried for the next one.
pub struct CopyOrchestrator<'a> {
    client: &'a dyn IStorageClient,
    sink: &'a dyn IOutcomeSink,
    switch: Option<&'a JobSwitch>,
}

impl<'a> CopyOrchestrator<'a> {
    pub fn new(client: &'a dyn IStorageClient, sink: &'a dyn IOutcomeSink) -> Self {
        Self {
            client,
            sink,
            switch: None,
        }
    }

    /// Stops the walk once `switch` is disabled
    #[must_use]
    pub fn with_switch(mut self, switch: &'a JobSwitch) -> Self {
        self.switch = Some(switch);
        self
    }

    fn cancelled(&self) -> bool {
        self.switch.is_some_and(|switch| !switch.is_enabled())
    }

    /// Copies every file of `tree` from `src_root` to `dst_root`
    ///
    /// Per-file failures are reported through the sink and never stop the
    /// walk; only a disabled job does.
    pub async fn copy(
        &self,
        src_root: &StoragePath,
        dst_root: &StoragePath,
        tree: &FileTree,
    ) -> WalkStatus {
        self.walk(src_root.clone(), dst_root.clone(), tree).await
    }

    /// Reports each kind conflict as a failed copy
    ///
    /// Polls the switch before every conflict like the copy walk does.
    pub async fn report_conflicts(
        &self,
        src_root: &StoragePath,
        dst_root: &StoragePath,
        conflicts: &[KindConflict],
    ) -> WalkStatus {
        for conflict in conflicts {
            if self.cancelled() {
                debug!(dir = %src_root, "Job disabled, stopping conflict report");
                return WalkStatus::Cancelled;
            }
            let message = format!(
                "Entry kind mismatch: {} in source, {} in destination",
                conflict.source_kind, conflict.dest_kind
            );
            let outcome = match (
                src_root.join_all(&conflict.dirs),
                dst_root.join_all(&conflict.dirs),
            ) {
                (Ok(src_dir), Ok(dst_dir)) => CopyOutcome::failed(
                    &src_dir,
                    &dst_dir,
                    &conflict.name,
                    conflict.source_size,
                    message,
                ),
                _ => CopyOutcome::failed(
                    src_root,
                    dst_root,
                    &conflict.relative_path(),
                    conflict.source_size,
                    message,
                ),
            };
            warn!(
                path = %outcome.src_path(),
                source_kind = %conflict.source_kind,
                dest_kind = %conflict.dest_kind,
                "Skipping entry with mismatched kind"
            );
            self.sink.on_copy(outcome).await;
        }
        WalkStatus::Finished
    }

    fn walk<'b>(&'b self, src: StoragePath, dst: StoragePath, tree: &'b FileTree) -> WalkFuture<'b>
    where
        'a: 'b,
    {
        Box::pin(async move {
            let mut dir_ready = false;

            for (name, node) in tree.iter() {
                if self.cancelled() {
                    debug!(dir = %src, "Job disabled, stopping copy walk");
                    return WalkStatus::Cancelled;
                }

                match node {
                    Node::Directory(child) => {
                        let (src_child, dst_child) = match (src.join(name), dst.join(name)) {
                            (Ok(s), Ok(d)) => (s, d),
                            (Err(e), _) | (_, Err(e)) => {
                                self.fail_subtree(&src, &dst, name, child, &e.to_string())
                                    .await;
                                continue;
                            }
                        };
                        if self.walk(src_child, dst_child, child).await == WalkStatus::Cancelled {
                            return WalkStatus::Cancelled;
                        }
                    }
                    Node::File { size } => {
                        if !dir_ready {
                            match self.client.make_directory(&dst).await {
                                Ok(()) => dir_ready = true,
                                Err(e) => {
                                    warn!(dir = %dst, error = %e, "Failed to create destination directory");
                                    self.sink
                                        .on_copy(CopyOutcome::failed(
                                            &src,
                                            &dst,
                                            name,
                                            *size,
                                            format!("{e:#}"),
                                        ))
                                        .await;
                                    continue;
                                }
                            }
                        }
                        self.copy_one(&src, &dst, name, *size).await;
                    }
                }
            }

            WalkStatus::Finished
        })
    }

    async fn copy_one(&self, src: &StoragePath, dst: &StoragePath, name: &str, size: u64) {
        let outcome = match self.client.copy_file(src, dst, name).await {
            Ok(Some(task_id)) => {
                debug!(src = %src, dst = %dst, entry = name, task_id = %task_id, "Copy submitted");
                CopyOutcome::submitted(src, dst, name, size, task_id)
            }
            Ok(None) => {
                debug!(src = %src, dst = %dst, entry = name, "Copy completed");
                CopyOutcome::succeeded(src, dst, name, size)
            }
            Err(e) => {
                warn!(src = %src, dst = %dst, entry = name, error = %e, "Copy failed");
                CopyOutcome::failed(src, dst, name, size, format!("{e:#}"))
            }
        };
        self.sink.on_copy(outcome).await;
    }

    /// Fails every file below a directory whose name cannot form a path
    async fn fail_subtree(
        &self,
        src: &StoragePath,
        dst: &StoragePath,
        name: &str,
        child: &FileTree,
        message: &str,
    ) {
        warn!(dir = %src, entry = name, error = message, "Cannot descend into directory");
        for (relative, size) in child.files() {
            let entry = format!("{name}/{relative}");
            self.sink
                .on_copy(CopyOutcome::failed(src, dst, &entry, size, message))
                .await;
        }
    }
}
