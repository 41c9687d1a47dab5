//! Delete pass
//!
//! Walks a reverse diff tree (destination entries absent from the source)
//! and deletes the files it names. Directories are descended into but never
//! removed themselves.

use std::future::Future;
use std::pin::Pin;

use tracing::{debug, warn};
use treesync_core::domain::file_tree::{FileTree, Node};
use treesync_core::domain::job::JobSwitch;
use treesync_core::domain::newtypes::StoragePath;
use treesync_core::domain::outcome::DeleteOutcome;
use treesync_core::ports::{IOutcomeSink, IStorageClient};

use crate::WalkStatus;

type WalkFuture<'a> = Pin<Box<dyn Future<Output = WalkStatus> + Send + 'a>>;

/// Issues delete calls for a reverse diff tree, one file per call
pub struct DeleteOrchestrator<'a> {
    client: &'a dyn IStorageClient,
    sink: &'a dyn IOutcomeSink,
    switch: Option<&'a JobSwitch>,
}

impl<'a> DeleteOrchestrator<'a> {
    pub fn new(client: &'a dyn IStorageClient, sink: &'a dyn IOutcomeSink) -> Self {
        Self {
            client,
            sink,
            switch: None,
        }
    }

    #[must_use]
    pub fn with_switch(mut self, switch: &'a JobSwitch) -> Self {
        self.switch = Some(switch);
        self
    }

    fn cancelled(&self) -> bool {
        self.switch.is_some_and(|switch| !switch.is_enabled())
    }

    /// Deletes every file of `tree` below `dst_root`
    pub async fn delete(&self, dst_root: &StoragePath, tree: &FileTree) -> WalkStatus {
        self.walk(dst_root.clone(), tree).await
    }

    fn walk<'b>(&'b self, dst: StoragePath, tree: &'b FileTree) -> WalkFuture<'b>
    where
        'a: 'b,
    {
        Box::pin(async move {
            for (name, node) in tree.iter() {
                if self.cancelled() {
                    debug!(dir = %dst, "Job disabled, stopping delete walk");
                    return WalkStatus::Cancelled;
                }

                match node {
                    Node::Directory(child) => match dst.join(name) {
                        Ok(dst_child) => {
                            if self.walk(dst_child, child).await == WalkStatus::Cancelled {
                                return WalkStatus::Cancelled;
                            }
                        }
                        Err(e) => {
                            warn!(dir = %dst, entry = name, error = %e, "Cannot descend into directory");
                            for (relative, size) in child.files() {
                                let entry = format!("{name}/{relative}");
                                self.sink
                                    .on_delete(DeleteOutcome::failed(
                                        &dst,
                                        &entry,
                                        size,
                                        e.to_string(),
                                    ))
                                    .await;
                            }
                        }
                    },
                    Node::File { size } => {
                        let names = [name.to_string()];
                        let outcome = match self.client.delete_files(&dst, &names).await {
                            Ok(()) => {
                                debug!(dir = %dst, entry = name, "Deleted");
                                DeleteOutcome::succeeded(&dst, name, *size)
                            }
                            Err(e) => {
                                warn!(dir = %dst, entry = name, error = %e, "Delete failed");
                                DeleteOutcome::failed(&dst, name, *size, format!("{e:#}"))
                            }
                        };
                        self.sink.on_delete(outcome).await;
                    }
                }
            }

            WalkStatus::Finished
        })
    }
}
