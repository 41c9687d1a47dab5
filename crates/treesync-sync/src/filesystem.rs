//! Local filesystem storage adapter (secondary/driven adapter)
//!
//! Implements [`IStorageClient`] over a local directory using `tokio::fs`.
//! Storage paths are resolved below a fixed root, so `/photos/` maps to
//! `<root>/photos`.
//!
//! ## Design Decisions
//!
//! - **Synchronous copies**: every copy completes before the call returns,
//!   so no task id is ever produced.
//! - **Atomic writes**: copies go to a temporary file next to the target and
//!   are renamed into place.
//! - **Pruned listings**: excluded directories are never read.
//! - **No symlinks**: links are skipped, so a link to an ancestor cannot
//!   make a listing recurse.
//! - **Speed hint**: ignored; local listings have no cost tiers.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use anyhow::Context;
use tracing::{debug, instrument, warn};
use treesync_core::domain::exclude::ExcludeFilter;
use treesync_core::domain::file_tree::FileTree;
use treesync_core::domain::job::ListSpeed;
use treesync_core::domain::newtypes::{validate_entry_name, StoragePath, TaskId};
use treesync_core::ports::IStorageClient;

type ListFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<FileTree>> + Send + 'a>>;

/// Suffix of in-progress copies
const TEMP_SUFFIX: &str = ".treesync-part";

/// Storage client backed by a local directory
#[derive(Debug, Clone)]
pub struct LocalStorageClient {
    root: PathBuf,
}

impl LocalStorageClient {
    /// Create a client rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The local directory backing `/`
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a storage directory onto the local filesystem
    fn resolve(&self, path: &StoragePath) -> PathBuf {
        let mut local = self.root.clone();
        for component in path.components() {
            local.push(component);
        }
        local
    }

    fn resolve_entry(&self, dir: &StoragePath, name: &str) -> anyhow::Result<PathBuf> {
        validate_entry_name(name)?;
        Ok(self.resolve(dir).join(name))
    }

    fn walk<'a>(
        &'a self,
        dir: PathBuf,
        relative: String,
        filter: Option<&'a ExcludeFilter>,
    ) -> ListFuture<'a> {
        Box::pin(async move {
            let mut tree = FileTree::new();
            let mut entries = tokio::fs::read_dir(&dir)
                .await
                .with_context(|| format!("Failed to read directory: {}", dir.display()))?;

            while let Some(entry) = entries.next_entry().await? {
                let Ok(name) = entry.file_name().into_string() else {
                    warn!(path = ?entry.path(), "Skipping entry with non UTF-8 name");
                    continue;
                };
                if name.ends_with(TEMP_SUFFIX) {
                    continue;
                }

                // Symlinks are not followed.
                let metadata = match entry.metadata().await {
                    Ok(metadata) => metadata,
                    Err(e) => {
                        warn!(path = ?entry.path(), error = %e, "Skipping unreadable entry");
                        continue;
                    }
                };
                if metadata.file_type().is_symlink() {
                    debug!(path = ?entry.path(), "Skipping symlink");
                    continue;
                }

                let entry_relative = if relative.is_empty() {
                    name.clone()
                } else {
                    format!("{relative}/{name}")
                };
                if filter.is_some_and(|f| f.is_excluded(&entry_relative, metadata.is_dir())) {
                    debug!(path = %entry_relative, "Excluded");
                    continue;
                }

                if metadata.is_dir() {
                    let child = self.walk(entry.path(), entry_relative, filter).await?;
                    tree.insert_dir(name, child);
                } else if metadata.is_file() {
                    tree.insert_file(name, metadata.len());
                }
            }

            Ok(tree)
        })
    }
}

#[async_trait::async_trait]
impl IStorageClient for LocalStorageClient {
    #[instrument(skip(self, filter), fields(root = %root))]
    async fn list_tree(
        &self,
        root: &StoragePath,
        speed: ListSpeed,
        filter: Option<&ExcludeFilter>,
    ) -> anyhow::Result<FileTree> {
        let local = self.resolve(root);
        let metadata = tokio::fs::metadata(&local)
            .await
            .with_context(|| format!("Cannot list {root}: {} is not accessible", local.display()))?;
        if !metadata.is_dir() {
            anyhow::bail!("Cannot list {root}: {} is not a directory", local.display());
        }

        let tree = self.walk(local, String::new(), filter).await?;
        debug!(files = tree.file_count(), "listing complete");
        Ok(tree)
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn make_directory(&self, path: &StoragePath) -> anyhow::Result<()> {
        let local = self.resolve(path);
        tokio::fs::create_dir_all(&local)
            .await
            .with_context(|| format!("Failed to create directory: {}", local.display()))?;
        Ok(())
    }

    #[instrument(skip(self), fields(src = %src_dir, dst = %dst_dir))]
    async fn copy_file(
        &self,
        src_dir: &StoragePath,
        dst_dir: &StoragePath,
        name: &str,
    ) -> anyhow::Result<Option<TaskId>> {
        let source = self.resolve_entry(src_dir, name)?;
        let target = self.resolve_entry(dst_dir, name)?;

        let tmp_path = {
            let mut p = target.as_os_str().to_owned();
            p.push(TEMP_SUFFIX);
            PathBuf::from(p)
        };

        let bytes = tokio::fs::copy(&source, &tmp_path)
            .await
            .with_context(|| format!("Failed to copy {}", source.display()))?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &target).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(anyhow::Error::new(e)
                .context(format!("Failed to move copy into place: {}", target.display())));
        }

        debug!(bytes, "copy complete");
        Ok(None)
    }

    #[instrument(skip(self), fields(dir = %dir))]
    async fn delete_files(&self, dir: &StoragePath, names: &[String]) -> anyhow::Result<()> {
        for name in names {
            let path = self.resolve_entry(dir, name)?;
            tokio::fs::remove_file(&path)
                .await
                .with_context(|| format!("Failed to delete {}", path.display()))?;
        }
        debug!(count = names.len(), "delete complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;
    use treesync_core::domain::file_tree::Node;

    use super::*;

    fn path(p: &str) -> StoragePath {
        StoragePath::new(p).unwrap()
    }

    fn write(dir: &TempDir, relative: &str, content: &[u8]) {
        let full = dir.path().join(relative);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, content).unwrap();
    }

    // ------------------------------------------------------------------
    // list_tree
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_list_tree_reports_sizes_and_nesting() {
        let dir = TempDir::new().unwrap();
        write(&dir, "src/a.txt", b"0123456789");
        write(&dir, "src/sub/b.txt", b"xy");
        std::fs::create_dir_all(dir.path().join("src/empty")).unwrap();

        let client = LocalStorageClient::new(dir.path());
        let tree = client
            .list_tree(&path("/src"), ListSpeed::Standard, None)
            .await
            .unwrap();

        let expected = FileTree::new()
            .with_file("a.txt", 10)
            .with_dir("empty", FileTree::new())
            .with_dir("sub", FileTree::new().with_file("b.txt", 2));
        assert_eq!(tree, expected);
    }

    #[tokio::test]
    async fn test_list_tree_applies_filter_relative_to_listing_root() {
        let dir = TempDir::new().unwrap();
        write(&dir, "src/keep.txt", b"k");
        write(&dir, "src/skip.tmp", b"s");
        write(&dir, "src/cache/blob", b"c");
        write(&dir, "src/deep/build/out.o", b"o");
        write(&dir, "src/build/out.o", b"o");

        let filter = ExcludeFilter::parse("*.tmp:cache/:/build").unwrap();
        let client = LocalStorageClient::new(dir.path());
        let tree = client
            .list_tree(&path("/src"), ListSpeed::Fast, Some(&filter))
            .await
            .unwrap();

        assert!(tree.get("keep.txt").is_some());
        assert!(tree.get("skip.tmp").is_none());
        assert!(tree.get("cache").is_none());
        assert!(tree.get("build").is_none());
        match tree.get("deep") {
            Some(Node::Directory(deep)) => assert!(deep.get("build").is_some()),
            other => panic!("unexpected node: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_tree_missing_root_is_error() {
        let dir = TempDir::new().unwrap();
        let client = LocalStorageClient::new(dir.path());
        let result = client
            .list_tree(&path("/nope"), ListSpeed::Standard, None)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_list_tree_root_that_is_a_file_is_error() {
        let dir = TempDir::new().unwrap();
        write(&dir, "file", b"x");
        let client = LocalStorageClient::new(dir.path());
        let err = client
            .list_tree(&path("/file"), ListSpeed::Standard, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    // ------------------------------------------------------------------
    // make_directory / copy_file / delete_files
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_make_directory_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let client = LocalStorageClient::new(dir.path());
        client.make_directory(&path("/a/b/c")).await.unwrap();
        client.make_directory(&path("/a/b/c")).await.unwrap();
        assert!(dir.path().join("a/b/c").is_dir());
    }

    #[tokio::test]
    async fn test_copy_file_completes_synchronously() {
        let dir = TempDir::new().unwrap();
        write(&dir, "src/a.txt", b"hello");
        let client = LocalStorageClient::new(dir.path());
        client.make_directory(&path("/dst")).await.unwrap();

        let task = client
            .copy_file(&path("/src"), &path("/dst"), "a.txt")
            .await
            .unwrap();

        assert!(task.is_none());
        assert_eq!(std::fs::read(dir.path().join("dst/a.txt")).unwrap(), b"hello");
        assert!(!dir.path().join("dst/a.txt.treesync-part").exists());
    }

    #[tokio::test]
    async fn test_copy_file_overwrites_existing() {
        let dir = TempDir::new().unwrap();
        write(&dir, "src/a.txt", b"new content");
        write(&dir, "dst/a.txt", b"old");
        let client = LocalStorageClient::new(dir.path());

        client
            .copy_file(&path("/src"), &path("/dst"), "a.txt")
            .await
            .unwrap();
        assert_eq!(
            std::fs::read(dir.path().join("dst/a.txt")).unwrap(),
            b"new content"
        );
    }

    #[tokio::test]
    async fn test_copy_missing_source_is_error() {
        let dir = TempDir::new().unwrap();
        let client = LocalStorageClient::new(dir.path());
        client.make_directory(&path("/dst")).await.unwrap();
        let result = client
            .copy_file(&path("/src"), &path("/dst"), "ghost.txt")
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_entry_names_cannot_escape_directory() {
        let dir = TempDir::new().unwrap();
        let client = LocalStorageClient::new(dir.path());
        assert!(client
            .copy_file(&path("/src"), &path("/dst"), "../etc")
            .await
            .is_err());
        assert!(client
            .delete_files(&path("/dst"), &["a/b".to_string()])
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_delete_files_removes_only_named_files() {
        let dir = TempDir::new().unwrap();
        write(&dir, "dst/a.txt", b"a");
        write(&dir, "dst/b.txt", b"b");
        let client = LocalStorageClient::new(dir.path());

        client
            .delete_files(&path("/dst"), &["a.txt".to_string()])
            .await
            .unwrap();

        assert!(!dir.path().join("dst/a.txt").exists());
        assert!(dir.path().join("dst/b.txt").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_list_tree_skips_symlinks() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir(&src).unwrap();
        std::fs::write(src.join("f.txt"), b"data").unwrap();
        std::os::unix::fs::symlink(&src, src.join("loop")).unwrap();
        std::os::unix::fs::symlink(src.join("f.txt"), src.join("alias.txt")).unwrap();

        let client = LocalStorageClient::new(dir.path());
        let tree = client
            .list_tree(&path("/src"), ListSpeed::Standard, None)
            .await
            .unwrap();

        assert_eq!(tree.file_count(), 1);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get("f.txt"), Some(&Node::File { size: 4 }));
    }
}
