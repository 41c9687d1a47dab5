//! Integration test: SyncCoordinator → LocalStorageClient → real directories
//!
//! Runs mirror and add-only jobs over temporary directories and checks the
//! resulting files on disk.

use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;
use treesync_core::domain::{ExcludeFilter, Job, ListSpeed, StoragePath, SyncMethod};
use treesync_core::ports::{IOutcomeSink, IStorageClient};
use treesync_sync::diff::diff;
use treesync_sync::filesystem::LocalStorageClient;
use treesync_sync::sink::{ChannelOutcomeSink, OutcomeCollector, OutcomeEvent};
use treesync_core::domain::DomainError;
use treesync_sync::{SyncCoordinator, SyncError, SyncRunState};

fn write(root: &Path, relative: &str, content: &[u8]) {
    let full = root.join(relative);
    std::fs::create_dir_all(full.parent().unwrap()).unwrap();
    std::fs::write(full, content).unwrap();
}

fn path(p: &str) -> StoragePath {
    StoragePath::new(p).unwrap()
}

fn seed(root: &Path) {
    write(root, "src/a.txt", b"0123456789");
    write(root, "src/sub/b.txt", b"twenty bytes of data");
    write(root, "src/notes.tmp", b"scratch");
    write(root, "dst/a.txt", b"01234567890");
    write(root, "dst/c.txt", b"stale");
    std::fs::create_dir_all(root.join("dst/sub")).unwrap();
}

#[tokio::test]
async fn test_local_mirror_run() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());

    let client = Arc::new(LocalStorageClient::new(dir.path()));
    let collector = Arc::new(OutcomeCollector::new());
    let coordinator = SyncCoordinator::new(
        Arc::clone(&client) as Arc<dyn IStorageClient>,
        Arc::clone(&collector) as Arc<dyn IOutcomeSink>,
    );
    let job = Job::new(SyncMethod::Mirror).with_exclude("*.tmp");

    let state = coordinator
        .sync(&path("/src"), &[path("/dst")], &job)
        .await
        .unwrap();
    assert_eq!(state, SyncRunState::Completed);

    let root = dir.path();
    assert_eq!(std::fs::read(root.join("dst/a.txt")).unwrap(), b"0123456789");
    assert_eq!(
        std::fs::read(root.join("dst/sub/b.txt")).unwrap(),
        b"twenty bytes of data"
    );
    assert!(!root.join("dst/c.txt").exists());
    assert!(!root.join("dst/notes.tmp").exists());

    // Nothing left to do once converged.
    let filter = ExcludeFilter::parse("*.tmp").unwrap();
    let src = client
        .list_tree(&path("/src"), ListSpeed::Standard, Some(&filter))
        .await
        .unwrap();
    let dst = client
        .list_tree(&path("/dst"), ListSpeed::Standard, Some(&filter))
        .await
        .unwrap();
    assert!(diff(&src, &dst, true).is_empty());
    assert!(diff(&dst, &src, false).is_empty());

    let summary = collector.summary();
    assert_eq!(summary.copies_succeeded, 2);
    assert_eq!(summary.deletes_succeeded, 1);
    assert_eq!(summary.failures(), 0);
}

#[tokio::test]
async fn test_local_add_only_into_new_destination_streams_outcomes() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());

    let client = Arc::new(LocalStorageClient::new(dir.path()));
    let (sink, mut rx) = ChannelOutcomeSink::channel(16);
    let coordinator = SyncCoordinator::new(
        client as Arc<dyn IStorageClient>,
        Arc::new(sink) as Arc<dyn IOutcomeSink>,
    );

    let run = tokio::spawn(async move {
        coordinator
            .sync(&path("/src"), &[path("/backup/new")], &Job::default())
            .await
    });

    let mut copied = Vec::new();
    while let Some(event) = rx.recv().await {
        match event {
            OutcomeEvent::Copy(outcome) => copied.push(outcome.dst_path()),
            OutcomeEvent::Delete(outcome) => panic!("unexpected delete: {outcome:?}"),
        }
    }

    assert_eq!(run.await.unwrap().unwrap(), SyncRunState::Completed);
    assert_eq!(
        copied,
        vec![
            "/backup/new/a.txt",
            "/backup/new/notes.tmp",
            "/backup/new/sub/b.txt"
        ]
    );
    assert!(dir.path().join("backup/new/sub/b.txt").is_file());
}

#[tokio::test]
async fn test_mirror_into_nested_destination_is_refused() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a/top.txt", b"top");
    write(dir.path(), "a/sub/keep.txt", b"keep");

    let client = Arc::new(LocalStorageClient::new(dir.path()));
    let collector = Arc::new(OutcomeCollector::new());
    let coordinator = SyncCoordinator::new(
        Arc::clone(&client) as Arc<dyn IStorageClient>,
        Arc::clone(&collector) as Arc<dyn IOutcomeSink>,
    );

    let err = coordinator
        .sync(&path("/a"), &[path("/a/sub")], &Job::new(SyncMethod::Mirror))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SyncError::Domain(DomainError::OverlappingPaths { .. })
    ));
    assert!(dir.path().join("a/sub/keep.txt").exists());
    assert!(collector.copies().is_empty());
    assert!(collector.deletes().is_empty());
}
