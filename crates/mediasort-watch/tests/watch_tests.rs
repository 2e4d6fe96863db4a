use mediasort_core::WatchError;
use mediasort_watch::{DirWatcher, WatchOutcome};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn poll_watcher() -> DirWatcher {
    DirWatcher::new(Duration::from_millis(10), Some(Duration::from_millis(50)))
}

#[tokio::test]
async fn test_poll_backend_sees_new_file() {
    let temp = TempDir::new().unwrap();
    let dirs = vec![temp.path().to_path_buf()];
    let token = CancellationToken::new();

    let wait = {
        let dirs = dirs.clone();
        let token = token.clone();
        tokio::spawn(async move { poll_watcher().wait(&dirs, &token).await })
    };

    tokio::time::sleep(Duration::from_millis(300)).await;
    fs::write(temp.path().join("Show.S01E01.mkv"), "video").unwrap();

    let outcome = tokio::time::timeout(Duration::from_secs(10), wait)
        .await
        .expect("watcher should observe the change")
        .unwrap()
        .unwrap();
    assert_eq!(outcome, WatchOutcome::Changed);
}

#[tokio::test]
async fn test_cancellation_ends_the_wait() {
    let temp = TempDir::new().unwrap();
    let dirs = vec![temp.path().to_path_buf()];
    let token = CancellationToken::new();

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let outcome = tokio::time::timeout(Duration::from_secs(10), poll_watcher().wait(&dirs, &token))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome, WatchOutcome::Cancelled);
}

#[tokio::test]
async fn test_already_cancelled_token_returns_immediately() {
    let temp = TempDir::new().unwrap();
    let token = CancellationToken::new();
    token.cancel();

    let outcome = poll_watcher()
        .wait(&[temp.path().to_path_buf()], &token)
        .await
        .unwrap();
    assert_eq!(outcome, WatchOutcome::Cancelled);
}

#[tokio::test]
async fn test_missing_directory_fails_to_subscribe() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("gone");
    let dirs: Vec<PathBuf> = vec![temp.path().to_path_buf(), missing.clone()];

    let err = DirWatcher::new(Duration::ZERO, None)
        .wait(&dirs, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, WatchError::Subscribe { path, .. } if path == missing));
}
