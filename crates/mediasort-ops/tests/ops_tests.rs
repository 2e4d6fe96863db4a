use async_trait::async_trait;
use mediasort_core::{
    Candidate, CandidateError, CandidateId, FileSnapshot, FilenameResolver, PlaceError,
    ResolveError, ResolvedMatch, Resolver, SortConfig, TemplateFormatter,
};
use mediasort_ops::{CollisionPolicy, Dispatcher, PlaceOutcome, Placer};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn candidate(id: usize, path: &Path) -> Candidate {
    let metadata = fs::metadata(path).unwrap();
    Candidate::new(CandidateId::new(id), path, FileSnapshot::from_metadata(&metadata))
}

fn config_for(temp: &TempDir) -> SortConfig {
    let mut config = SortConfig::new([temp.path().join("in")]);
    config.tv_dir = temp.path().join("tv");
    config.movie_dir = temp.path().join("movies");
    config
}

fn placer(config: &SortConfig) -> Placer {
    Placer::new(config, Arc::new(TemplateFormatter::default()))
}

fn incoming(temp: &TempDir, name: &str, contents: &str) -> PathBuf {
    let dir = temp.path().join("in");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

/// Every file resolves to its own episode; tracks peak concurrency.
struct CountingResolver {
    active: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl CountingResolver {
    fn new() -> Self {
        Self {
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Resolver for CountingResolver {
    async fn resolve(&self, path: &Path) -> Result<ResolvedMatch, ResolveError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let call = self.calls.fetch_add(1, Ordering::SeqCst) as u32;

        tokio::time::sleep(Duration::from_millis(20)).await;
        self.active.fetch_sub(1, Ordering::SeqCst);

        Ok(ResolvedMatch::series(path, "Show", 1, call + 1))
    }
}

/// Resolves everything to the same episode.
struct SameEpisodeResolver;

#[async_trait]
impl Resolver for SameEpisodeResolver {
    async fn resolve(&self, path: &Path) -> Result<ResolvedMatch, ResolveError> {
        Ok(ResolvedMatch::series(path, "Show", 1, 1))
    }
}

/// Takes a long time over every file.
struct SlowResolver {
    calls: AtomicUsize,
}

#[async_trait]
impl Resolver for SlowResolver {
    async fn resolve(&self, path: &Path) -> Result<ResolvedMatch, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(3)).await;
        Ok(ResolvedMatch::series(path, "Show", 1, 1))
    }
}

struct PanickingResolver;

#[async_trait]
impl Resolver for PanickingResolver {
    async fn resolve(&self, path: &Path) -> Result<ResolvedMatch, ResolveError> {
        if path.to_string_lossy().contains("boom") {
            panic!("resolver exploded");
        }
        Ok(ResolvedMatch::series(path, "Show", 1, 1))
    }
}

#[tokio::test]
async fn test_dispatch_respects_concurrency_ceiling() {
    let temp = TempDir::new().unwrap();
    let candidates: Vec<Candidate> = (1..=8)
        .map(|i| candidate(i, &incoming(&temp, &format!("file{i}.mkv"), "x")))
        .collect();

    let mut config = config_for(&temp);
    config.concurrency = 2;
    let resolver = Arc::new(CountingResolver::new());
    let dispatcher = Dispatcher::new(
        &config,
        resolver.clone(),
        Arc::new(TemplateFormatter::default()),
    );

    let summary = dispatcher.dispatch(&candidates, &CancellationToken::new()).await;

    assert_eq!(resolver.calls.load(Ordering::SeqCst), 8);
    assert!(resolver.peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(summary.moved, 8);
    assert_eq!(summary.bytes_moved, 8);
    assert!(summary.is_success());
}

#[tokio::test]
async fn test_failures_are_isolated() {
    let temp = TempDir::new().unwrap();
    let good = incoming(&temp, "Show.Name.S01E02.mkv", "good");
    let bad = incoming(&temp, "holiday.mkv", "bad");
    let candidates = vec![candidate(1, &good), candidate(2, &bad)];

    let config = config_for(&temp);
    let dispatcher = Dispatcher::new(
        &config,
        Arc::new(FilenameResolver::new()),
        Arc::new(TemplateFormatter::default()),
    );
    let summary = dispatcher.dispatch(&candidates, &CancellationToken::new()).await;

    assert_eq!(summary.moved, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.failures[0].id, 2);
    assert_eq!(summary.failures[0].path, bad);
    assert!(bad.exists());
    assert!(
        temp.path()
            .join("tv/Show Name/Season 01/Show Name - S01E02.mkv")
            .is_file()
    );
}

#[tokio::test]
async fn test_panicking_task_counts_as_failure() {
    let temp = TempDir::new().unwrap();
    let ok = incoming(&temp, "fine.mkv", "ok");
    let boom = incoming(&temp, "boom.mkv", "boom");
    let candidates = vec![candidate(1, &ok), candidate(2, &boom)];

    let config = config_for(&temp);
    let dispatcher = Dispatcher::new(
        &config,
        Arc::new(PanickingResolver),
        Arc::new(TemplateFormatter::default()),
    );
    let summary = dispatcher.dispatch(&candidates, &CancellationToken::new()).await;

    assert_eq!(summary.moved, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.failures[0].path, boom);
}

#[tokio::test]
async fn test_existing_destination_without_overwrite() {
    let temp = TempDir::new().unwrap();
    let source = incoming(&temp, "Show.S01E01.mkv", "new contents");
    let destination = temp.path().join("tv/Show/Season 01/Show - S01E01.mkv");
    fs::create_dir_all(destination.parent().unwrap()).unwrap();
    fs::write(&destination, "old").unwrap();

    let config = config_for(&temp);
    let m = ResolvedMatch::series(&source, "Show", 1, 1);
    let err = placer(&config)
        .place(&candidate(1, &source), &m, 1)
        .await
        .unwrap_err();

    assert!(matches!(
        &err,
        CandidateError::Place(PlaceError::AlreadyExists { destination: d }) if d == &destination
    ));
    assert!(err.to_string().contains("try setting --overwrite"));
    assert_eq!(fs::read_to_string(&source).unwrap(), "new contents");
    assert_eq!(fs::read_to_string(&destination).unwrap(), "old");
}

#[tokio::test]
async fn test_overwrite_replaces_destination() {
    let temp = TempDir::new().unwrap();
    let source = incoming(&temp, "Show.S01E01.mkv", "new");
    let destination = temp.path().join("tv/Show/Season 01/Show - S01E01.mkv");
    fs::create_dir_all(destination.parent().unwrap()).unwrap();
    fs::write(&destination, "much older contents").unwrap();

    let mut config = config_for(&temp);
    config.overwrite = true;
    let m = ResolvedMatch::series(&source, "Show", 1, 1);
    let outcome = placer(&config)
        .place(&candidate(1, &source), &m, 1)
        .await
        .unwrap();

    assert!(matches!(outcome, PlaceOutcome::Moved { .. }));
    assert_eq!(fs::read_to_string(&destination).unwrap(), "new");
    assert!(!source.exists());
}

#[tokio::test]
async fn test_overwrite_if_larger() {
    let temp = TempDir::new().unwrap();
    let destination = temp.path().join("tv/Show/Season 01/Show - S01E01.mkv");
    fs::create_dir_all(destination.parent().unwrap()).unwrap();
    fs::write(&destination, "12345").unwrap();

    let mut config = config_for(&temp);
    config.overwrite_if_larger = true;
    let placer = placer(&config);
    assert_eq!(placer.policy(), CollisionPolicy::OverwriteIfLarger);

    // Same size: refused
    let smaller = incoming(&temp, "a.S01E01.mkv", "abcde");
    let m = ResolvedMatch::series(&smaller, "Show", 1, 1);
    let err = placer.place(&candidate(1, &smaller), &m, 2).await.unwrap_err();
    assert!(matches!(
        err,
        CandidateError::Place(PlaceError::AlreadyExists { .. })
    ));
    assert_eq!(fs::read_to_string(&destination).unwrap(), "12345");

    // Strictly larger: replaced
    let larger = incoming(&temp, "b.S01E01.mkv", "abcdefgh");
    let m = ResolvedMatch::series(&larger, "Show", 1, 1);
    placer.place(&candidate(2, &larger), &m, 2).await.unwrap();
    assert_eq!(fs::read_to_string(&destination).unwrap(), "abcdefgh");
}

#[tokio::test]
async fn test_dry_run_never_mutates() {
    let temp = TempDir::new().unwrap();
    let source = incoming(&temp, "Show.S01E01.mkv", "video");
    incoming(&temp, "Show.S01E01.srt", "subs");

    let mut config = config_for(&temp);
    config.dry_run = true;
    let dispatcher = Dispatcher::new(
        &config,
        Arc::new(SameEpisodeResolver),
        Arc::new(TemplateFormatter::default()),
    );
    let summary = dispatcher
        .dispatch(&[candidate(1, &source)], &CancellationToken::new())
        .await;

    assert_eq!(summary.dry_run, 1);
    assert_eq!(summary.moved, 0);
    assert!(source.exists());
    assert!(temp.path().join("in/Show.S01E01.srt").exists());
    assert!(!temp.path().join("tv").exists());
}

#[tokio::test]
async fn test_already_sorted_file_is_left_alone() {
    let temp = TempDir::new().unwrap();
    let destination = temp.path().join("tv/Show/Season 01/Show - S01E01.mkv");
    fs::create_dir_all(destination.parent().unwrap()).unwrap();
    fs::write(&destination, "video").unwrap();

    let config = config_for(&temp);
    let m = ResolvedMatch::series(&destination, "Show", 1, 1);
    let outcome = placer(&config)
        .place(&candidate(1, &destination), &m, 1)
        .await
        .unwrap();

    assert_eq!(outcome, PlaceOutcome::AlreadySorted);
    assert_eq!(fs::read_to_string(&destination).unwrap(), "video");
}

#[tokio::test]
async fn test_subtitle_moves_alongside() {
    let temp = TempDir::new().unwrap();
    let source = incoming(&temp, "Show.Name.S01E02.mkv", "video");
    let subtitle = incoming(&temp, "Show.Name.S01E02.srt", "subs");

    let config = config_for(&temp);
    let m = ResolvedMatch::series(&source, "Show Name", 1, 2);
    let outcome = placer(&config)
        .place(&candidate(1, &source), &m, 1)
        .await
        .unwrap();

    let expected = temp.path().join("tv/Show Name/Season 01/Show Name - S01E02.mkv");
    assert_eq!(
        outcome,
        PlaceOutcome::Moved {
            destination: expected.clone(),
            bytes: 5,
            subtitles: 1,
        }
    );
    assert!(!subtitle.exists());
    assert_eq!(
        fs::read_to_string(expected.with_extension("srt")).unwrap(),
        "subs"
    );
}

#[tokio::test]
async fn test_subtitle_failure_does_not_fail_candidate() {
    let temp = TempDir::new().unwrap();
    let source = incoming(&temp, "Show.S01E01.mkv", "video");
    incoming(&temp, "Show.S01E01.srt", "subs");

    // A directory where the subtitle should land makes its rename fail.
    let destination = temp.path().join("tv/Show/Season 01/Show - S01E01.mkv");
    let blocked = destination.with_extension("srt");
    fs::create_dir_all(&blocked).unwrap();
    fs::write(blocked.join("keep"), "x").unwrap();

    let config = config_for(&temp);
    let m = ResolvedMatch::series(&source, "Show", 1, 1);
    let outcome = placer(&config)
        .place(&candidate(1, &source), &m, 1)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        PlaceOutcome::Moved {
            destination: destination.clone(),
            bytes: 5,
            subtitles: 0,
        }
    );
    assert!(destination.is_file());
    assert!(temp.path().join("in/Show.S01E01.srt").exists());
}

#[tokio::test]
async fn test_same_destination_race_has_one_winner() {
    let temp = TempDir::new().unwrap();
    let candidates = vec![
        candidate(1, &incoming(&temp, "first.mkv", "one")),
        candidate(2, &incoming(&temp, "second.mkv", "two")),
    ];

    let mut config = config_for(&temp);
    config.concurrency = 2;
    let dispatcher = Dispatcher::new(
        &config,
        Arc::new(SameEpisodeResolver),
        Arc::new(TemplateFormatter::default()),
    );
    let summary = dispatcher.dispatch(&candidates, &CancellationToken::new()).await;

    assert_eq!(summary.moved, 1);
    assert_eq!(summary.failed, 1);
    assert!(summary.failures[0].message.contains("File already exists"));
    assert!(
        temp.path()
            .join("tv/Show/Season 01/Show - S01E01.mkv")
            .is_file()
    );
}

#[tokio::test]
async fn test_cancel_mid_dispatch_returns_promptly() {
    let temp = TempDir::new().unwrap();
    let candidates: Vec<Candidate> = (1..=4)
        .map(|i| candidate(i, &incoming(&temp, &format!("file{i}.mkv"), "x")))
        .collect();

    let mut config = config_for(&temp);
    config.concurrency = 1;
    let resolver = Arc::new(SlowResolver {
        calls: AtomicUsize::new(0),
    });
    let dispatcher = Dispatcher::new(
        &config,
        resolver.clone(),
        Arc::new(TemplateFormatter::default()),
    );

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let start = Instant::now();
    let summary = dispatcher.dispatch(&candidates, &token).await;

    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    assert_eq!(summary.cancelled, 4);
    assert_eq!(summary.moved, 0);
    assert!(summary.is_success());
    assert!(candidates.iter().all(|c| c.path.exists()));
}

#[tokio::test]
async fn test_cancelled_token_admits_nothing() {
    let temp = TempDir::new().unwrap();
    let candidates = vec![
        candidate(1, &incoming(&temp, "first.mkv", "one")),
        candidate(2, &incoming(&temp, "second.mkv", "two")),
    ];

    let config = config_for(&temp);
    let resolver = Arc::new(CountingResolver::new());
    let dispatcher = Dispatcher::new(
        &config,
        resolver.clone(),
        Arc::new(TemplateFormatter::default()),
    );

    let token = CancellationToken::new();
    token.cancel();
    let summary = dispatcher.dispatch(&candidates, &token).await;

    assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
    assert_eq!(summary.cancelled, 2);
    assert_eq!(summary.total(), 2);
    assert!(!temp.path().join("tv").exists());
}
