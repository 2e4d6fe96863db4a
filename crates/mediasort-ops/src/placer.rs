//! Moves a resolved candidate into the canonical tree.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use mediasort_core::{
    Candidate, CandidateError, MediaType, PathFormatter, PlaceError, ResolvedMatch, SortConfig,
};

use crate::conflict::CollisionPolicy;

/// The successful outcome of placing one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceOutcome {
    /// The file was moved.
    Moved {
        destination: PathBuf,
        bytes: u64,
        /// Companion subtitle files moved alongside.
        subtitles: usize,
    },
    /// The file already sits at its destination.
    AlreadySorted,
    /// Dry run: the file would have moved here.
    DryRun { destination: PathBuf },
}

/// Relocates candidates (and their subtitles) to formatted destinations.
///
/// Collision check, directory creation and the move itself run on the
/// blocking pool while holding a lock keyed by destination, so two
/// candidates that format to the same path are serialized.
pub struct Placer {
    formatter: Arc<dyn PathFormatter>,
    policy: CollisionPolicy,
    tv_dir: PathBuf,
    movie_dir: PathBuf,
    subtitle_extensions: Arc<[String]>,
    dry_run: bool,
    /// One lock per destination with a placement in progress. An entry is
    /// removed by the last placement holding it.
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl Placer {
    /// Create a placer for the given configuration.
    ///
    /// Base directories are made absolute against the current directory.
    pub fn new(config: &SortConfig, formatter: Arc<dyn PathFormatter>) -> Self {
        Self {
            formatter,
            policy: CollisionPolicy::from_config(config),
            tv_dir: absolute(&config.tv_dir),
            movie_dir: absolute(&config.movie_dir),
            subtitle_extensions: config.subtitle_extensions.clone().into(),
            dry_run: config.dry_run,
            locks: DashMap::new(),
        }
    }

    /// The active collision policy.
    pub fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    /// Compute the absolute destination for a match.
    pub fn destination(&self, matched: &ResolvedMatch) -> Result<PathBuf, CandidateError> {
        let base = match matched.media_type {
            MediaType::Series => &self.tv_dir,
            MediaType::Movie => &self.movie_dir,
            other => {
                return Err(PlaceError::UnsupportedMediaType { media_type: other }.into());
            }
        };
        Ok(base.join(self.formatter.format(matched)?))
    }

    /// Place one candidate. `total` is only used for the progress line.
    pub async fn place(
        &self,
        candidate: &Candidate,
        matched: &ResolvedMatch,
        total: usize,
    ) -> Result<PlaceOutcome, CandidateError> {
        let destination = self.destination(matched)?;
        let source = candidate.path.clone();

        info!(
            "[{}/{}] {}\n  └─> {}",
            candidate.id,
            total,
            source.display(),
            destination.display()
        );

        if same_location(&source, &destination).await {
            debug!(path = %source.display(), "already sorted");
            return Ok(PlaceOutcome::AlreadySorted);
        }

        if self.dry_run {
            return Ok(PlaceOutcome::DryRun { destination });
        }

        let key = destination.clone();
        let lock = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = Arc::clone(&lock).lock_owned().await;

        let job = MoveJob {
            source,
            destination,
            incoming_size: candidate.size(),
            policy: self.policy,
            subtitle_extensions: Arc::clone(&self.subtitle_extensions),
        };

        let joined = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            job.run()
        })
        .await;

        // Only the map and `lock` left means nobody else is waiting.
        self.locks.remove_if(&key, |_, entry| Arc::strong_count(entry) == 2);
        drop(lock);

        let outcome = joined.map_err(|e| PlaceError::Interrupted {
            message: e.to_string(),
        })??;

        Ok(outcome)
    }
}

/// Blocking half of a placement.
struct MoveJob {
    source: PathBuf,
    destination: PathBuf,
    incoming_size: u64,
    policy: CollisionPolicy,
    subtitle_extensions: Arc<[String]>,
}

impl MoveJob {
    fn run(self) -> Result<PlaceOutcome, PlaceError> {
        if let Ok(existing) = fs::metadata(&self.destination) {
            if !self.policy.allows_replace(existing.len(), self.incoming_size) {
                return Err(PlaceError::AlreadyExists {
                    destination: self.destination,
                });
            }
        }

        if let Some(parent) = self.destination.parent() {
            fs::create_dir_all(parent).map_err(|source| PlaceError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        move_file(&self.source, &self.destination).map_err(|reason| PlaceError::Move {
            from: self.source.clone(),
            to: self.destination.clone(),
            reason,
        })?;

        let subtitles = self.move_subtitles();

        Ok(PlaceOutcome::Moved {
            destination: self.destination,
            bytes: self.incoming_size,
            subtitles,
        })
    }

    /// Best effort; failures never affect the candidate.
    fn move_subtitles(&self) -> usize {
        let mut moved = 0;
        for ext in self.subtitle_extensions.iter() {
            let from = self.source.with_extension(ext);
            if !from.is_file() {
                continue;
            }
            let to = self.destination.with_extension(ext);
            match move_file(&from, &to) {
                Ok(()) => moved += 1,
                Err(reason) => {
                    debug!(path = %from.display(), error = %reason, "subtitle move failed");
                }
            }
        }
        moved
    }
}

/// Rename, falling back to copy-then-remove across devices.
fn move_file(from: &Path, to: &Path) -> Result<(), String> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices => {
            let mut options = fs_extra::file::CopyOptions::new();
            options.overwrite = true;
            fs_extra::file::move_file(from, to, &options)
                .map(|_| ())
                .map_err(|e| format!("Cross-device move failed: {}", e))
        }
        Err(e) => Err(e.to_string()),
    }
}

async fn same_location(source: &Path, destination: &Path) -> bool {
    if source == destination {
        return true;
    }
    match (
        tokio::fs::canonicalize(source).await,
        tokio::fs::canonicalize(destination).await,
    ) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
