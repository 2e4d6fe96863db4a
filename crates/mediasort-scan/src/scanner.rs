//! JWalk-based candidate scanner.

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use indexmap::{IndexMap, IndexSet};
use jwalk::{Parallelism, WalkDir};
use tracing::{debug, trace};

use mediasort_core::{Candidate, CandidateId, FileSnapshot, RunStats, ScanError, SortConfig};

/// Everything one scan pass discovered.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Candidates keyed by path, in discovery order.
    pub candidates: IndexMap<PathBuf, Candidate>,
    /// Every directory traversed, in discovery order.
    pub directories: IndexSet<PathBuf>,
    /// Found/matched counters.
    pub stats: RunStats,
    /// Time spent scanning.
    pub scan_duration: Duration,
}

impl ScanOutcome {
    /// Number of candidates.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether no candidates were found.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Walks target paths and collects sort candidates.
///
/// Traversal is serial and sorted by file name so that candidate ids are
/// assigned in a stable pre-order. The walk is iterative; deep trees do not
/// grow the call stack.
#[derive(Debug, Default)]
pub struct Scanner;

impl Scanner {
    /// Create a new scanner.
    pub fn new() -> Self {
        Self
    }

    /// Scan every configured target.
    ///
    /// Fails if a target cannot be stat'ed, a directory cannot be listed, a
    /// sub-directory is met without recursion, or nothing sortable was found
    /// (unless watch mode has at least one directory to watch).
    pub fn scan(&self, config: &SortConfig) -> Result<ScanOutcome, ScanError> {
        let start = Instant::now();
        let mut walk = Walk::new(config);

        for target in &config.targets {
            let metadata = std::fs::metadata(target).map_err(|e| ScanError::io(target, e))?;
            walk.add_target(target, &metadata)?;
        }

        let mut outcome = walk.outcome;
        outcome.scan_duration = start.elapsed();

        if outcome.is_empty() && (!config.watch || outcome.directories.is_empty()) {
            return Err(ScanError::NoSortableFiles {
                found: outcome.stats.found,
            });
        }

        debug!(
            found = outcome.stats.found,
            matched = outcome.stats.matched,
            directories = outcome.directories.len(),
            elapsed_ms = outcome.scan_duration.as_millis() as u64,
            "scan complete"
        );

        Ok(outcome)
    }
}

/// Mutable state of one scan.
struct Walk<'a> {
    config: &'a SortConfig,
    outcome: ScanOutcome,
}

impl<'a> Walk<'a> {
    fn new(config: &'a SortConfig) -> Self {
        Self {
            config,
            outcome: ScanOutcome::default(),
        }
    }

    /// Soft cap: once reached nothing new is examined.
    fn limit_reached(&self) -> bool {
        self.outcome.candidates.len() >= self.config.file_limit
    }

    fn add_target(&mut self, target: &Path, metadata: &Metadata) -> Result<(), ScanError> {
        let hidden = target
            .file_name()
            .is_some_and(|name| self.config.should_skip_hidden(&name.to_string_lossy()));
        if hidden || self.limit_reached() {
            return Ok(());
        }

        if metadata.is_file() {
            self.add_file(target, metadata);
        } else if metadata.is_dir() {
            self.walk_dir(target)?;
        }
        Ok(())
    }

    fn walk_dir(&mut self, root: &Path) -> Result<(), ScanError> {
        // Without recursion only the explicit target is listed; any
        // sub-directory found inside it is an error.
        let max_depth = if self.config.recursive { usize::MAX } else { 1 };

        let walker = WalkDir::new(root)
            .parallelism(Parallelism::Serial)
            .sort(true)
            .skip_hidden(self.config.skip_hidden)
            .follow_links(false)
            .min_depth(0)
            .max_depth(max_depth);

        for entry_result in walker {
            if self.limit_reached() {
                debug!(limit = self.config.file_limit, "file limit reached");
                break;
            }

            let entry = entry_result.map_err(|err| ScanError::Walk {
                path: err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf()),
                message: err.to_string(),
            })?;

            let path = entry.path();
            let file_type = entry.file_type();

            if file_type.is_dir() {
                if entry.depth() > 0 && !self.config.recursive {
                    return Err(ScanError::RecursionRequired { path });
                }
                if let Some(err) = &entry.read_children_error {
                    return Err(ScanError::Walk {
                        path,
                        message: err.to_string(),
                    });
                }
                self.outcome.directories.insert(path);
            } else if file_type.is_file() {
                let metadata = entry.metadata().map_err(|err| ScanError::Walk {
                    path: path.clone(),
                    message: err.to_string(),
                })?;
                self.add_file(&path, &metadata);
            } else {
                trace!(path = %path.display(), "skipping non-regular entry");
            }
        }

        Ok(())
    }

    fn add_file(&mut self, path: &Path, metadata: &Metadata) {
        if self.outcome.candidates.contains_key(path) {
            return;
        }

        self.outcome.stats.record_found();
        if !self.config.extension_matches(path) {
            return;
        }

        let id = CandidateId::new(self.outcome.candidates.len() + 1);
        self.outcome.candidates.insert(
            path.to_path_buf(),
            Candidate::new(id, path, FileSnapshot::from_metadata(metadata)),
        );
        self.outcome.stats.record_matched();
    }
}
