//! Per-candidate reports and the pass summary.

use std::path::PathBuf;

use serde::Serialize;

use mediasort_core::{CandidateError, CandidateId};

use crate::placer::PlaceOutcome;

/// The outcome of one candidate, produced by the task that owned it.
#[derive(Debug)]
pub struct CandidateReport {
    /// Candidate sequence id.
    pub id: CandidateId,
    /// Source path as discovered by the scanner.
    pub path: PathBuf,
    /// Placement outcome or the reason it failed.
    pub result: Result<PlaceOutcome, CandidateError>,
}

/// A candidate that could not be placed.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateFailure {
    pub id: usize,
    pub path: PathBuf,
    pub message: String,
}

/// Totals for one dispatch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PassSummary {
    /// Files actually moved.
    pub moved: u64,
    /// Files already at their destination.
    pub already_sorted: u64,
    /// Files that would have moved in dry-run mode.
    pub dry_run: u64,
    /// Files that failed to resolve or place.
    pub failed: u64,
    /// Files left unprocessed because the pass was cancelled.
    pub cancelled: u64,
    /// Bytes moved.
    pub bytes_moved: u64,
    /// Companion subtitle files moved.
    pub subtitles_moved: u64,
    /// One entry per failed candidate, in completion order.
    pub failures: Vec<CandidateFailure>,
}

impl PassSummary {
    /// Fold one candidate report into the totals.
    pub fn record(&mut self, report: &CandidateReport) {
        match &report.result {
            Ok(PlaceOutcome::Moved {
                bytes, subtitles, ..
            }) => {
                self.moved += 1;
                self.bytes_moved += bytes;
                self.subtitles_moved += *subtitles as u64;
            }
            Ok(PlaceOutcome::AlreadySorted) => self.already_sorted += 1,
            Ok(PlaceOutcome::DryRun { .. }) => self.dry_run += 1,
            Err(CandidateError::Cancelled) => self.cancelled += 1,
            Err(e) => {
                self.failed += 1;
                self.failures.push(CandidateFailure {
                    id: report.id.0,
                    path: report.path.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    /// Number of candidates accounted for.
    pub fn total(&self) -> u64 {
        self.moved + self.already_sorted + self.dry_run + self.failed + self.cancelled
    }

    /// Check if every candidate succeeded.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Get a human-readable summary line.
    pub fn summary(&self) -> String {
        let mut parts = if self.dry_run > 0 {
            vec![format!("Would move {} files", self.dry_run)]
        } else {
            vec![format!(
                "Moved {} files ({})",
                self.moved,
                humansize::format_size(self.bytes_moved, humansize::BINARY)
            )]
        };

        if self.subtitles_moved > 0 {
            parts.push(format!("{} subtitles", self.subtitles_moved));
        }
        if self.already_sorted > 0 {
            parts.push(format!("{} already sorted", self.already_sorted));
        }
        if self.failed > 0 {
            parts.push(format!("{} failed", self.failed));
        }
        if self.cancelled > 0 {
            parts.push(format!("{} cancelled", self.cancelled));
        }

        parts.join(", ")
    }
}
