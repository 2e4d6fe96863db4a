//! Candidates discovered by a scan.

use std::fmt;
use std::fs::Metadata;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Sequence number of a candidate within one pass (1-based, discovery order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CandidateId(pub usize);

impl CandidateId {
    /// Create a new CandidateId.
    pub fn new(id: usize) -> Self {
        Self(id)
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Filesystem metadata captured when the candidate was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSnapshot {
    /// File size in bytes.
    pub size: u64,
    /// Permission bits (0 where the platform has none).
    pub mode: u32,
}

impl FileSnapshot {
    /// Create a snapshot from raw values.
    pub fn new(size: u64, mode: u32) -> Self {
        Self { size, mode }
    }

    /// Capture a snapshot from file metadata.
    pub fn from_metadata(metadata: &Metadata) -> Self {
        Self {
            size: metadata.len(),
            mode: get_mode(metadata),
        }
    }
}

#[cfg(unix)]
fn get_mode(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode()
}

#[cfg(not(unix))]
fn get_mode(metadata: &Metadata) -> u32 {
    if metadata.permissions().readonly() { 0o444 } else { 0o644 }
}

/// A discovered file awaiting resolution and placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Discovery order id.
    pub id: CandidateId,
    /// Path as discovered.
    pub path: PathBuf,
    /// Metadata at discovery time.
    pub snapshot: FileSnapshot,
}

impl Candidate {
    /// Create a new candidate.
    pub fn new(id: CandidateId, path: impl Into<PathBuf>, snapshot: FileSnapshot) -> Self {
        Self {
            id,
            path: path.into(),
            snapshot,
        }
    }

    /// Size of the file when it was discovered.
    pub fn size(&self) -> u64 {
        self.snapshot.size
    }
}
