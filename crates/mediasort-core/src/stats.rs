//! Per-pass run statistics.

use serde::{Deserialize, Serialize};

/// Counters for one scan/sort pass.
///
/// Advisory only; the engine consults them solely for the
/// "no sortable files" check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Regular files examined.
    pub found: u64,
    /// Files whose extension matched.
    pub matched: u64,
    /// Files actually moved.
    pub moved: u64,
}

impl RunStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a regular file.
    pub fn record_found(&mut self) {
        self.found += 1;
    }

    /// Record a file that became a candidate.
    pub fn record_matched(&mut self) {
        self.matched += 1;
    }

    /// Record files moved by a completed dispatch.
    pub fn record_moved(&mut self, count: u64) {
        self.moved += count;
    }
}
