//! File system scanning engine for mediasort.
//!
//! This crate walks the configured target paths and collects sort
//! candidates. Key properties:
//!
//! - **Serial, sorted traversal** via jwalk, so candidate ids follow a
//!   deterministic pre-order
//! - **Filtering** by extension allow-list and hidden-entry rules
//! - **Soft file limit**: once reached, no further entries are examined
//! - **Directory set** of every traversed directory, used for watching
//!
//! # Example
//!
//! ```rust,no_run
//! use mediasort_scan::{Scanner, SortConfig};
//!
//! let mut config = SortConfig::new(["/downloads"]);
//! config.recursive = true;
//!
//! let outcome = Scanner::new().scan(&config).unwrap();
//! for candidate in outcome.candidates.values() {
//!     println!("{} {}", candidate.id, candidate.path.display());
//! }
//! println!("{} files checked", outcome.stats.found);
//! ```

mod scanner;

pub use scanner::{ScanOutcome, Scanner};

// Re-export core types for convenience
pub use mediasort_core::{Candidate, CandidateId, FileSnapshot, RunStats, ScanError, SortConfig};
