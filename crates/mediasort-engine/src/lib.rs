//! Control loop for mediasort.
//!
//! A [`Sorter`] runs passes of Scan → Sort and, in watch mode, waits for a
//! change in any scanned directory before starting the next pass. Each pass
//! rebuilds its state from scratch.

mod sorter;

pub use sorter::{Pass, Sorter};

// Re-export what callers need to build a sorter
pub use mediasort_core::{
    FilenameResolver, PathFormatter, Resolver, RunStats, SortConfig, SortError, TemplateFormatter,
};
pub use mediasort_ops::PassSummary;
