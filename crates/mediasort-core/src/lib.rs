//! Core types and traits for mediasort.
//!
//! This crate provides the fundamental data structures shared by the
//! mediasort crates: the sort configuration, candidates and resolved
//! matches, run statistics, the error taxonomy, and the collaborator
//! traits ([`Resolver`], [`PathFormatter`]) together with their bundled
//! offline implementations.

mod candidate;
mod config;
mod error;
mod format;
mod media;
mod resolve;
mod stats;

pub use candidate::{Candidate, CandidateId, FileSnapshot};
pub use config::{
    DEFAULT_EXTENSIONS, DEFAULT_MOVIE_TEMPLATE, DEFAULT_TV_TEMPLATE, PathConfig, SortConfig,
    SortConfigBuilder, parse_extension_list,
};
pub use error::{
    CandidateError, ConfigError, FormatError, PlaceError, ResolveError, ScanError, SortError,
    WatchError,
};
pub use format::TemplateFormatter;
pub use media::{MediaType, ResolvedMatch};
pub use resolve::{FilenameResolver, PathFormatter, Resolver};
pub use stats::RunStats;
