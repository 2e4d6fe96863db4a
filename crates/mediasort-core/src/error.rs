//! Error types for configuration, scanning, placement and watching.

use std::path::PathBuf;

use thiserror::Error;

use crate::media::MediaType;

/// Errors raised while validating a [`SortConfig`](crate::SortConfig).
///
/// These are always fatal and are detected before any scanning occurs.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No target paths were given.
    #[error("At least one target path is required")]
    NoTargets,

    /// Both overwrite flags were set.
    #[error("Overwrite is already specified, overwrite-if-larger is redundant")]
    ConflictingOverwrite,

    /// Watch mode was requested without recursion.
    #[error("Recursive mode is required to watch directories")]
    WatchRequiresRecursive,

    /// The concurrency ceiling was zero.
    #[error("Concurrency must be at least 1")]
    ZeroConcurrency,

    /// The file limit was zero.
    #[error("File limit must be at least 1")]
    ZeroFileLimit,

    /// The extension allow-list was empty.
    #[error("No file extensions to sort")]
    NoExtensions,

    /// A required builder field was never set.
    #[error("Missing configuration field: {field}")]
    MissingField { field: String },
}

impl From<derive_builder::UninitializedFieldError> for ConfigError {
    fn from(err: derive_builder::UninitializedFieldError) -> Self {
        Self::MissingField {
            field: err.field_name().to_string(),
        }
    }
}

/// Errors that abort a scan pass.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The directory walker reported an error.
    #[error("Failed to read {path}: {message}")]
    Walk { path: PathBuf, message: String },

    /// A directory was found while recursion is disabled.
    #[error("Recursive mode (-r) is required to sort directories: {path}")]
    RecursionRequired { path: PathBuf },

    /// Nothing matched the configured extensions.
    #[error("No sortable files found ({found} files checked)")]
    NoSortableFiles { found: u64 },

    /// Other error.
    #[error("{message}")]
    Other { message: String },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}

/// Errors produced by a [`Resolver`](crate::Resolver).
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The file name did not yield a match.
    #[error("No match for {path}")]
    NoMatch { path: PathBuf },

    /// The source file could not be inspected.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Resolver specific failure.
    #[error("{message}")]
    Other { message: String },
}

/// Errors produced by a [`PathFormatter`](crate::PathFormatter).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    /// The template references a field the match does not carry.
    #[error("Template requires '{field}' but the match has none")]
    MissingField { field: &'static str },

    /// The template references an unknown placeholder.
    #[error("Unknown template placeholder '{{{name}}}'")]
    UnknownPlaceholder { name: String },

    /// A `{` was never closed.
    #[error("Unterminated placeholder in template '{template}'")]
    Unterminated { template: String },

    /// The rendered path has no usable components.
    #[error("Template rendered an empty path")]
    EmptyPath,

    /// The rendered path tries to escape its base directory.
    #[error("Rendered path component '{component}' is not allowed")]
    InvalidComponent { component: String },
}

/// Errors raised while placing a single candidate.
#[derive(Debug, Error)]
pub enum PlaceError {
    /// The match carries a media type with no base directory.
    #[error("Invalid result type: {media_type}")]
    UnsupportedMediaType { media_type: MediaType },

    /// The destination is occupied and the collision policy forbids replacing it.
    #[error("File already exists '{}' (try setting --overwrite)", destination.display())]
    AlreadyExists { destination: PathBuf },

    /// The destination directory could not be created.
    #[error("Failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The rename (or cross-device copy) failed.
    #[error("Failed to move {} to {}: {reason}", from.display(), to.display())]
    Move {
        from: PathBuf,
        to: PathBuf,
        reason: String,
    },

    /// The placement task was cancelled or panicked.
    #[error("Placement interrupted: {message}")]
    Interrupted { message: String },
}

/// Any failure that is contained to one candidate.
#[derive(Debug, Error)]
pub enum CandidateError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Place(#[from] PlaceError),

    /// The task driving this candidate panicked.
    #[error("Task failed: {message}")]
    Task { message: String },
    /// The pass was cancelled before this candidate was resolved.
    #[error("Cancelled")]
    Cancelled,
}

/// Errors raised while establishing a directory watch.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The previous pass discovered no directories.
    #[error("No directories to watch")]
    NoDirectories,

    /// The watcher backend could not be created.
    #[error("Failed to create file watcher: {reason}")]
    Create { reason: String },

    /// A directory could not be subscribed.
    #[error("Failed to watch directory {}: {reason}", path.display())]
    Subscribe { path: PathBuf, reason: String },
}

/// Fatal errors that end a sort run.
#[derive(Debug, Error)]
pub enum SortError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Watch(#[from] WatchError),
}
