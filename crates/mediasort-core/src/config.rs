//! Sort configuration types.

use std::path::{Path, PathBuf};
use std::time::Duration;

use derive_builder::Builder;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Extensions sorted when none are configured.
pub const DEFAULT_EXTENSIONS: &str = "mp4,avi,mkv";

/// Default template for series episodes.
pub const DEFAULT_TV_TEMPLATE: &str = "{title}/Season {season}/{title} - S{season}E{episode}.{ext}";

/// Default template for movies.
pub const DEFAULT_MOVIE_TEMPLATE: &str = "{title} ({year})/{title} ({year}).{ext}";

const DEFAULT_CONCURRENCY: usize = 6;
const DEFAULT_FILE_LIMIT: usize = 1000;
const DEFAULT_WATCH_DELAY: Duration = Duration::from_secs(3);

/// Destination path templates.
///
/// Placeholders: `{title}`, `{season}`, `{episode}`, `{year}`, `{ext}`.
/// Season and episode numbers render zero-padded to two digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathConfig {
    /// Template for series episodes, relative to the TV directory.
    #[serde(default = "default_tv_template")]
    pub tv_template: String,
    /// Template for movies, relative to the movie directory.
    #[serde(default = "default_movie_template")]
    pub movie_template: String,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            tv_template: default_tv_template(),
            movie_template: default_movie_template(),
        }
    }
}

fn default_tv_template() -> String {
    DEFAULT_TV_TEMPLATE.to_string()
}

fn default_movie_template() -> String {
    DEFAULT_MOVIE_TEMPLATE.to_string()
}

/// Configuration for a sort run.
///
/// Created once at start-up and never mutated afterwards.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate", error = "ConfigError"))]
pub struct SortConfig {
    /// Files or directories to scan.
    #[builder(default, setter(into, each(name = "target", into)))]
    pub targets: Vec<PathBuf>,

    /// Base directory for series.
    #[builder(default = "PathBuf::from(\".\")")]
    #[serde(default = "default_dir")]
    pub tv_dir: PathBuf,

    /// Base directory for movies.
    #[builder(default = "PathBuf::from(\".\")")]
    #[serde(default = "default_dir")]
    pub movie_dir: PathBuf,

    /// Destination path templates.
    #[builder(default)]
    #[serde(default)]
    pub path_config: PathConfig,

    /// File extensions eligible for sorting (without the dot).
    #[builder(default = "parse_extension_list(DEFAULT_EXTENSIONS)")]
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Companion extensions moved alongside a sorted file.
    #[builder(default = "vec![\"srt\".to_string()]")]
    #[serde(default = "default_subtitle_extensions")]
    pub subtitle_extensions: Vec<String>,

    /// Maximum number of candidates resolved and placed at once.
    #[builder(default = "DEFAULT_CONCURRENCY")]
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Soft cap on candidates discovered per pass.
    #[builder(default = "DEFAULT_FILE_LIMIT")]
    #[serde(default = "default_file_limit")]
    pub file_limit: usize,

    /// Descend into sub-directories.
    #[builder(default = "false")]
    #[serde(default)]
    pub recursive: bool,

    /// Log intended moves without touching the filesystem.
    #[builder(default = "false")]
    #[serde(default)]
    pub dry_run: bool,

    /// Skip entries whose name starts with a dot.
    #[builder(default = "false")]
    #[serde(default)]
    pub skip_hidden: bool,

    /// Always replace an existing destination.
    #[builder(default = "false")]
    #[serde(default)]
    pub overwrite: bool,

    /// Replace an existing destination only if the new file is larger.
    #[builder(default = "false")]
    #[serde(default)]
    pub overwrite_if_larger: bool,

    /// Re-run the pass when a scanned directory changes.
    #[builder(default = "false")]
    #[serde(default)]
    pub watch: bool,

    /// Delay between a detected change and the next scan.
    #[builder(default = "DEFAULT_WATCH_DELAY")]
    #[serde(default = "default_watch_delay")]
    pub watch_delay: Duration,

    /// Use the polling watcher with this interval instead of native notifications.
    #[builder(default)]
    #[serde(default)]
    pub poll_interval: Option<Duration>,
}

fn default_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_extensions() -> Vec<String> {
    parse_extension_list(DEFAULT_EXTENSIONS)
}

fn default_subtitle_extensions() -> Vec<String> {
    vec!["srt".to_string()]
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_file_limit() -> usize {
    DEFAULT_FILE_LIMIT
}

fn default_watch_delay() -> Duration {
    DEFAULT_WATCH_DELAY
}

/// Split a comma-separated extension list.
///
/// Entries are trimmed, stripped of a leading dot and lowercased; empty
/// entries are dropped.
pub fn parse_extension_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|e| e.trim().trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .unique()
        .collect()
}

struct Invariants {
    has_targets: bool,
    overwrite: bool,
    overwrite_if_larger: bool,
    watch: bool,
    recursive: bool,
    concurrency: usize,
    file_limit: usize,
    has_extensions: bool,
}

impl Invariants {
    fn check(&self) -> Result<(), ConfigError> {
        if !self.has_targets {
            return Err(ConfigError::NoTargets);
        }
        if self.watch && !self.recursive {
            return Err(ConfigError::WatchRequiresRecursive);
        }
        if self.overwrite && self.overwrite_if_larger {
            return Err(ConfigError::ConflictingOverwrite);
        }
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.file_limit == 0 {
            return Err(ConfigError::ZeroFileLimit);
        }
        if !self.has_extensions {
            return Err(ConfigError::NoExtensions);
        }
        Ok(())
    }
}

impl SortConfigBuilder {
    fn validate(&self) -> Result<(), ConfigError> {
        Invariants {
            has_targets: self.targets.as_ref().is_some_and(|t| !t.is_empty()),
            overwrite: self.overwrite.unwrap_or(false),
            overwrite_if_larger: self.overwrite_if_larger.unwrap_or(false),
            watch: self.watch.unwrap_or(false),
            recursive: self.recursive.unwrap_or(false),
            concurrency: self.concurrency.unwrap_or(DEFAULT_CONCURRENCY),
            file_limit: self.file_limit.unwrap_or(DEFAULT_FILE_LIMIT),
            has_extensions: self.extensions.as_ref().is_none_or(|e| !e.is_empty()),
        }
        .check()
    }
}

impl SortConfig {
    /// Create a new sort config builder.
    pub fn builder() -> SortConfigBuilder {
        SortConfigBuilder::default()
    }

    /// Create a config with defaults for the given targets.
    pub fn new<I, P>(targets: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            targets: targets.into_iter().map(Into::into).collect(),
            tv_dir: default_dir(),
            movie_dir: default_dir(),
            path_config: PathConfig::default(),
            extensions: default_extensions(),
            subtitle_extensions: default_subtitle_extensions(),
            concurrency: DEFAULT_CONCURRENCY,
            file_limit: DEFAULT_FILE_LIMIT,
            recursive: false,
            dry_run: false,
            skip_hidden: false,
            overwrite: false,
            overwrite_if_larger: false,
            watch: false,
            watch_delay: DEFAULT_WATCH_DELAY,
            poll_interval: None,
        }
    }

    /// Check the configuration invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Invariants {
            has_targets: !self.targets.is_empty(),
            overwrite: self.overwrite,
            overwrite_if_larger: self.overwrite_if_larger,
            watch: self.watch,
            recursive: self.recursive,
            concurrency: self.concurrency,
            file_limit: self.file_limit,
            has_extensions: !self.extensions.is_empty(),
        }
        .check()
    }

    /// Check if an entry should be skipped as hidden.
    pub fn should_skip_hidden(&self, name: &str) -> bool {
        self.skip_hidden && name.starts_with('.')
    }

    /// Check if a file's extension is in the allow-list (case-insensitive).
    pub fn extension_matches(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }

    /// The extension allow-list as a comma-separated string.
    pub fn extensions_display(&self) -> String {
        self.extensions.iter().join(",")
    }
}

impl Default for SortConfig {
    fn default() -> Self {
        Self::new(["."])
    }
}
