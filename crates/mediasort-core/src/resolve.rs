//! Collaborator traits and the bundled filename resolver.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::error::{FormatError, ResolveError};
use crate::media::ResolvedMatch;

/// Maps a file path to structured media metadata.
///
/// Implementations may perform network I/O; the dispatcher bounds how many
/// resolutions run at once.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve a single file.
    async fn resolve(&self, path: &Path) -> Result<ResolvedMatch, ResolveError>;
}

/// Renders a match into a destination path relative to its base directory.
pub trait PathFormatter: Send + Sync {
    /// Format the relative destination path for a match.
    fn format(&self, matched: &ResolvedMatch) -> Result<PathBuf, FormatError>;
}

static SERIES_SXXEXX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^(?P<title>.*?)[\s._\-\[(]*",
        r"\bs(?P<season>\d{1,2})[\s._-]*e(?P<episode>\d{1,3})",
    ))
    .expect("valid series pattern")
});

static SERIES_NXNN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?P<title>.*?)[\s._\-\[(]+(?P<season>\d{1,2})x(?P<episode>\d{2,3})\b")
        .expect("valid series pattern")
});

static MOVIE_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<title>.+?)[\s._\-\[(]+(?P<year>(?:19|20)\d{2})(?:[\s._\-\])]|$)")
        .expect("valid movie pattern")
});

/// Offline resolver that parses release-style file names.
///
/// Recognizes `Show.Name.S01E02`, `Show Name 1x02` and `Movie.Name.2010.1080p`.
/// When an episode file carries no title of its own (`S01E02.mkv`), the
/// parent directory name is used.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilenameResolver;

impl FilenameResolver {
    /// Create a new resolver.
    pub fn new() -> Self {
        Self
    }

    /// Parse a path without touching the filesystem.
    ///
    /// The returned match carries `path` unchanged.
    pub fn parse(&self, path: &Path) -> Result<ResolvedMatch, ResolveError> {
        let no_match = || ResolveError::NoMatch {
            path: path.to_path_buf(),
        };
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(no_match)?;

        for pattern in [&*SERIES_SXXEXX, &*SERIES_NXNN] {
            if let Some(caps) = pattern.captures(stem) {
                let title = clean_title(&caps["title"])
                    .or_else(|| parent_title(path))
                    .ok_or_else(no_match)?;
                let season = caps["season"].parse().map_err(|_| no_match())?;
                let episode = caps["episode"].parse().map_err(|_| no_match())?;
                return Ok(ResolvedMatch::series(path, title, season, episode));
            }
        }

        if let Some(caps) = MOVIE_YEAR.captures(stem) {
            let title = clean_title(&caps["title"]).ok_or_else(no_match)?;
            let year = caps["year"].parse().map_err(|_| no_match())?;
            return Ok(ResolvedMatch::movie(path, title, Some(year)));
        }

        Err(no_match())
    }
}

#[async_trait]
impl Resolver for FilenameResolver {
    async fn resolve(&self, path: &Path) -> Result<ResolvedMatch, ResolveError> {
        let canonical = tokio::fs::canonicalize(path)
            .await
            .map_err(|source| ResolveError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        self.parse(&canonical)
    }
}

/// Turn `Show.Name_` into `Show Name`; `None` if nothing is left.
fn clean_title(raw: &str) -> Option<String> {
    let spaced: String = raw
        .chars()
        .map(|c| if c == '.' || c == '_' { ' ' } else { c })
        .collect();
    let title = spaced
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == '-' || c == '[' || c == '(' || c.is_whitespace())
        .to_string();
    (!title.is_empty()).then_some(title)
}

fn parent_title(path: &Path) -> Option<String> {
    let parent = path.parent()?.file_name()?.to_str()?;
    // "Season 1" style directories carry no show name
    if parent.to_lowercase().starts_with("season") {
        let grandparent = path.parent()?.parent()?.file_name()?.to_str()?;
        return clean_title(grandparent);
    }
    clean_title(parent)
}
