//! Resolved media metadata.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The kind of media a file was resolved to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MediaType {
    /// An episode of a TV series.
    Series,
    /// A feature film.
    Movie,
    /// A title was found but could not be classified.
    Unknown,
}

/// Structured metadata for one source file.
///
/// Produced by a [`Resolver`](crate::Resolver) and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedMatch {
    /// Canonical path of the source file.
    pub path: PathBuf,
    /// Media type.
    pub media_type: MediaType,
    /// Show or movie title.
    pub title: String,
    /// Season number (series only).
    pub season: Option<u32>,
    /// Episode number (series only).
    pub episode: Option<u32>,
    /// Release year.
    pub year: Option<u16>,
    /// File extension without the leading dot.
    pub extension: String,
}

impl ResolvedMatch {
    /// Create a series episode match.
    pub fn series(
        path: impl Into<PathBuf>,
        title: impl Into<String>,
        season: u32,
        episode: u32,
    ) -> Self {
        let path = path.into();
        Self {
            extension: extension_of(&path),
            path,
            media_type: MediaType::Series,
            title: title.into(),
            season: Some(season),
            episode: Some(episode),
            year: None,
        }
    }

    /// Create a movie match.
    pub fn movie(path: impl Into<PathBuf>, title: impl Into<String>, year: Option<u16>) -> Self {
        let path = path.into();
        Self {
            extension: extension_of(&path),
            path,
            media_type: MediaType::Movie,
            title: title.into(),
            season: None,
            episode: None,
            year,
        }
    }

    /// Set the release year.
    pub fn with_year(mut self, year: u16) -> Self {
        self.year = Some(year);
        self
    }

    /// Override the media type.
    pub fn with_media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = media_type;
        self
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_default()
}
