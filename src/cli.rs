//! Command line and config file handling.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{ArgAction, Parser};
use color_eyre::eyre::{Context, Result, eyre};
use serde::Deserialize;

use mediasort_core::{PathConfig, SortConfig, parse_extension_list};

#[derive(Parser, Debug)]
#[command(
    name = "mediasort",
    version,
    about = "Sorts TV series and movie files into a canonical directory tree",
    long_about = "mediasort scans the given paths for video files, identifies each one as an \
                  episode or a movie and moves it under the TV or movie directory.\n\n\
                  Options not given on the command line are read from the config file \
                  (<config dir>/mediasort/config.toml by default)."
)]
pub struct Cli {
    /// Files or directories to sort
    #[arg(required = true)]
    pub targets: Vec<PathBuf>,

    /// Base directory for TV series
    #[arg(short = 't', long)]
    pub tv_dir: Option<PathBuf>,

    /// Base directory for movies
    #[arg(short = 'm', long)]
    pub movie_dir: Option<PathBuf>,

    /// Destination template for episodes
    #[arg(long)]
    pub tv_template: Option<String>,

    /// Destination template for movies
    #[arg(long)]
    pub movie_template: Option<String>,

    /// Comma-separated file extensions to sort (default: mp4,avi,mkv)
    #[arg(short = 'e', long)]
    pub extensions: Option<String>,

    /// Comma-separated companion extensions moved alongside (default: srt)
    #[arg(long)]
    pub subtitle_extensions: Option<String>,

    /// Maximum number of files sorted at once (default: 6)
    #[arg(short = 'c', long)]
    pub concurrency: Option<usize>,

    /// Stop collecting files after this many per pass (default: 1000)
    #[arg(short = 'l', long)]
    pub file_limit: Option<usize>,

    /// Descend into sub-directories
    #[arg(short = 'r', long)]
    pub recursive: bool,

    /// Log intended moves without touching any file
    #[arg(short = 'd', long)]
    pub dry_run: bool,

    /// Skip files and directories starting with a dot
    #[arg(long)]
    pub skip_hidden: bool,

    /// Replace files that already exist at the destination
    #[arg(long)]
    pub overwrite: bool,

    /// Replace existing files only if the new file is larger
    #[arg(long)]
    pub overwrite_if_larger: bool,

    /// Keep running and sort again whenever a scanned directory changes
    #[arg(short = 'w', long)]
    pub watch: bool,

    /// Delay between a change and the next scan (e.g., "500ms", "3s", "1m")
    #[arg(long, value_parser = parse_duration)]
    pub watch_delay: Option<Duration>,

    /// Use the polling watcher with this interval (e.g., "2s")
    #[arg(long, value_parser = parse_duration)]
    pub poll_interval: Option<Duration>,

    /// Config file to read defaults from
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// More output (-v debug, -vv trace)
    #[arg(short = 'v', long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only show warnings and errors
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

impl Cli {
    /// Default log level for the verbosity flags.
    pub fn log_level(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (true, _) => "warn",
            (false, 0) => "info",
            (false, 1) => "debug",
            (false, _) => "trace",
        }
    }

    /// Merge flags over the config file into a sort config.
    pub fn into_config(self, file: FileConfig) -> Result<SortConfig> {
        let mut builder = SortConfig::builder();
        builder
            .targets(self.targets)
            .recursive(self.recursive || file.recursive.unwrap_or(false))
            .dry_run(self.dry_run || file.dry_run.unwrap_or(false))
            .skip_hidden(self.skip_hidden || file.skip_hidden.unwrap_or(false))
            .overwrite(self.overwrite || file.overwrite.unwrap_or(false))
            .overwrite_if_larger(
                self.overwrite_if_larger || file.overwrite_if_larger.unwrap_or(false),
            )
            .watch(self.watch || file.watch.unwrap_or(false));

        if let Some(dir) = self.tv_dir.or(file.tv_dir) {
            builder.tv_dir(dir);
        }
        if let Some(dir) = self.movie_dir.or(file.movie_dir) {
            builder.movie_dir(dir);
        }

        let mut paths = PathConfig::default();
        if let Some(template) = self.tv_template.or(file.tv_template) {
            paths.tv_template = template;
        }
        if let Some(template) = self.movie_template.or(file.movie_template) {
            paths.movie_template = template;
        }
        builder.path_config(paths);

        if let Some(list) = self.extensions.or(file.extensions) {
            builder.extensions(parse_extension_list(&list));
        }
        if let Some(list) = self.subtitle_extensions.or(file.subtitle_extensions) {
            builder.subtitle_extensions(parse_extension_list(&list));
        }
        if let Some(n) = self.concurrency.or(file.concurrency) {
            builder.concurrency(n);
        }
        if let Some(n) = self.file_limit.or(file.file_limit) {
            builder.file_limit(n);
        }

        let watch_delay = match (self.watch_delay, file.watch_delay) {
            (Some(delay), _) => Some(delay),
            (None, Some(s)) => Some(parse_duration(&s).map_err(|e| eyre!(e))?),
            (None, None) => None,
        };
        if let Some(delay) = watch_delay {
            builder.watch_delay(delay);
        }

        let poll_interval = match (self.poll_interval, file.poll_interval) {
            (Some(interval), _) => Some(interval),
            (None, Some(s)) => Some(parse_duration(&s).map_err(|e| eyre!(e))?),
            (None, None) => None,
        };
        builder.poll_interval(poll_interval);

        builder.build().context("Invalid configuration")
    }
}

/// Defaults read from the TOML config file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub tv_dir: Option<PathBuf>,
    pub movie_dir: Option<PathBuf>,
    pub tv_template: Option<String>,
    pub movie_template: Option<String>,
    pub extensions: Option<String>,
    pub subtitle_extensions: Option<String>,
    pub concurrency: Option<usize>,
    pub file_limit: Option<usize>,
    pub recursive: Option<bool>,
    pub dry_run: Option<bool>,
    pub skip_hidden: Option<bool>,
    pub overwrite: Option<bool>,
    pub overwrite_if_larger: Option<bool>,
    pub watch: Option<bool>,
    pub watch_delay: Option<String>,
    pub poll_interval: Option<String>,
}

impl FileConfig {
    /// Default config file location.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("mediasort").join("config.toml"))
    }

    /// Load the config file.
    ///
    /// An explicit path must exist; a missing default file yields empty
    /// defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.is_file() => path,
                _ => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Parse a duration string (e.g., "500ms", "3s", "1m", "2h").
///
/// A bare number is taken as seconds.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim().to_lowercase();
    let invalid = || format!("Invalid duration '{}'", s);

    let (num, multiplier) = if let Some(n) = s.strip_suffix("ms") {
        (n, 0.001)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1.0)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60.0)
    } else if let Some(n) = s.strip_suffix('h') {
        (n, 60.0 * 60.0)
    } else {
        (s.as_str(), 1.0)
    };

    let num: f64 = num.trim().parse().map_err(|_| invalid())?;
    if !num.is_finite() || num < 0.0 {
        return Err(invalid());
    }
    Ok(Duration::from_secs_f64(num * multiplier))
}
