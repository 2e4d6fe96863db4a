//! The scan → sort → watch control loop.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use indexmap::{IndexMap, IndexSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use mediasort_core::{
    Candidate, PathFormatter, Resolver, RunStats, ScanError, SortConfig, SortError, WatchError,
};
use mediasort_ops::{Dispatcher, PassSummary};
use mediasort_scan::Scanner;
use mediasort_watch::{DirWatcher, WatchOutcome};

/// State of one scan + sort cycle. Rebuilt from scratch every pass.
#[derive(Debug)]
pub struct Pass {
    /// 1-based pass number.
    pub number: u64,
    pub candidates: IndexMap<PathBuf, Candidate>,
    /// Directories to watch before the next pass.
    pub directories: IndexSet<PathBuf>,
    pub stats: RunStats,
    pub summary: PassSummary,
    pub scan_duration: Duration,
    pub sort_duration: Duration,
}

/// Drives passes until done, failed or cancelled.
pub struct Sorter {
    config: Arc<SortConfig>,
    resolver: Arc<dyn Resolver>,
    formatter: Arc<dyn PathFormatter>,
    watcher: DirWatcher,
}

impl Sorter {
    /// Validate the configuration and build a sorter.
    ///
    /// Configuration errors surface here, before anything touches the
    /// filesystem.
    pub fn new(
        config: SortConfig,
        resolver: Arc<dyn Resolver>,
        formatter: Arc<dyn PathFormatter>,
    ) -> Result<Self, SortError> {
        config.validate()?;
        let watcher = DirWatcher::from_config(&config);
        Ok(Self {
            config: Arc::new(config),
            resolver,
            formatter,
            watcher,
        })
    }

    /// The validated configuration.
    pub fn config(&self) -> &SortConfig {
        &self.config
    }

    /// Run until done. Without watch mode this is a single pass.
    pub async fn run(&self) -> Result<RunStats, SortError> {
        self.run_until(&CancellationToken::new()).await
    }

    /// Run until done or until `cancel` fires.
    ///
    /// Returns the statistics of the last completed pass.
    pub async fn run_until(&self, cancel: &CancellationToken) -> Result<RunStats, SortError> {
        let mut last = RunStats::new();
        let mut number = 0;

        loop {
            if cancel.is_cancelled() {
                debug!("cancelled before pass");
                return Ok(last);
            }

            number += 1;
            let pass = self.run_pass(number, cancel).await?;
            last = pass.stats;

            if !self.config.watch || cancel.is_cancelled() {
                return Ok(last);
            }

            match self.watcher.wait(&pass.directories, cancel).await? {
                WatchOutcome::Changed => continue,
                WatchOutcome::Cancelled => {
                    info!("Stopped watching");
                    return Ok(last);
                }
            }
        }
    }

    /// Run one scan + sort cycle.
    ///
    /// Once `cancel` fires no further candidates are started; the pass
    /// still returns with whatever was placed.
    pub async fn run_pass(
        &self,
        number: u64,
        cancel: &CancellationToken,
    ) -> Result<Pass, SortError> {
        let config = Arc::clone(&self.config);
        let outcome = tokio::task::spawn_blocking(move || Scanner::new().scan(&config))
            .await
            .map_err(|e| ScanError::Other {
                message: format!("Scan task failed: {}", e),
            })??;

        if self.config.watch && outcome.directories.is_empty() {
            return Err(WatchError::NoDirectories.into());
        }

        debug!(
            pass = number,
            candidates = outcome.len(),
            extensions = %self.config.extensions_display(),
            "sorting {} files",
            outcome.len()
        );

        let start = Instant::now();
        let candidates: Vec<Candidate> = outcome.candidates.values().cloned().collect();
        let dispatcher = Dispatcher::new(
            &self.config,
            Arc::clone(&self.resolver),
            Arc::clone(&self.formatter),
        );
        let summary = dispatcher.dispatch(&candidates, cancel).await;
        let sort_duration = start.elapsed();

        let mut stats = outcome.stats;
        stats.record_moved(summary.moved);

        info!(
            "{} ({} of {} files matched)",
            summary.summary(),
            stats.matched,
            stats.found
        );

        Ok(Pass {
            number,
            candidates: outcome.candidates,
            directories: outcome.directories,
            stats,
            summary,
            scan_duration: outcome.scan_duration,
            sort_duration,
        })
    }
}
