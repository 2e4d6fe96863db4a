//! One-shot directory watcher.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::event::EventKind;
use notify::{
    Config as NotifyConfig, Event, PollWatcher, RecommendedWatcher, RecursiveMode, Watcher,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use mediasort_core::{SortConfig, WatchError};

/// Poll interval used when native notifications are unavailable.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// How a wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    /// A change (or a watcher error) was observed and the debounce elapsed.
    Changed,
    /// The cancellation token fired.
    Cancelled,
}

/// Which notification backend a wait used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Native,
    Poll(Duration),
}

type Signal = Result<(), String>;

/// Waits for the first change in a set of directories.
///
/// Every call subscribes afresh and releases the subscription before
/// returning, so the directory set may differ between calls.
#[derive(Debug, Clone)]
pub struct DirWatcher {
    delay: Duration,
    poll_interval: Option<Duration>,
}

impl DirWatcher {
    /// Create a watcher with a debounce delay and an optional forced poll
    /// interval.
    pub fn new(delay: Duration, poll_interval: Option<Duration>) -> Self {
        Self {
            delay,
            poll_interval,
        }
    }

    /// Create a watcher from the watch settings of a config.
    pub fn from_config(config: &SortConfig) -> Self {
        Self::new(config.watch_delay, config.poll_interval)
    }

    /// The debounce delay.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Block until something changes in `dirs`, then wait out the debounce
    /// delay.
    pub async fn wait<'a, I>(
        &self,
        dirs: I,
        cancel: &CancellationToken,
    ) -> Result<WatchOutcome, WatchError>
    where
        I: IntoIterator<Item = &'a PathBuf>,
    {
        let dirs: Vec<&Path> = dirs.into_iter().map(PathBuf::as_path).collect();
        if dirs.is_empty() {
            return Err(WatchError::NoDirectories);
        }

        let (tx, mut rx) = mpsc::channel::<Signal>(16);
        let (mut watcher, backend) = self.create(tx)?;
        debug!(?backend, directories = dirs.len(), "subscribing");

        for dir in &dirs {
            if let Err(e) = watcher.watch(dir, RecursiveMode::NonRecursive) {
                release(watcher);
                return Err(WatchError::Subscribe {
                    path: dir.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        }

        info!("Watching {} directories for changes...", dirs.len());

        let outcome = tokio::select! {
            _ = cancel.cancelled() => WatchOutcome::Cancelled,
            signal = rx.recv() => {
                match signal {
                    Some(Ok(())) => debug!("change detected"),
                    Some(Err(e)) => warn!(error = %e, "watcher error, rescanning"),
                    None => debug!("watcher closed"),
                }
                WatchOutcome::Changed
            }
        };

        release(watcher);

        if outcome == WatchOutcome::Cancelled {
            return Ok(outcome);
        }

        tokio::select! {
            _ = cancel.cancelled() => Ok(WatchOutcome::Cancelled),
            _ = tokio::time::sleep(self.delay) => Ok(WatchOutcome::Changed),
        }
    }

    fn create(
        &self,
        tx: mpsc::Sender<Signal>,
    ) -> Result<(Box<dyn Watcher + Send>, Backend), WatchError> {
        if let Some(interval) = self.poll_interval {
            return poll_watcher(tx, interval).map(|w| (w, Backend::Poll(interval)));
        }

        let native_tx = tx.clone();
        match RecommendedWatcher::new(handler(native_tx), NotifyConfig::default()) {
            Ok(watcher) => Ok((Box::new(watcher), Backend::Native)),
            Err(e) => {
                warn!(error = %e, "native watcher unavailable, falling back to polling");
                poll_watcher(tx, DEFAULT_POLL_INTERVAL)
                    .map(|w| (w, Backend::Poll(DEFAULT_POLL_INTERVAL)))
            }
        }
    }
}

fn poll_watcher(
    tx: mpsc::Sender<Signal>,
    interval: Duration,
) -> Result<Box<dyn Watcher + Send>, WatchError> {
    let config = NotifyConfig::default().with_poll_interval(interval);
    PollWatcher::new(handler(tx), config)
        .map(|w| Box::new(w) as Box<dyn Watcher + Send>)
        .map_err(|e| WatchError::Create {
            reason: e.to_string(),
        })
}

/// Forward the first signals to the waiting task; later ones are dropped.
fn handler(tx: mpsc::Sender<Signal>) -> impl FnMut(notify::Result<Event>) + Send + 'static {
    move |res: notify::Result<Event>| {
        let signal = match res {
            Ok(event) if matches!(event.kind, EventKind::Access(_)) => return,
            Ok(_) => Ok(()),
            Err(e) => Err(e.to_string()),
        };
        let _ = tx.try_send(signal);
    }
}

/// Drop the backend off the async threads; tearing down a native watcher
/// joins its event thread.
fn release(watcher: Box<dyn Watcher + Send>) {
    tokio::task::spawn_blocking(move || drop(watcher));
}
