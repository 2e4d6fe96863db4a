//! Directory change watching for mediasort.
//!
//! [`DirWatcher::wait`] subscribes to every directory of a scan pass,
//! returns after the first change plus a debounce delay, and can be
//! cancelled. Native notifications are used where available, with a
//! polling fallback.

mod watcher;

pub use watcher::{Backend, DEFAULT_POLL_INTERVAL, DirWatcher, WatchOutcome};
