//! File-change watching and self-write suppression.
//!
//! The watcher subscribes to the settings file's parent directory (never
//! subdirectories) and filters events down to the exact file name. Raw
//! notify events arrive in bursts — a truncating write is typically two or
//! three events — so a dedicated thread coalesces each burst into a single
//! reload with a short quiet period.
//!
//! Suppression: notify has no way to pause event raising around our own
//! writes, so the store marks its writes instead. [`Suppression`] holds a
//! flag that is up for the duration of a save plus the instant the save
//! finished; the watch thread drops any burst observed while the flag is up
//! or within `SELF_WRITE_WINDOW` of the last save. Without this, every
//! `save()` would bounce straight back as a reload.

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::ffi::OsString;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::Result;

/// Quiet period used to coalesce an event burst into one reload.
pub(crate) const DEBOUNCE: Duration = Duration::from_millis(100);

/// Events this close to a completed self-write are treated as ours.
pub(crate) const SELF_WRITE_WINDOW: Duration = Duration::from_millis(250);

/// Tracks whether the store is (or just was) writing its own file.
#[derive(Default)]
pub struct Suppression {
    writing: AtomicBool,
    last_write: Mutex<Option<Instant>>,
}

impl Suppression {
    /// Mark a self-write in progress. The returned guard re-arms event
    /// handling on drop, even if the write fails.
    pub fn begin(&self) -> SuppressGuard<'_> {
        self.writing.store(true, Ordering::SeqCst);
        SuppressGuard(self)
    }

    /// Whether an event observed right now should be attributed to the
    /// store's own write.
    pub fn active(&self) -> bool {
        if self.writing.load(Ordering::SeqCst) {
            return true;
        }
        match *self.last_write.lock() {
            Some(at) => at.elapsed() < SELF_WRITE_WINDOW,
            None => false,
        }
    }
}

/// Scoped suppression for one write. See [`Suppression::begin`].
pub struct SuppressGuard<'a>(&'a Suppression);

impl Drop for SuppressGuard<'_> {
    fn drop(&mut self) {
        *self.0.last_write.lock() = Some(Instant::now());
        self.0.writing.store(false, Ordering::SeqCst);
    }
}

/// Watches one file for external changes and invokes a handler once per
/// coalesced change burst.
///
/// Dropping the watcher tears down the notify subscription, which
/// disconnects the event channel and lets the debounce thread exit; the
/// thread is joined on drop so no callback outlives the store.
pub struct FileWatcher {
    watcher: Option<RecommendedWatcher>,
    join_handle: Option<thread::JoinHandle<()>>,
}

impl FileWatcher {
    /// Start watching `path`'s parent directory, filtered to `path`'s file
    /// name. `on_change` runs on the watch thread for every external change.
    pub fn start<F>(path: &Path, suppression: Arc<Suppression>, on_change: F) -> Result<Self>
    where
        F: Fn() + Send + 'static,
    {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => Path::new(".").to_path_buf(),
        };
        let file_name: OsString = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();

        let (tx, rx) = mpsc::channel::<notify::Result<notify::Event>>();
        let mut watcher = notify::recommended_watcher(tx)?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        let join_handle = thread::spawn(move || loop {
            let event = match rx.recv() {
                Ok(Ok(event)) => event,
                Ok(Err(e)) => {
                    log::warn!("file watch delivered an error: {e}");
                    continue;
                }
                Err(_) => break,
            };
            if !touches(&event, &file_name) {
                continue;
            }
            // Drain the rest of the burst before acting. Only events for
            // our file reset the quiet period — a busy sibling file in the
            // same directory must not hold the reload off indefinitely.
            let mut disconnected = false;
            let mut deadline = Instant::now() + DEBOUNCE;
            loop {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    break;
                }
                match rx.recv_timeout(remaining) {
                    Ok(Ok(event)) => {
                        if touches(&event, &file_name) {
                            deadline = Instant::now() + DEBOUNCE;
                        }
                    }
                    Ok(Err(e)) => {
                        log::warn!("file watch delivered an error: {e}");
                    }
                    Err(mpsc::RecvTimeoutError::Timeout) => break,
                    Err(mpsc::RecvTimeoutError::Disconnected) => {
                        disconnected = true;
                        break;
                    }
                }
            }
            if !suppression.active() {
                on_change();
            }
            if disconnected {
                break;
            }
        });

        Ok(Self {
            watcher: Some(watcher),
            join_handle: Some(join_handle),
        })
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        drop(self.watcher.take());
        if let Some(h) = self.join_handle.take() {
            let _ = h.join();
        }
    }
}

/// Whether `event` is a content-bearing change to the watched file name.
fn touches(event: &notify::Event, file_name: &OsString) -> bool {
    if !(event.kind.is_modify() || event.kind.is_create()) {
        return false;
    }
    event
        .paths
        .iter()
        .any(|p| p.file_name() == Some(file_name.as_os_str()))
}
