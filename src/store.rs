//! Core store type and builder.

use crate::error::{Error, Result};
use crate::persist::{atomic_write, load};
use crate::serializer::{JsonSerializer, Serializer};
use crate::value::ValueKind;
use crate::watch::{FileWatcher, Suppression};
use crate::worker::SaveWorker;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};

/// JSON-file-backed settings store.
///
/// One store owns one file. Keys are non-empty strings, values any
/// JSON-representable data. The whole map is replaced on every load and
/// written out whole on every save — there is no incremental merge.
///
/// Use [`open`](Self::open) for a quick start or [`builder`](Self::builder)
/// to turn on auto-reload or pretty-printed output.
///
/// All map access goes through one mutex, so accessors, background saves and
/// watch-triggered reloads never observe a half-updated map. The store is
/// single-process: if another process writes the same file, auto-reload will
/// pick the change up but nothing arbitrates the write itself.
pub struct SettingsStore {
    shared: Arc<Shared>,
    watcher: Option<FileWatcher>,
    worker: Option<SaveWorker>,
    trigger: Option<mpsc::SyncSender<()>>,
}

/// State shared with the save worker and the watch thread.
struct Shared {
    path: PathBuf,
    serializer: JsonSerializer,
    suppression: Arc<Suppression>,
    state: Mutex<State>,
    reload_subscribers: Mutex<Vec<Box<dyn Fn() + Send>>>,
    reload_error_subscribers: Mutex<Vec<Box<dyn Fn(&Error) + Send>>>,
}

enum State {
    Open(HashMap<String, Value>),
    Closed,
}

impl SettingsStore {
    /// Open (or create) a store at `path` with auto-reload off and compact
    /// JSON output.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::builder(path).build()
    }

    /// Start configuring a new store. Call
    /// [`.build()`](SettingsStoreBuilder::build) when ready.
    pub fn builder(path: impl AsRef<Path>) -> SettingsStoreBuilder {
        SettingsStoreBuilder::new(path)
    }

    // ---- reads ----

    /// `true` if the key is present. `Ok(false)` once the store is closed.
    pub fn exists(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        let state = self.shared.state.lock();
        match &*state {
            State::Open(map) => Ok(map.contains_key(key)),
            State::Closed => Ok(false),
        }
    }

    /// Look up `key`, reporting the value together with its runtime type
    /// tag. `Ok(None)` when the key is absent or the store is closed.
    pub fn try_get(&self, key: &str) -> Result<Option<(ValueKind, Value)>> {
        validate_key(key)?;
        let state = self.shared.state.lock();
        match &*state {
            State::Open(map) => Ok(map
                .get(key)
                .map(|value| (ValueKind::of(value), value.clone()))),
            State::Closed => Ok(None),
        }
    }

    /// Number of entries. Zero once the store is closed.
    #[must_use]
    pub fn len(&self) -> usize {
        match &*self.shared.state.lock() {
            State::Open(map) => map.len(),
            State::Closed => 0,
        }
    }

    /// `true` when the store has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all keys.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        match &*self.shared.state.lock() {
            State::Open(map) => map.keys().cloned().collect(),
            State::Closed => Vec::new(),
        }
    }

    /// Path to the backing JSON file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    // ---- writes ----

    /// Insert or overwrite `key -> value`. With `persist` a save is
    /// scheduled on the background worker; the caller does not block on it.
    ///
    /// `Ok(false)` when the store is closed or the value cannot be
    /// represented as JSON (for example a map with non-string keys) — these
    /// are the only swallowed failures. A blank key still errors.
    pub fn try_set<T: Serialize>(&self, key: &str, value: T, persist: bool) -> Result<bool> {
        validate_key(key)?;
        let value = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(_) => return Ok(false),
        };
        {
            let mut state = self.shared.state.lock();
            let State::Open(map) = &mut *state else {
                return Ok(false);
            };
            map.insert(key.to_owned(), value);
        }
        if persist {
            self.schedule_save();
        }
        Ok(true)
    }

    /// Remove `key`, reporting whether a removal actually occurred. With
    /// `persist` a save is scheduled whether or not the key was present.
    /// `Ok(false)` when the store is closed.
    pub fn try_remove(&self, key: &str, persist: bool) -> Result<bool> {
        validate_key(key)?;
        let removed = {
            let mut state = self.shared.state.lock();
            let State::Open(map) = &mut *state else {
                return Ok(false);
            };
            map.remove(key).is_some()
        };
        if persist {
            self.schedule_save();
        }
        Ok(removed)
    }

    // ---- persistence ----

    /// Write the current map to disk, synchronously. The store's own write
    /// is suppressed from the watch, so this never fires `Reloaded`. No-op
    /// once the store is closed.
    pub fn save(&self) -> Result<()> {
        self.shared.save_to_disk()
    }

    /// Replace the in-memory map with the file's contents, synchronously,
    /// discarding unsaved changes. Does not fire `Reloaded` — that
    /// notification is reserved for external changes picked up by the
    /// watch. No-op once the store is closed.
    pub fn reload(&self) -> Result<()> {
        self.shared.reload_from_disk().map(|_| ())
    }

    // ---- notifications ----

    /// Subscribe to `Reloaded`: fired on the watch thread after every
    /// successful reload triggered by an external file change. Not fired
    /// for explicit [`reload`](Self::reload) calls or the load at
    /// construction.
    pub fn on_reloaded<F>(&self, f: F)
    where
        F: Fn() + Send + 'static,
    {
        self.shared.reload_subscribers.lock().push(Box::new(f));
    }

    /// Subscribe to reload failures (malformed external edit, I/O error
    /// during auto-reload). The previous in-memory state is kept when this
    /// fires.
    pub fn on_reload_error<F>(&self, f: F)
    where
        F: Fn(&Error) + Send + 'static,
    {
        self.shared
            .reload_error_subscribers
            .lock()
            .push(Box::new(f));
    }

    // ---- teardown ----

    /// Close the store: join the save worker (any pending background save
    /// completes), stop the watch, perform a final synchronous save, then
    /// clear the map. The watch is torn down before the final save — with
    /// no subscription left there is no self-trigger to suppress, so the
    /// save cannot bounce back as a reload. Idempotent — a second call is
    /// a no-op. After close every accessor takes its "closed" branch
    /// instead of erroring.
    pub fn close(&mut self) -> Result<()> {
        if self.shared.is_closed() {
            return Ok(());
        }
        drop(self.trigger.take());
        drop(self.worker.take());
        drop(self.watcher.take());
        let result = self.shared.save_to_disk();
        self.shared.close();
        result
    }

    // ---- internal ----

    fn schedule_save(&self) {
        // A full channel means a save is already queued; it will cover us.
        if let Some(t) = &self.trigger {
            let _ = t.try_send(());
        }
    }
}

impl Drop for SettingsStore {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("final save of {} failed on close: {e}", self.shared.path.display());
        }
    }
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("path", &self.shared.path)
            .field("closed", &self.shared.is_closed())
            .finish_non_exhaustive()
    }
}

impl Shared {
    /// Serialize and write the map while suppression is up. The state lock
    /// is held across the write, so a snapshot always reflects every
    /// mutation that completed before the save started.
    fn save_to_disk(&self) -> Result<()> {
        let state = self.state.lock();
        let State::Open(map) = &*state else {
            return Ok(());
        };
        let bytes = self.serializer.serialize(map)?;
        let _guard = self.suppression.begin();
        atomic_write(&self.path, &bytes)
    }

    /// Replace the map wholesale from disk. `Ok(false)` when the store is
    /// closed — a closed store must not touch the file at all, so the check
    /// comes before the read. The state is re-checked after the read because
    /// a close can land while the file is being parsed.
    fn reload_from_disk(&self) -> Result<bool> {
        if self.is_closed() {
            return Ok(false);
        }
        let data = load(&self.path, &self.serializer)?;
        let mut state = self.state.lock();
        match &mut *state {
            State::Open(map) => {
                *map = data;
                Ok(true)
            }
            State::Closed => Ok(false),
        }
    }

    /// Watch-thread entry point: reload, then tell subscribers. A failed
    /// reload keeps the previous in-memory state and must never take the
    /// watch thread down with it.
    fn handle_external_change(&self) {
        match self.reload_from_disk() {
            Ok(true) => {
                for subscriber in self.reload_subscribers.lock().iter() {
                    subscriber();
                }
            }
            Ok(false) => {}
            Err(e) => {
                log::warn!(
                    "auto-reload of {} failed, keeping previous settings: {e}",
                    self.path.display()
                );
                for subscriber in self.reload_error_subscribers.lock().iter() {
                    subscriber(&e);
                }
            }
        }
    }

    fn is_closed(&self) -> bool {
        matches!(&*self.state.lock(), State::Closed)
    }

    fn close(&self) {
        *self.state.lock() = State::Closed;
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(Error::InvalidArgument("key must not be blank".into()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Configures and opens a [`SettingsStore`].
///
/// ```rust,no_run
/// use json_settings::SettingsStore;
///
/// let store = SettingsStore::builder("/tmp/myapp/settings.json")
///     .auto_reload(true)
///     .pretty(true)
///     .build()
///     .unwrap();
/// ```
pub struct SettingsStoreBuilder {
    path: PathBuf,
    auto_reload: bool,
    pretty: bool,
}

impl SettingsStoreBuilder {
    fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            auto_reload: false,
            pretty: false,
        }
    }

    /// Watch the backing file and reload whenever it changes externally
    /// (default: off). The watch covers the parent directory filtered to
    /// the file name, never subdirectories, and lives as long as the store.
    pub fn auto_reload(mut self, yes: bool) -> Self {
        self.auto_reload = yes;
        self
    }

    /// Write human-readable JSON with indentation (default: compact).
    pub fn pretty(mut self, yes: bool) -> Self {
        self.pretty = yes;
        self
    }

    /// Open the store: create parent directories, create the file empty if
    /// absent or load it if present, then start the save worker and (if
    /// requested) the watch.
    ///
    /// A blank path is `InvalidArgument`; read or parse failures of an
    /// existing file abort construction.
    pub fn build(self) -> Result<SettingsStore> {
        if self.path.as_os_str().is_empty() || self.path.to_string_lossy().trim().is_empty() {
            return Err(Error::InvalidArgument("path must not be blank".into()));
        }

        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }

        let serializer = if self.pretty {
            JsonSerializer::pretty()
        } else {
            JsonSerializer::new()
        };

        // A fresh file stays zero bytes until the first save; the map
        // starts empty rather than being parsed out of it.
        let data = if self.path.exists() {
            load(&self.path, &serializer)?
        } else {
            std::fs::File::create(&self.path)?;
            HashMap::new()
        };

        let shared = Arc::new(Shared {
            path: self.path,
            serializer,
            suppression: Arc::new(Suppression::default()),
            state: Mutex::new(State::Open(data)),
            reload_subscribers: Mutex::new(Vec::new()),
            reload_error_subscribers: Mutex::new(Vec::new()),
        });

        let (trigger, rx) = mpsc::sync_channel(1);
        let worker_shared = Arc::clone(&shared);
        let worker = SaveWorker::start(
            move || {
                if let Err(e) = worker_shared.save_to_disk() {
                    log::warn!(
                        "background save of {} failed: {e}",
                        worker_shared.path.display()
                    );
                }
            },
            rx,
        );

        let watcher = if self.auto_reload {
            let reload_shared = Arc::clone(&shared);
            Some(FileWatcher::start(
                &shared.path,
                Arc::clone(&shared.suppression),
                move || reload_shared.handle_external_change(),
            )?)
        } else {
            None
        };

        Ok(SettingsStore {
            shared,
            watcher,
            worker: Some(worker),
            trigger: Some(trigger),
        })
    }
}

impl std::fmt::Debug for SettingsStoreBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStoreBuilder")
            .field("path", &self.path)
            .field("auto_reload", &self.auto_reload)
            .field("pretty", &self.pretty)
            .finish()
    }
}
