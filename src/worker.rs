//! Background save worker for fire-and-forget persists.

use std::sync::mpsc;
use std::thread;

/// Background thread that runs the save closure each time it is nudged.
///
/// The store keeps the sender side of a bounded channel; `persist = true`
/// mutations do a non-blocking `try_send`. A nudge that arrives while a save
/// is already queued is dropped — the queued save will serialize the map
/// state current at the time it runs, so the mutation is still covered.
///
/// Dropping the store's sender disconnects the channel and the thread exits;
/// dropping the worker joins it, so an in-flight save always completes before
/// teardown moves on to the final synchronous save.
pub struct SaveWorker {
    join_handle: Option<thread::JoinHandle<()>>,
}

impl SaveWorker {
    /// Spawn a worker draining `rx`. The caller keeps the sender side and
    /// drops it when the store is done — that signals the worker to exit.
    pub fn start<F>(save_fn: F, rx: mpsc::Receiver<()>) -> Self
    where
        F: Fn() + Send + 'static,
    {
        let join_handle = thread::spawn(move || {
            while rx.recv().is_ok() {
                save_fn();
            }
        });
        Self {
            join_handle: Some(join_handle),
        }
    }
}

impl Drop for SaveWorker {
    fn drop(&mut self) {
        if let Some(h) = self.join_handle.take() {
            let _ = h.join();
        }
    }
}
