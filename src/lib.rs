//! JSON-file-backed settings store with optional auto-reload.
//!
//! One store, one file: a flat map of string keys to JSON values, loaded
//! whole and saved whole. Optionally the store watches its own file and
//! reloads when something else writes it, while its own saves are
//! suppressed from the watch so they never bounce back as reloads.
//!
//! ```rust,no_run
//! use json_settings::SettingsStore;
//!
//! let mut store = SettingsStore::open("/tmp/myapp/settings.json").unwrap();
//! store.try_set("theme", "dark", true).unwrap();
//! if let Some((kind, value)) = store.try_get("theme").unwrap() {
//!     println!("theme is {value} ({kind})");
//! }
//! store.close().unwrap();
//! ```
//!
//! **Single-process only.** Auto-reload follows writes made by other
//! processes, but nothing coordinates concurrent writers. Use advisory file
//! locking or a real database if several processes must write.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod path;
pub mod persist;
pub mod serializer;
pub mod store;
pub mod value;
pub mod watch;
pub mod worker;

pub use error::{Error, Result};
pub use store::{SettingsStore, SettingsStoreBuilder};
pub use value::ValueKind;
