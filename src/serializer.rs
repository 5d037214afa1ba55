//! Serialization layer. Defaults to JSON via serde_json.
//!
//! Implement [`Serializer`] if you need a different on-disk format.

use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;

/// Converts map snapshots to/from bytes for persistence.
pub trait Serializer: Send + Sync {
    /// Encode a settings map to bytes.
    fn serialize(&self, data: &HashMap<String, Value>) -> Result<Vec<u8>>;

    /// Decode bytes back into a settings map.
    fn deserialize(&self, bytes: &[u8]) -> Result<HashMap<String, Value>>;
}

/// JSON serializer with optional pretty-printing.
#[derive(Clone, Default)]
pub struct JsonSerializer {
    pretty: bool,
}

impl JsonSerializer {
    /// Compact JSON (single line, no extra whitespace).
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretty-printed JSON with indentation — easier to edit by hand.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Serializer for JsonSerializer {
    fn serialize(&self, data: &HashMap<String, Value>) -> Result<Vec<u8>> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(data)
        } else {
            serde_json::to_vec(data)
        };
        bytes.map_err(Error::from)
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<HashMap<String, Value>> {
        serde_json::from_slice(bytes).map_err(Error::from)
    }
}
