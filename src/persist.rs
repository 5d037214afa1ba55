//! Disk I/O helpers: load from file and atomic write.
//!
//! The rename-over approach is close to atomic on most platforms; on FAT32
//! or network shares there are no hard guarantees. Single writer assumed —
//! this crate does no cross-process locking.

use crate::error::{Error, Result};
use crate::serializer::Serializer;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Reads and deserializes the file at `path`. A missing or zero-byte file
/// yields an empty map (a zero-byte file is not valid JSON, so it is never
/// handed to the serializer).
pub fn load<S: Serializer>(path: &Path, serializer: &S) -> Result<HashMap<String, Value>> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(e) => return Err(Error::Io(e.to_string())),
    };
    if bytes.is_empty() {
        return Ok(HashMap::new());
    }
    serializer.deserialize(&bytes)
}

/// Write `bytes` to `<path>.tmp` and then rename over `path`, so a crash
/// mid-write never leaves a half-written settings file behind.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
    let tmp = path.with_extension(format!("{ext}.tmp"));
    std::fs::write(&tmp, bytes).map_err(|e| Error::Io(e.to_string()))?;
    std::fs::rename(&tmp, path).map_err(|e| Error::Io(e.to_string()))?;
    Ok(())
}
