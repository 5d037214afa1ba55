//! Convenience path construction for settings files.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Join `base` with `subfolders` and `file_name`, creating the intermediate
/// directories, and return the resulting file path.
///
/// Handy for placing a settings file under a per-user application-data
/// directory:
///
/// ```rust,no_run
/// use json_settings::path::build_path;
///
/// let path = build_path("/home/alice/.config", &["myapp", "profiles"], "settings.json").unwrap();
/// assert!(path.ends_with("myapp/profiles/settings.json"));
/// ```
pub fn build_path(
    base: impl AsRef<Path>,
    subfolders: &[&str],
    file_name: &str,
) -> Result<PathBuf> {
    if file_name.trim().is_empty() {
        return Err(Error::InvalidArgument(
            "file name must not be blank".into(),
        ));
    }
    let mut dir = base.as_ref().to_path_buf();
    for sub in subfolders {
        dir.push(sub);
    }
    std::fs::create_dir_all(&dir)?;
    Ok(dir.join(file_name))
}
