//! Discovery of saved portfolio files in a data directory

use crate::error::{CapTrackError, Result};
use std::fs;
use std::path::Path;

/// List the stems of files in `dir` whose extension is `extension`.
///
/// The extension may be given with or without its leading dot. Names come
/// back sorted; subdirectories are ignored.
pub fn list_names(dir: impl AsRef<Path>, extension: &str) -> Result<Vec<String>> {
    let dir = dir.as_ref();
    let extension = extension.trim_start_matches('.');

    let entries = fs::read_dir(dir).map_err(|e| {
        CapTrackError::DirectoryUnavailable(format!("{}: {}", dir.display(), e))
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| ext == extension);
        if !matches {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            names.push(stem.to_string());
        }
    }

    names.sort();
    log::debug!("Found {} .{} files in {}", names.len(), extension, dir.display());
    Ok(names)
}
