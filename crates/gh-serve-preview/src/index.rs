//! Locate the document to open first inside a downloaded artifact.

use std::path::Path;
use walkdir::WalkDir;

use gh_serve_core::{Result, ServeError};

/// File name suffixes tried in order; an earlier suffix always wins.
pub const INDEX_SUFFIXES: [&str; 4] = ["index.html", "index.htm", ".html", ".htm"];

/// Path of the index document relative to `root`, `/`-separated.
///
/// Each suffix is searched depth-first in file-name order and the first
/// matching file wins. Returns an empty string when nothing matches, which
/// makes the preview URL point at the directory root.
pub fn find_index(root: &Path) -> Result<String> {
    for suffix in INDEX_SUFFIXES {
        if let Some(found) = find_suffix(root, suffix)? {
            return Ok(found);
        }
    }
    Ok(String::new())
}

fn find_suffix(root: &Path, suffix: &str) -> Result<Option<String>> {
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            ServeError::Cache {
                path,
                source: e.into(),
            }
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().ends_with(suffix) {
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            return Ok(Some(url_path(relative)));
        }
    }
    Ok(None)
}

fn url_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
