//! Indexing of a BIDS-like raw-data tree.
//!
//! The dataset is consumed through one narrow interface: list the signal
//! files matching an extension filter and read their identifying entities
//! from the filename. Files whose names do not parse as BIDS entities are
//! skipped with a debug log, not errors.

use std::path::Path;

use crate::entities::RecordingDescriptor;
use crate::error::{CleanError, Result};

const MAX_DEPTH: usize = 6;

/// Recursively index `root`, returning one descriptor per matching
/// recording, sorted by path.
pub fn index_dataset(root: &Path, extensions: &[String]) -> Result<Vec<RecordingDescriptor>> {
    if !root.is_dir() {
        return Err(CleanError::FileNotFound(root.display().to_string()));
    }

    let mut recordings = Vec::new();
    walk(root, root, 0, extensions, &mut recordings);
    recordings.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(recordings)
}

fn walk(
    root: &Path,
    dir: &Path,
    depth: usize,
    extensions: &[String],
    recordings: &mut Vec<RecordingDescriptor>,
) {
    if depth > MAX_DEPTH {
        return;
    }

    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return,
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name();
        let name_str = name.to_string_lossy();

        // Skip hidden directories/files
        if name_str.starts_with('.') {
            continue;
        }

        if path.is_dir() {
            walk(root, &path, depth + 1, extensions, recordings);
        } else if path.is_file() {
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if !extensions.iter().any(|e| e == ext) {
                continue;
            }
            match RecordingDescriptor::from_path(root, &path) {
                Ok(rec) => recordings.push(rec),
                Err(e) => {
                    log::debug!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }
}
