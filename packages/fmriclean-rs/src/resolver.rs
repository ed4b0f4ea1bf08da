//! Derivatives path resolution.
//!
//! Maps a source recording path plus its provenance ledger onto the
//! parallel derivatives tree:
//! `<root>/DERIVATIVES[/<tag1_tag2_...>]/<subject>/<session>/<modality>`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{CleanError, Result};
use crate::provenance::ProvenanceLedger;

/// Literal name of the derivatives tree, replacing the raw-data segment.
pub const DERIVATIVES_DIRNAME: &str = "DERIVATIVES";

fn raw_segment_index(parts: &[OsString]) -> Option<usize> {
    parts
        .iter()
        .position(|p| p.to_string_lossy().to_lowercase().contains("raw"))
}

/// Derive the derivatives directory for a recording, without touching the
/// filesystem.
///
/// The path segment identifying the raw-data root (matched
/// case-insensitively by the substring "raw") is replaced with
/// `DERIVATIVES`; for a non-empty ledger one segment equal to
/// `ledger.as_folder_name()` is inserted directly after it. The
/// subject/session/modality segments are carried over unchanged, so for a
/// fixed source path and ledger contents the result is a pure function.
pub fn derive_path(source_path: &Path, ledger: &ProvenanceLedger) -> Result<PathBuf> {
    let mut parts: Vec<OsString> = source_path
        .components()
        .map(|c| c.as_os_str().to_os_string())
        .collect();

    let raw_idx = raw_segment_index(&parts)
        .ok_or_else(|| CleanError::DatasetLayout(source_path.display().to_string()))?;
    parts[raw_idx] = OsString::from(DERIVATIVES_DIRNAME);
    if !ledger.is_empty() {
        parts.insert(raw_idx + 1, OsString::from(ledger.as_folder_name()));
    }

    let mut rebuilt = PathBuf::new();
    for part in &parts {
        rebuilt.push(part);
    }
    let dir = rebuilt
        .parent()
        .ok_or_else(|| CleanError::DatasetLayout(source_path.display().to_string()))?
        .to_path_buf();
    Ok(dir)
}

/// Derive the derivatives directory and create it if absent.
///
/// Creation is recursive and idempotent; existing content at the location
/// is never deleted or truncated.
pub fn resolve(source_path: &Path, ledger: &ProvenanceLedger) -> Result<PathBuf> {
    let dir = derive_path(source_path, ledger)?;
    std::fs::create_dir_all(&dir)?;
    log::debug!("resolved derivatives location: {}", dir.display());
    Ok(dir)
}

/// Top of the derivatives tree for a raw-data root (`.../RAW` ->
/// `.../DERIVATIVES`). Batch reports live here.
pub fn derivatives_root(raw_root: &Path) -> Result<PathBuf> {
    let parts: Vec<OsString> = raw_root
        .components()
        .map(|c| c.as_os_str().to_os_string())
        .collect();
    let raw_idx = raw_segment_index(&parts)
        .ok_or_else(|| CleanError::DatasetLayout(raw_root.display().to_string()))?;

    let mut rebuilt = PathBuf::new();
    for part in &parts[..raw_idx] {
        rebuilt.push(part);
    }
    rebuilt.push(DERIVATIVES_DIRNAME);
    Ok(rebuilt)
}
