use std::path::{Path, PathBuf};

use crate::entities::RecordingDescriptor;
use crate::error::{CleanError, Result};

/// What happened to the sidecar during propagation. A missing source
/// sidecar is an observability note, never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidecarOutcome {
    Copied(PathBuf),
    Missing,
}

/// Path of the JSON sidecar paired with a signal file by filename stem.
pub fn sidecar_path(signal_path: &Path) -> PathBuf {
    signal_path.with_extension("json")
}

/// Copy the recording's sidecar into the resolved derivatives directory.
///
/// The sidecar is looked up next to the source recording itself and copied
/// byte-for-byte under its own filename. When absent, nothing is written
/// and the condition is logged.
pub fn propagate(recording: &RecordingDescriptor, derivatives_dir: &Path) -> Result<SidecarOutcome> {
    let source = sidecar_path(&recording.path);
    if !source.is_file() {
        log::warn!("no sidecar found next to {}", recording.path.display());
        return Ok(SidecarOutcome::Missing);
    }

    let file_name = source
        .file_name()
        .ok_or_else(|| CleanError::Parse(format!("sidecar filename: {}", source.display())))?;
    let dest = derivatives_dir.join(file_name);
    std::fs::copy(&source, &dest)?;
    Ok(SidecarOutcome::Copied(dest))
}
