use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CleanError, Result};

/// BIDS entity labels parsed from a recording filename of the form
/// `sub-<label>_ses-<label>_task-<label>_run-<label>_<modality>.<ext>`.
///
/// Labels are stored without their key prefixes (`"001"`, not `"sub-001"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entities {
    pub subject: String,
    pub session: String,
    pub task: Option<String>,
    pub run: Option<String>,
    pub modality: String,
}

impl Entities {
    /// Parse entities from a filename stem. Returns `None` when the stem
    /// does not carry at least a subject, a session, and a modality.
    pub fn from_stem(stem: &str) -> Option<Self> {
        let mut subject = None;
        let mut session = None;
        let mut task = None;
        let mut run = None;
        let mut modality = None;

        for part in stem.split('_') {
            match part.split_once('-') {
                Some(("sub", label)) => subject = Some(label.to_string()),
                Some(("ses", label)) => session = Some(label.to_string()),
                Some(("task", label)) => task = Some(label.to_string()),
                Some(("run", label)) => run = Some(label.to_string()),
                Some(_) => {}
                // The keyless trailing part is the modality (datatype) suffix.
                None => modality = Some(part.to_string()),
            }
        }

        Some(Entities {
            subject: subject?,
            session: session?,
            task,
            run,
            modality: modality?,
        })
    }
}

/// Identifies one source signal file inside an indexed dataset.
///
/// Immutable once built from the dataset index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingDescriptor {
    /// Root of the raw-data tree this recording was indexed from.
    pub root: PathBuf,
    /// Absolute path of the source signal file.
    pub path: PathBuf,
    pub entities: Entities,
    pub extension: String,
}

impl RecordingDescriptor {
    pub fn from_path(root: &Path, path: &Path) -> Result<Self> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| CleanError::Parse(format!("recording filename: {}", path.display())))?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_string();
        let entities = Entities::from_stem(stem).ok_or_else(|| {
            CleanError::Parse(format!("BIDS entities from filename: {}", path.display()))
        })?;

        Ok(RecordingDescriptor {
            root: root.to_path_buf(),
            path: path.to_path_buf(),
            entities,
            extension,
        })
    }

    /// Source filename including extension.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Source filename without extension.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
