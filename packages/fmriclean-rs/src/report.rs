use std::io::Write;
use std::path::Path;

use crate::error::{CleanError, Result};

/// Batch report filename for recordings cleaned without error.
pub const PROCESSED_REPORT: &str = "processed.txt";

/// Batch report filename for recordings that failed.
pub const FAILED_REPORT: &str = "not_processed.txt";

/// Append one newline-terminated record to a report file.
///
/// The destination must be a concrete file path; `None` or a directory is
/// rejected with [`CleanError::InvalidDestination`] rather than written to
/// some default location.
pub fn write_report(message: &str, destination: Option<&Path>) -> Result<()> {
    let path = destination.ok_or_else(|| {
        CleanError::InvalidDestination("no destination given".to_string())
    })?;
    if path.as_os_str().is_empty() || path.is_dir() {
        return Err(CleanError::InvalidDestination(path.display().to_string()));
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    file.write_all(message.as_bytes())?;
    file.write_all(b"\n")?;
    Ok(())
}
