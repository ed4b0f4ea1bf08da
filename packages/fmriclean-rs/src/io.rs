//! Signal file I/O.
//!
//! Raw recordings enter the pipeline as ASCII (CSV/TXT, one column per
//! channel with a header row of channel names); sampling frequency comes
//! from the JSON sidecar's `SamplingFrequency` and annotations from the
//! BIDS `_events.tsv` next to the recording. Processed buffers are
//! persisted in a minimal self-describing container (`.st`): an 8-byte
//! little-endian header length, a JSON header, then channel-major f64
//! little-endian samples. Container files can re-enter the pipeline, so
//! chained runs compose.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CleanError, Result};
use crate::sidecar::sidecar_path;
use crate::signal::{Annotation, SignalBuffer};

/// Extension of persisted processed-signal files.
pub const OUTPUT_EXTENSION: &str = "st";

/// Sampling frequency assumed when no sidecar declares one.
pub const DEFAULT_SFREQ: f64 = 256.0;

#[derive(Debug, Serialize, Deserialize)]
struct ContainerHeader {
    sampling_frequency: f64,
    channel_names: Vec<String>,
    n_samples: usize,
    annotations: Vec<Annotation>,
}

/// Read a signal file, dispatching on extension.
pub fn read_signal(path: &Path, default_sfreq: f64) -> Result<SignalBuffer> {
    if !path.is_file() {
        return Err(CleanError::FileNotFound(path.display().to_string()));
    }
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    match ext.as_str() {
        "csv" => read_ascii(path, ',', default_sfreq),
        "txt" => read_ascii(path, '\t', default_sfreq),
        OUTPUT_EXTENSION => read_container(path),
        other => Err(CleanError::UnsupportedFileType(format!(
            "'{}' ({})",
            other,
            path.display()
        ))),
    }
}

fn read_ascii(path: &Path, delimiter: char, default_sfreq: f64) -> Result<SignalBuffer> {
    let content = std::fs::read_to_string(path)?;
    let mut lines = content.lines().filter(|l| !l.trim().is_empty());

    let header = lines
        .next()
        .ok_or_else(|| CleanError::Parse(format!("empty signal file: {}", path.display())))?;
    let channel_names: Vec<String> = header
        .split(delimiter)
        .map(|name| name.trim().to_string())
        .collect();

    let mut data: Vec<Vec<f64>> = vec![Vec::new(); channel_names.len()];
    for (row, line) in lines.enumerate() {
        let mut count = 0usize;
        for (col, token) in line.split(delimiter).enumerate() {
            let value = token.trim().parse::<f64>().map_err(|_| {
                CleanError::Parse(format!(
                    "sample '{}' at row {} of {}",
                    token.trim(),
                    row + 1,
                    path.display()
                ))
            })?;
            if col >= data.len() {
                return Err(CleanError::Parse(format!(
                    "row {} of {} has more columns than the header",
                    row + 1,
                    path.display()
                )));
            }
            data[col].push(value);
            count += 1;
        }
        if count != channel_names.len() {
            return Err(CleanError::Parse(format!(
                "row {} of {} has {} columns, expected {}",
                row + 1,
                path.display(),
                count,
                channel_names.len()
            )));
        }
    }

    let sfreq = sidecar_sampling_frequency(path).unwrap_or(default_sfreq);
    let annotations = read_events(path)?;
    Ok(SignalBuffer::new(channel_names, data, sfreq)?.with_annotations(annotations))
}

/// Sampling frequency declared by the recording's JSON sidecar, if any.
pub fn sidecar_sampling_frequency(signal_path: &Path) -> Option<f64> {
    let sidecar = sidecar_path(signal_path);
    let content = std::fs::read_to_string(sidecar).ok()?;
    let value: serde_json::Value = serde_json::from_str(&content).ok()?;
    value.get("SamplingFrequency")?.as_f64()
}

/// Path of the BIDS events table paired with a recording
/// (`..._eeg.csv` -> `..._events.tsv`).
pub fn events_path(signal_path: &Path) -> Option<PathBuf> {
    let stem = signal_path.file_stem()?.to_str()?;
    let (base, _modality) = stem.rsplit_once('_')?;
    Some(signal_path.with_file_name(format!("{}_events.tsv", base)))
}

fn read_events(signal_path: &Path) -> Result<Vec<Annotation>> {
    let path = match events_path(signal_path) {
        Some(p) if p.is_file() => p,
        _ => return Ok(Vec::new()),
    };

    let content = std::fs::read_to_string(&path)?;
    let mut annotations = Vec::new();
    for (row, line) in content.lines().enumerate() {
        if row == 0 || line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 3 {
            return Err(CleanError::Parse(format!(
                "events row {} of {}",
                row + 1,
                path.display()
            )));
        }
        let onset = fields[0].trim().parse::<f64>().map_err(|_| {
            CleanError::Parse(format!("event onset at row {} of {}", row + 1, path.display()))
        })?;
        let duration = fields[1].trim().parse::<f64>().map_err(|_| {
            CleanError::Parse(format!(
                "event duration at row {} of {}",
                row + 1,
                path.display()
            ))
        })?;
        annotations.push(Annotation {
            onset,
            duration,
            description: fields[2].trim().to_string(),
        });
    }
    Ok(annotations)
}

/// Persist a buffer to the container format.
///
/// The file is serialized fully in memory and written in one call, so the
/// target path never holds a half-written signal.
pub fn write_signal(signal: &SignalBuffer, path: &Path) -> Result<()> {
    let header = ContainerHeader {
        sampling_frequency: signal.sfreq,
        channel_names: signal.channel_names.clone(),
        n_samples: signal.n_samples(),
        annotations: signal.annotations.clone(),
    };
    let header_bytes = serde_json::to_vec(&header)
        .map_err(|e| CleanError::Parse(format!("container header: {}", e)))?;

    let data_len = signal.n_channels() * signal.n_samples() * 8;
    let mut out = Vec::with_capacity(8 + header_bytes.len() + data_len);
    out.extend_from_slice(&(header_bytes.len() as u64).to_le_bytes());
    out.extend_from_slice(&header_bytes);
    for channel in &signal.data {
        for value in channel {
            out.extend_from_slice(&value.to_le_bytes());
        }
    }
    std::fs::write(path, out)?;
    Ok(())
}

fn read_container(path: &Path) -> Result<SignalBuffer> {
    let bytes = std::fs::read(path)?;
    if bytes.len() < 8 {
        return Err(CleanError::Parse(format!(
            "container too small: {}",
            path.display()
        )));
    }
    let header_len = u64::from_le_bytes(bytes[..8].try_into().map_err(|_| {
        CleanError::Parse(format!("container header length: {}", path.display()))
    })?) as usize;
    if bytes.len() < 8 + header_len {
        return Err(CleanError::Parse(format!(
            "container header truncated: {}",
            path.display()
        )));
    }
    let header: ContainerHeader = serde_json::from_slice(&bytes[8..8 + header_len])
        .map_err(|e| CleanError::Parse(format!("container header of {}: {}", path.display(), e)))?;

    let n_channels = header.channel_names.len();
    let expected = 8 + header_len + n_channels * header.n_samples * 8;
    if bytes.len() != expected {
        return Err(CleanError::Parse(format!(
            "container data of {}: expected {} bytes, found {}",
            path.display(),
            expected,
            bytes.len()
        )));
    }

    let mut data = Vec::with_capacity(n_channels);
    let mut offset = 8 + header_len;
    for _ in 0..n_channels {
        let mut channel = Vec::with_capacity(header.n_samples);
        for _ in 0..header.n_samples {
            let raw: [u8; 8] = bytes[offset..offset + 8].try_into().map_err(|_| {
                CleanError::Parse(format!("container data: {}", path.display()))
            })?;
            channel.push(f64::from_le_bytes(raw));
            offset += 8;
        }
        data.push(channel);
    }

    Ok(
        SignalBuffer::new(header.channel_names, data, header.sampling_frequency)?
            .with_annotations(header.annotations),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_read_csv_with_sidecar_and_events() {
        let tmp = tempfile::tempdir().unwrap();
        let signal = tmp.path().join("sub-001_ses-001_task-test_run-001_eeg.csv");
        fs::write(&signal, "ch01,ch02\n0.5,1.0\n-0.5,2.0\n0.0,3.0\n").unwrap();
        fs::write(
            signal.with_extension("json"),
            r#"{"SamplingFrequency": 512}"#,
        )
        .unwrap();
        fs::write(
            tmp.path().join("sub-001_ses-001_task-test_run-001_events.tsv"),
            "onset\tduration\ttrial_type\n0.1\t0.0\tR128\n0.5\t0.0\tR128\n",
        )
        .unwrap();

        let buf = read_signal(&signal, DEFAULT_SFREQ).unwrap();
        assert_eq!(buf.channel_names, vec!["ch01", "ch02"]);
        assert_eq!(buf.n_samples(), 3);
        assert_eq!(buf.data[0], vec![0.5, -0.5, 0.0]);
        assert_eq!(buf.data[1], vec![1.0, 2.0, 3.0]);
        assert_eq!(buf.sfreq, 512.0);
        assert_eq!(buf.annotations.len(), 2);
        assert_eq!(buf.annotations[0].description, "R128");
    }

    #[test]
    fn test_read_csv_without_sidecar_uses_default_sfreq() {
        let tmp = tempfile::tempdir().unwrap();
        let signal = tmp.path().join("sub-001_ses-001_eeg.csv");
        fs::write(&signal, "ch01\n1.0\n").unwrap();

        let buf = read_signal(&signal, DEFAULT_SFREQ).unwrap();
        assert_eq!(buf.sfreq, DEFAULT_SFREQ);
        assert!(buf.annotations.is_empty());
    }

    #[test]
    fn test_read_rejects_unsupported_extension() {
        let tmp = tempfile::tempdir().unwrap();
        let signal = tmp.path().join("sub-001_ses-001_eeg.vhdr");
        fs::write(&signal, "Brain Vision Data Exchange Header File\n").unwrap();

        let result = read_signal(&signal, DEFAULT_SFREQ);
        assert!(matches!(result, Err(CleanError::UnsupportedFileType(_))));
    }

    #[test]
    fn test_read_missing_file() {
        let result = read_signal(Path::new("/nonexistent/sub-01_ses-01_eeg.csv"), DEFAULT_SFREQ);
        assert!(matches!(result, Err(CleanError::FileNotFound(_))));
    }

    #[test]
    fn test_read_rejects_ragged_rows() {
        let tmp = tempfile::tempdir().unwrap();
        let signal = tmp.path().join("sub-001_ses-001_eeg.csv");
        fs::write(&signal, "ch01,ch02\n1.0,2.0\n3.0\n").unwrap();
        assert!(matches!(
            read_signal(&signal, DEFAULT_SFREQ),
            Err(CleanError::Parse(_))
        ));
    }

    #[test]
    fn test_container_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("sub-001_ses-001_task-test_run-001_eeg.st");

        let original = SignalBuffer::new(
            vec!["ch01".into(), "ch02".into()],
            vec![vec![0.25, -1.5, 3.0], vec![0.0, 2.5, -0.125]],
            500.0,
        )
        .unwrap()
        .with_annotations(vec![Annotation {
            onset: 0.5,
            duration: 0.0,
            description: "R128".into(),
        }]);

        write_signal(&original, &path).unwrap();
        let restored = read_signal(&path, DEFAULT_SFREQ).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_container_rejects_truncated_data() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("sub-001_ses-001_eeg.st");

        let buf = SignalBuffer::new(vec!["ch01".into()], vec![vec![1.0, 2.0]], 256.0).unwrap();
        write_signal(&buf, &path).unwrap();
        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() - 4]).unwrap();

        assert!(matches!(
            read_signal(&path, DEFAULT_SFREQ),
            Err(CleanError::Parse(_))
        ));
    }

    #[test]
    fn test_events_path_rewrites_modality_suffix() {
        let path = Path::new("/d/RAW/sub-01_ses-01_task-t_run-01_eeg.csv");
        assert_eq!(
            events_path(path).unwrap(),
            Path::new("/d/RAW/sub-01_ses-01_task-t_run-01_events.tsv")
        );
    }
}
