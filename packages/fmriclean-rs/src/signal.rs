use serde::{Deserialize, Serialize};

use crate::error::{CleanError, Result};

/// One marker on the recording timeline (volume triggers, heartbeats).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Onset in seconds from the start of the recording.
    pub onset: f64,
    /// Duration in seconds.
    pub duration: f64,
    pub description: String,
}

/// In-memory multichannel time series plus the metadata the cleaning
/// stages need. Each transform stage takes ownership of the previous
/// buffer and returns a new one; buffers are never shared across
/// recordings.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalBuffer {
    pub channel_names: Vec<String>,
    /// Channel-major samples: `data[ch][t]`.
    pub data: Vec<Vec<f64>>,
    /// Sampling frequency in Hz.
    pub sfreq: f64,
    pub annotations: Vec<Annotation>,
}

impl SignalBuffer {
    pub fn new(channel_names: Vec<String>, data: Vec<Vec<f64>>, sfreq: f64) -> Result<Self> {
        if channel_names.len() != data.len() {
            return Err(CleanError::InvalidParameter(format!(
                "{} channel names for {} data channels",
                channel_names.len(),
                data.len()
            )));
        }
        if let Some(first) = data.first() {
            if data.iter().any(|ch| ch.len() != first.len()) {
                return Err(CleanError::InvalidParameter(
                    "channels differ in sample count".to_string(),
                ));
            }
        }
        if !(sfreq > 0.0) {
            return Err(CleanError::InvalidParameter(format!(
                "sampling frequency must be positive, got {}",
                sfreq
            )));
        }

        Ok(SignalBuffer {
            channel_names,
            data,
            sfreq,
            annotations: Vec::new(),
        })
    }

    pub fn with_annotations(mut self, annotations: Vec<Annotation>) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn n_channels(&self) -> usize {
        self.data.len()
    }

    pub fn n_samples(&self) -> usize {
        self.data.first().map(|ch| ch.len()).unwrap_or(0)
    }

    pub fn duration_secs(&self) -> f64 {
        self.n_samples() as f64 / self.sfreq
    }
}
