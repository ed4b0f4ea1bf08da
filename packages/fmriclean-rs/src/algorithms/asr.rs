//! Artifact subspace reconstruction, windowed-RMS variant.
//!
//! Calibration takes the median RMS over fixed windows per channel;
//! windows whose RMS exceeds a cutoff multiple of that calibration are
//! scaled back onto the cutoff envelope.

use crate::config::StageConfig;
use crate::error::{CleanError, Result};
use crate::signal::SignalBuffer;
use crate::transform::{SignalTransform, StageKind};

pub struct AsrReconstructor;

fn rms(window: &[f64]) -> f64 {
    let sum: f64 = window.iter().map(|v| v * v).sum();
    (sum / window.len() as f64).sqrt()
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

impl SignalTransform for AsrReconstructor {
    fn kind(&self) -> StageKind {
        StageKind::Asr
    }

    fn apply(&self, signal: SignalBuffer, cfg: &StageConfig) -> Result<SignalBuffer> {
        let tag = self.kind().tag();
        if signal.n_samples() == 0 {
            return Err(CleanError::transform(tag, "empty signal"));
        }

        let window = ((cfg.asr.window_secs * signal.sfreq) as usize).max(1);
        let mut out = signal;
        for channel in out.data.iter_mut() {
            let mut window_rms: Vec<f64> =
                channel.chunks(window).map(rms).collect();
            let calibration = median(&mut window_rms);
            if calibration == 0.0 {
                continue;
            }
            let cutoff = cfg.asr.cutoff * calibration;

            for chunk in channel.chunks_mut(window) {
                let level = rms(chunk);
                if level > cutoff {
                    let scale = cutoff / level;
                    for value in chunk.iter_mut() {
                        *value *= scale;
                    }
                }
            }
        }
        Ok(out)
    }
}
