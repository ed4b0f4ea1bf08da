//! Ballistocardiogram suppression by moving-average subtraction.
//!
//! The cardiac-driven body motion shows up as a slow, high-amplitude
//! deflection on every channel. Subtracting a centered moving mean
//! removes that drift while leaving faster EEG activity in place.

use crate::config::StageConfig;
use crate::error::{CleanError, Result};
use crate::signal::SignalBuffer;
use crate::transform::{SignalTransform, StageKind};

pub struct BcgRemover;

impl SignalTransform for BcgRemover {
    fn kind(&self) -> StageKind {
        StageKind::BcgRemoval
    }

    fn apply(&self, signal: SignalBuffer, cfg: &StageConfig) -> Result<SignalBuffer> {
        let tag = self.kind().tag();
        if signal.n_samples() == 0 {
            return Err(CleanError::transform(tag, "empty signal"));
        }

        let half = ((cfg.bcg.window_secs * signal.sfreq) as usize / 2).max(1);
        let mut out = signal;
        for channel in out.data.iter_mut() {
            let n = channel.len();
            let mut prefix = vec![0.0; n + 1];
            for i in 0..n {
                prefix[i + 1] = prefix[i] + channel[i];
            }
            for i in 0..n {
                let lo = i.saturating_sub(half);
                let hi = (i + half + 1).min(n);
                let mean = (prefix[hi] - prefix[lo]) / (hi - lo) as f64;
                channel[i] -= mean;
            }
        }
        Ok(out)
    }
}
