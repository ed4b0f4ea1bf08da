//! Automated bad-channel handling and average re-referencing.
//!
//! Channels whose variance deviates strongly from the rest (or that are
//! flat) are interpolated as the mean of the remaining good channels,
//! then the whole montage is re-referenced to the average.

use crate::config::StageConfig;
use crate::error::{CleanError, Result};
use crate::signal::SignalBuffer;
use crate::transform::{SignalTransform, StageKind};

pub struct PrepReference;

fn channel_std(channel: &[f64]) -> f64 {
    let n = channel.len() as f64;
    let mean = channel.iter().sum::<f64>() / n;
    let var = channel.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    var.sqrt()
}

impl SignalTransform for PrepReference {
    fn kind(&self) -> StageKind {
        StageKind::Prep
    }

    fn apply(&self, signal: SignalBuffer, cfg: &StageConfig) -> Result<SignalBuffer> {
        let tag = self.kind().tag();
        if signal.n_channels() == 0 || signal.n_samples() == 0 {
            return Err(CleanError::transform(tag, "empty signal"));
        }

        let stds: Vec<f64> = signal.data.iter().map(|ch| channel_std(ch)).collect();
        let n = stds.len() as f64;
        let mean_std = stds.iter().sum::<f64>() / n;
        let spread = (stds.iter().map(|s| (s - mean_std).powi(2)).sum::<f64>() / n).sqrt();

        let bad: Vec<usize> = stds
            .iter()
            .enumerate()
            .filter(|(_, &s)| {
                s == 0.0 || (spread > 0.0 && ((s - mean_std) / spread).abs() > cfg.prep.bad_z)
            })
            .map(|(i, _)| i)
            .collect();

        if bad.len() == signal.n_channels() {
            return Err(CleanError::transform(tag, "every channel flagged bad"));
        }
        if !bad.is_empty() {
            let names: Vec<&str> = bad.iter().map(|&i| signal.channel_names[i].as_str()).collect();
            log::info!("{}: interpolating bad channels {:?}", tag, names);
        }

        let mut out = signal;
        let n_samples = out.n_samples();
        let good: Vec<usize> =
            (0..out.n_channels()).filter(|i| !bad.contains(i)).collect();

        for t in 0..n_samples {
            let good_mean =
                good.iter().map(|&i| out.data[i][t]).sum::<f64>() / good.len() as f64;
            for &i in &bad {
                out.data[i][t] = good_mean;
            }
            let all_mean =
                out.data.iter().map(|ch| ch[t]).sum::<f64>() / out.n_channels() as f64;
            for channel in out.data.iter_mut() {
                channel[t] -= all_mean;
            }
        }
        Ok(out)
    }
}
