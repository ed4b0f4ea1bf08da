//! Gradient-artifact removal by template subtraction.
//!
//! MRI gradient switching repeats with every acquired volume, so the
//! artifact is phase-locked to the scanner's volume triggers. Averaging
//! the signal across trigger-locked epochs isolates the artifact
//! template, which is then subtracted at each occurrence.

use crate::config::StageConfig;
use crate::error::{CleanError, Result};
use crate::signal::SignalBuffer;
use crate::transform::{SignalTransform, StageKind};

pub struct GradientRemover;

impl SignalTransform for GradientRemover {
    fn kind(&self) -> StageKind {
        StageKind::GradientRemoval
    }

    fn apply(&self, signal: SignalBuffer, cfg: &StageConfig) -> Result<SignalBuffer> {
        let tag = self.kind().tag();
        let n_samples = signal.n_samples();

        let mut onsets: Vec<usize> = signal
            .annotations
            .iter()
            .filter(|a| a.description == cfg.gradient.trigger_name)
            .map(|a| (a.onset * signal.sfreq).round() as usize)
            .filter(|&s| s < n_samples)
            .collect();
        onsets.sort_unstable();
        onsets.dedup();

        if onsets.is_empty() {
            return Err(CleanError::transform(
                tag,
                format!(
                    "no '{}' trigger annotations in the recording",
                    cfg.gradient.trigger_name
                ),
            ));
        }

        // Epoch length: the smallest inter-trigger interval, or everything
        // after the trigger when only one exists.
        let epoch_len = onsets
            .windows(2)
            .map(|w| w[1] - w[0])
            .min()
            .unwrap_or(n_samples - onsets[0]);
        if epoch_len == 0 {
            return Err(CleanError::transform(tag, "triggers collapse to zero-length epochs"));
        }

        log::debug!(
            "{}: {} triggers, epoch length {} samples",
            tag,
            onsets.len(),
            epoch_len
        );

        let mut out = signal;
        for channel in out.data.iter_mut() {
            let mut template = vec![0.0; epoch_len];
            let mut count = 0usize;
            for &onset in &onsets {
                if onset + epoch_len <= channel.len() {
                    for (t, slot) in template.iter_mut().enumerate() {
                        *slot += channel[onset + t];
                    }
                    count += 1;
                }
            }
            if count == 0 {
                continue;
            }
            for slot in template.iter_mut() {
                *slot /= count as f64;
            }
            for &onset in &onsets {
                let end = (onset + epoch_len).min(channel.len());
                for t in onset..end {
                    channel[t] -= template[t - onset];
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::Annotation;

    fn trigger(onset: f64) -> Annotation {
        Annotation {
            onset,
            duration: 0.0,
            description: "R128".to_string(),
        }
    }

    #[test]
    fn test_requires_trigger_annotations() {
        let signal = SignalBuffer::new(vec!["ch01".into()], vec![vec![0.0; 100]], 100.0).unwrap();
        let result = GradientRemover.apply(signal, &StageConfig::default());
        match result {
            Err(CleanError::Transform { stage, .. }) => assert_eq!(stage, "GRAD"),
            other => panic!("expected transform failure, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_subtracts_repeating_artifact() {
        // A perfectly periodic artifact with period 10 samples, triggers at
        // every period: the template equals the artifact, so the cleaned
        // signal is flat.
        let sfreq = 100.0;
        let artifact = [0.0, 5.0, -5.0, 2.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let data: Vec<f64> = artifact.iter().cycle().take(100).copied().collect();
        let annotations: Vec<Annotation> = (0..10).map(|i| trigger(i as f64 * 0.1)).collect();

        let signal = SignalBuffer::new(vec!["ch01".into()], vec![data], sfreq)
            .unwrap()
            .with_annotations(annotations);
        let cleaned = GradientRemover.apply(signal, &StageConfig::default()).unwrap();

        assert!(cleaned.data[0].iter().all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn test_ignores_foreign_annotations() {
        let signal = SignalBuffer::new(vec!["ch01".into()], vec![vec![1.0; 50]], 100.0)
            .unwrap()
            .with_annotations(vec![Annotation {
                onset: 0.1,
                duration: 0.0,
                description: "heartbeat".to_string(),
            }]);
        assert!(GradientRemover.apply(signal, &StageConfig::default()).is_err());
    }
}
