//! Simulated BIDS dataset for tests and trial runs.
//!
//! Builds a raw tree of CSV recordings with sidecars and volume-trigger
//! event tables, shaped like the datasets the batch runner consumes.

use std::path::{Path, PathBuf};

use crate::error::Result;

const SIDECAR_TEMPLATE: &str = r#"{
  "Manufacturer": "Brain Products",
  "ManufacturersModelName": "BrainAmp DC",
  "CapManufacturer": "EasyCap",
  "CapManufacturersModelName": "M1-ext",
  "PowerLineFrequency": 50,
  "EEGReference": "single electrode placed on FCz",
  "EEGGround": "placed on AFz""#;

/// Builder for a dummy BIDS dataset rooted at a caller-supplied directory.
pub struct DummyDataset {
    root: PathBuf,
    n_subjects: usize,
    n_sessions: usize,
    n_runs: usize,
    data_folder: String,
    task: String,
    sfreq: f64,
    duration_secs: f64,
    n_channels: usize,
    n_triggers: usize,
}

impl DummyDataset {
    pub fn new(root: impl AsRef<Path>) -> Self {
        DummyDataset {
            root: root.as_ref().to_path_buf(),
            n_subjects: 1,
            n_sessions: 1,
            n_runs: 1,
            data_folder: "RAW".to_string(),
            task: "checker".to_string(),
            sfreq: 256.0,
            duration_secs: 2.0,
            n_channels: 8,
            n_triggers: 10,
        }
    }

    pub fn subjects(mut self, n: usize) -> Self {
        self.n_subjects = n;
        self
    }

    pub fn sessions(mut self, n: usize) -> Self {
        self.n_sessions = n;
        self
    }

    pub fn runs(mut self, n: usize) -> Self {
        self.n_runs = n;
        self
    }

    pub fn data_folder(mut self, name: &str) -> Self {
        self.data_folder = name.to_string();
        self
    }

    pub fn task(mut self, name: &str) -> Self {
        self.task = name.to_string();
        self
    }

    pub fn sfreq(mut self, sfreq: f64) -> Self {
        self.sfreq = sfreq;
        self
    }

    pub fn duration(mut self, secs: f64) -> Self {
        self.duration_secs = secs;
        self
    }

    pub fn channels(mut self, n: usize) -> Self {
        self.n_channels = n;
        self
    }

    pub fn triggers(mut self, n: usize) -> Self {
        self.n_triggers = n;
        self
    }

    /// Write the dataset and return the raw tree path
    /// (`<root>/<data_folder>`).
    pub fn create(&self) -> Result<PathBuf> {
        let bids_path = self.root.join(&self.data_folder);
        std::fs::create_dir_all(&bids_path)?;

        std::fs::write(
            bids_path.join("dataset_description.json"),
            concat!(
                "{\n",
                "  \"Name\": \"THIS IS A DUMMY DATASET\",\n",
                "  \"BIDSVersion\": \"1.9.0\",\n",
                "  \"License\": \"CC0\",\n",
                "  \"Authors\": [\"Jane Doe\", \"John Doe\"]\n",
                "}\n"
            ),
        )?;

        let mut participants = String::from("participant_id\tage\n");
        for sub_id in 1..=self.n_subjects {
            let subject = format!("sub-{:03}", sub_id);
            participants.push_str(&format!("{}\t{}\n", subject, 20 + sub_id));

            for ses_id in 1..=self.n_sessions {
                let session = format!("ses-{:03}", ses_id);
                for run_id in 1..=self.n_runs {
                    let run = format!("run-{:03}", run_id);
                    let eeg_dir = bids_path.join(&subject).join(&session).join("eeg");
                    std::fs::create_dir_all(&eeg_dir)?;

                    let stem = format!(
                        "{}_{}_task-{}_{}_eeg",
                        subject, session, self.task, run
                    );
                    self.write_signal(&eeg_dir, &stem, sub_id * 100 + ses_id * 10 + run_id)?;
                    self.write_events(&eeg_dir, &stem)?;
                    self.write_sidecar(&eeg_dir, &stem)?;
                }
            }
        }

        std::fs::write(bids_path.join("participants.tsv"), participants)?;
        log::debug!("dummy dataset created at {}", bids_path.display());
        Ok(bids_path)
    }

    fn trigger_onsets(&self) -> Vec<f64> {
        (0..self.n_triggers)
            .map(|i| (i + 1) as f64 * self.duration_secs / (self.n_triggers + 1) as f64)
            .collect()
    }

    fn write_signal(&self, dir: &Path, stem: &str, seed: usize) -> Result<()> {
        let n_samples = (self.duration_secs * self.sfreq) as usize;
        let trigger_samples: Vec<usize> = self
            .trigger_onsets()
            .iter()
            .map(|&o| (o * self.sfreq).round() as usize)
            .collect();

        let mut rng = seed as u64;
        let mut next_noise = || {
            rng = rng
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((rng >> 33) as f64 / (1u64 << 31) as f64) - 0.5
        };

        let header: Vec<String> = (1..=self.n_channels)
            .map(|c| format!("ch{:02}", c))
            .collect();
        let mut csv = header.join(",");
        csv.push('\n');

        for t in 0..n_samples {
            let secs = t as f64 / self.sfreq;
            // Periodic gradient-like burst right after each volume trigger.
            let in_burst = trigger_samples.iter().any(|&s| t >= s && t < s + 4);
            let artifact = if in_burst { 5.0 } else { 0.0 };
            let row: Vec<String> = (0..self.n_channels)
                .map(|c| {
                    let carrier =
                        (2.0 * std::f64::consts::PI * (8.0 + c as f64) * secs).sin();
                    format!("{:.6}", carrier + 0.1 * next_noise() + artifact)
                })
                .collect();
            csv.push_str(&row.join(","));
            csv.push('\n');
        }

        std::fs::write(dir.join(format!("{}.csv", stem)), csv)?;
        Ok(())
    }

    fn write_events(&self, dir: &Path, stem: &str) -> Result<()> {
        if self.n_triggers == 0 {
            return Ok(());
        }
        let base = stem.trim_end_matches("_eeg");
        let mut tsv = String::from("onset\tduration\ttrial_type\n");
        for onset in self.trigger_onsets() {
            tsv.push_str(&format!("{:.4}\t0.0\tR128\n", onset));
        }
        std::fs::write(dir.join(format!("{}_events.tsv", base)), tsv)?;
        Ok(())
    }

    fn write_sidecar(&self, dir: &Path, stem: &str) -> Result<()> {
        let content = format!(
            "{},\n  \"SamplingFrequency\": {},\n  \"TaskName\": \"{}\"\n}}\n",
            SIDECAR_TEMPLATE, self.sfreq, self.task
        );
        std::fs::write(dir.join(format!("{}.json", stem)), content)?;
        Ok(())
    }
}
