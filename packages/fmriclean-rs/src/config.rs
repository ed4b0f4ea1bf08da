//! Pipeline configuration.
//!
//! [`CleanConfig`] replaces the module-level dataset paths and layout
//! globals of earlier drafts: every knob is passed explicitly into the
//! pipeline driver at construction.

use crate::io;

/// Configuration for one batch of cleaning runs.
#[derive(Debug, Clone)]
pub struct CleanConfig {
    /// Extensions indexed as raw recordings.
    pub extensions: Vec<String>,

    /// Extension of persisted processed-signal files.
    ///
    /// Default: `"st"`.
    pub output_extension: String,

    /// Sampling frequency assumed when a recording has no sidecar
    /// declaring one.
    pub default_sfreq: f64,

    /// Task labels recorded with scanner gradients switched on; these
    /// recordings receive gradient-artifact removal before the cardiac
    /// stage.
    pub gradient_tasks: Vec<String>,

    /// Task labels recorded without gradients; these skip the gradient
    /// stage but are otherwise cleaned the same way.
    pub no_gradient_tasks: Vec<String>,

    pub stage: StageConfig,
}

impl Default for CleanConfig {
    fn default() -> Self {
        CleanConfig {
            extensions: vec!["csv".to_string(), "txt".to_string(), io::OUTPUT_EXTENSION.to_string()],
            output_extension: io::OUTPUT_EXTENSION.to_string(),
            default_sfreq: io::DEFAULT_SFREQ,
            gradient_tasks: vec!["checker".to_string()],
            no_gradient_tasks: vec!["checkeroff".to_string()],
            stage: StageConfig::default(),
        }
    }
}

/// Tunables for the artifact-removal stages.
#[derive(Debug, Clone)]
pub struct StageConfig {
    pub gradient: GradientConfig,
    pub bcg: BcgConfig,
    pub prep: PrepConfig,
    pub asr: AsrConfig,
}

impl Default for StageConfig {
    fn default() -> Self {
        StageConfig {
            gradient: GradientConfig::default(),
            bcg: BcgConfig::default(),
            prep: PrepConfig::default(),
            asr: AsrConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GradientConfig {
    /// Annotation description marking scanner volume triggers.
    ///
    /// Default: `"R128"` (BrainAmp marker naming).
    pub trigger_name: String,
}

impl Default for GradientConfig {
    fn default() -> Self {
        GradientConfig {
            trigger_name: "R128".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BcgConfig {
    /// Width of the moving-average window subtracted from each channel,
    /// in seconds.
    pub window_secs: f64,
}

impl Default for BcgConfig {
    fn default() -> Self {
        BcgConfig { window_secs: 0.25 }
    }
}

#[derive(Debug, Clone)]
pub struct PrepConfig {
    /// Channels whose variance z-score exceeds this magnitude are flagged
    /// bad and interpolated before re-referencing.
    pub bad_z: f64,
}

impl Default for PrepConfig {
    fn default() -> Self {
        PrepConfig { bad_z: 3.0 }
    }
}

#[derive(Debug, Clone)]
pub struct AsrConfig {
    /// Analysis window in seconds.
    pub window_secs: f64,
    /// Windows whose RMS exceeds `cutoff` times the per-channel
    /// calibration RMS are attenuated back to the cutoff envelope.
    pub cutoff: f64,
}

impl Default for AsrConfig {
    fn default() -> Self {
        AsrConfig {
            window_secs: 0.5,
            cutoff: 5.0,
        }
    }
}
