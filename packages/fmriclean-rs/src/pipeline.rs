//! Pipeline driver.
//!
//! [`CleanerPipeline`] runs the transform stages over one recording,
//! checkpointing after every stage: the tag is appended to the ledger,
//! the derivatives location is resolved fresh from the updated ledger,
//! the sidecar is propagated, and the buffer is persisted. A failed
//! stage never updates the ledger.
//!
//! [`BatchRunner`] drives a whole dataset, one recording at a time;
//! failures are reported and never abort the batch.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::CleanConfig;
use crate::dataset::index_dataset;
use crate::entities::RecordingDescriptor;
use crate::error::{CleanError, Result};
use crate::io;
use crate::provenance::ProvenanceLedger;
use crate::report::{write_report, FAILED_REPORT, PROCESSED_REPORT};
use crate::resolver;
use crate::sidecar;
use crate::signal::SignalBuffer;
use crate::transform::{StageKind, StageRegistry};

/// Stage label used for read failures in reports and run states.
pub const READ_RAW_STAGE: &str = "READ_RAW";

/// Cooperative cancellation flag, honored at stage boundaries only: a
/// stage that has started always runs through its persistence step, so a
/// cancelled run never leaves a half-persisted checkpoint.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Where one pipeline run currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Init,
    Loaded,
    Staged { completed: usize },
    Done,
    Failed { stage: String },
}

/// A failure tied to the stage that was in progress.
#[derive(Debug)]
pub struct StageFailure {
    pub stage: String,
    pub error: CleanError,
}

impl StageFailure {
    fn new(stage: &str, error: CleanError) -> Self {
        StageFailure {
            stage: stage.to_string(),
            error,
        }
    }
}

/// Named stage sequences the batch runner can execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineChain {
    /// Gradient (when gated on) then cardiac removal.
    Cbin,
    /// Cbin followed by adaptive subspace reconstruction.
    CbinAsr,
    /// Cbin, automated re-referencing, then subspace reconstruction.
    Full,
}

impl PipelineChain {
    pub fn stages(&self, with_gradient: bool) -> Vec<StageKind> {
        let mut stages = Vec::new();
        if with_gradient {
            stages.push(StageKind::GradientRemoval);
        }
        stages.push(StageKind::BcgRemoval);
        match self {
            PipelineChain::Cbin => {}
            PipelineChain::CbinAsr => stages.push(StageKind::Asr),
            PipelineChain::Full => {
                stages.push(StageKind::Prep);
                stages.push(StageKind::Asr);
            }
        }
        stages
    }
}

/// Drives the transform stages over one recording.
pub struct CleanerPipeline<'a> {
    recording: RecordingDescriptor,
    config: &'a CleanConfig,
    registry: &'a StageRegistry,
    ledger: ProvenanceLedger,
    raw: Option<SignalBuffer>,
    state: RunState,
    cancel: Option<CancelToken>,
}

impl<'a> CleanerPipeline<'a> {
    pub fn new(
        recording: RecordingDescriptor,
        config: &'a CleanConfig,
        registry: &'a StageRegistry,
    ) -> Self {
        CleanerPipeline {
            recording,
            config,
            registry,
            ledger: ProvenanceLedger::new(),
            raw: None,
            state: RunState::Init,
            cancel: None,
        }
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn recording(&self) -> &RecordingDescriptor {
        &self.recording
    }

    pub fn ledger(&self) -> &ProvenanceLedger {
        &self.ledger
    }

    pub fn signal(&self) -> Option<&SignalBuffer> {
        self.raw.as_ref()
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Read the source recording into memory.
    pub fn read_raw(&mut self) -> Result<()> {
        match io::read_signal(&self.recording.path, self.config.default_sfreq) {
            Ok(signal) => {
                self.raw = Some(signal);
                self.state = RunState::Loaded;
                Ok(())
            }
            Err(e) => {
                self.state = RunState::Failed {
                    stage: READ_RAW_STAGE.to_string(),
                };
                Err(e)
            }
        }
    }

    /// Run one stage and checkpoint its result.
    ///
    /// The stage consumes the current buffer; on success the driver
    /// appends the stage tag, resolves the derivatives location from the
    /// now-updated ledger, propagates the sidecar, and persists the
    /// buffer. On failure the ledger is left exactly as it was.
    pub fn apply_stage(&mut self, kind: StageKind) -> Result<PathBuf> {
        let tag = kind.tag();
        let result = (|| {
            let transform = self.registry.get(kind).ok_or_else(|| {
                CleanError::transform(tag, "no implementation registered")
            })?;
            let signal = self.raw.take().ok_or_else(|| {
                CleanError::transform(tag, "raw data has not been read")
            })?;
            let cleaned = transform.apply(signal, &self.config.stage)?;
            self.raw = Some(cleaned);
            self.ledger.append(tag)?;
            self.checkpoint()
        })();

        match result {
            Ok(dir) => {
                self.state = RunState::Staged {
                    completed: self.ledger.len(),
                };
                Ok(dir)
            }
            Err(e) => {
                self.state = RunState::Failed {
                    stage: tag.to_string(),
                };
                Err(e)
            }
        }
    }

    /// Resolve the derivatives location from the current ledger, copy the
    /// sidecar there, and persist the current buffer under the original
    /// stem with the processed-signal extension.
    pub fn checkpoint(&self) -> Result<PathBuf> {
        let dir = resolver::resolve(&self.recording.path, &self.ledger)?;
        sidecar::propagate(&self.recording, &dir)?;

        let signal = self.raw.as_ref().ok_or_else(|| {
            CleanError::InvalidParameter("no signal buffer to persist".to_string())
        })?;
        let filename = format!("{}.{}", self.recording.stem(), self.config.output_extension);
        io::write_signal(signal, &dir.join(filename))?;
        Ok(dir)
    }

    /// Run a whole chain, reading the raw data first if needed.
    pub fn run_chain(
        &mut self,
        chain: PipelineChain,
        with_gradient: bool,
    ) -> std::result::Result<(), StageFailure> {
        if self.raw.is_none() {
            self.read_raw()
                .map_err(|e| StageFailure::new(READ_RAW_STAGE, e))?;
        }
        for kind in chain.stages(with_gradient) {
            if self.cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
                return Err(StageFailure::new(kind.tag(), CleanError::Cancelled));
            }
            self.apply_stage(kind)
                .map_err(|e| StageFailure::new(kind.tag(), e))?;
        }
        self.state = RunState::Done;
        Ok(())
    }

    /// Consume the pipeline, yielding the processed buffer and the final
    /// ledger.
    pub fn into_parts(self) -> (Option<SignalBuffer>, ProvenanceLedger) {
        (self.raw, self.ledger)
    }
}

/// Outcome counts for one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Runs the configured chain over every recording under a raw-data root.
pub struct BatchRunner {
    raw_root: PathBuf,
    config: CleanConfig,
    registry: StageRegistry,
    chain: PipelineChain,
    cancel: CancelToken,
}

impl BatchRunner {
    pub fn new(raw_root: impl Into<PathBuf>, config: CleanConfig) -> Self {
        BatchRunner {
            raw_root: raw_root.into(),
            config,
            registry: StageRegistry::with_defaults(),
            chain: PipelineChain::Full,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_registry(mut self, registry: StageRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_chain(mut self, chain: PipelineChain) -> Self {
        self.chain = chain;
        self
    }

    /// Token a caller can trip to stop the batch at the next stage
    /// boundary.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Index the recordings this batch would process.
    pub fn index(&self) -> Result<Vec<RecordingDescriptor>> {
        index_dataset(&self.raw_root, &self.config.extensions)
    }

    pub fn run(&self) -> Result<BatchSummary> {
        let recordings = self.index()?;
        self.run_recordings(&recordings)
    }

    /// Process the given recordings to completion, one at a time.
    ///
    /// Failures local to one recording are written to the failure report
    /// and never abort the batch.
    pub fn run_recordings(&self, recordings: &[RecordingDescriptor]) -> Result<BatchSummary> {
        let run_id = uuid::Uuid::new_v4();
        let reports_dir = resolver::derivatives_root(&self.raw_root)?;
        std::fs::create_dir_all(&reports_dir)?;
        let processed = reports_dir.join(PROCESSED_REPORT);
        let not_processed = reports_dir.join(FAILED_REPORT);

        let mut summary = BatchSummary {
            total: recordings.len(),
            ..BatchSummary::default()
        };

        for recording in recordings {
            if self.cancel.is_cancelled() {
                log::info!("[{}] batch cancelled", run_id);
                break;
            }
            let with_gradient = match self.gradient_gate(recording) {
                Some(g) => g,
                None => {
                    log::debug!(
                        "skipping {} (task not configured for cleaning)",
                        recording.file_name()
                    );
                    summary.skipped += 1;
                    continue;
                }
            };

            log::info!("[{}] cleaning {}", run_id, recording.file_name());
            let mut pipeline = CleanerPipeline::new(recording.clone(), &self.config, &self.registry)
                .with_cancel_token(self.cancel.clone());
            match pipeline.run_chain(self.chain, with_gradient) {
                Ok(()) => {
                    let line = format!(
                        "{}\trun={}\t{}\thistory={}",
                        chrono::Utc::now().to_rfc3339(),
                        run_id,
                        recording.file_name(),
                        pipeline.ledger().as_folder_name()
                    );
                    write_report(&line, Some(&processed))?;
                    summary.succeeded += 1;
                }
                Err(failure) => {
                    if matches!(failure.error, CleanError::Cancelled) {
                        log::info!(
                            "[{}] cancelled before stage {} of {}",
                            run_id,
                            failure.stage,
                            recording.file_name()
                        );
                        break;
                    }
                    log::error!(
                        "[{}] {} failed at {}: {}",
                        run_id,
                        recording.file_name(),
                        failure.stage,
                        failure.error
                    );
                    let line = format!(
                        "{}\trun={}\t{}\tstage={}\terror={}",
                        chrono::Utc::now().to_rfc3339(),
                        run_id,
                        recording.file_name(),
                        failure.stage,
                        failure.error
                    );
                    write_report(&line, Some(&not_processed))?;
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }

    /// Whether a recording gets the gradient stage: `Some(true)` for tasks
    /// recorded with scanner gradients, `Some(false)` for gradient-free
    /// tasks, `None` when the task is not configured for cleaning at all.
    fn gradient_gate(&self, recording: &RecordingDescriptor) -> Option<bool> {
        let task = recording.entities.task.as_deref()?;
        if self.config.gradient_tasks.iter().any(|t| t == task) {
            Some(true)
        } else if self.config.no_gradient_tasks.iter().any(|t| t == task) {
            Some(false)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StageConfig;
    use crate::sim::DummyDataset;
    use crate::transform::SignalTransform;
    use std::path::Path;

    struct FailingStage(StageKind);

    impl SignalTransform for FailingStage {
        fn kind(&self) -> StageKind {
            self.0
        }
        fn apply(&self, _signal: SignalBuffer, _cfg: &StageConfig) -> Result<SignalBuffer> {
            Err(CleanError::transform(self.0.tag(), "injected failure"))
        }
    }

    fn simulated_recording(tmp: &Path) -> (PathBuf, RecordingDescriptor) {
        let raw_root = DummyDataset::new(tmp).task("test").create().unwrap();
        let recordings = index_dataset(&raw_root, &["csv".to_string()]).unwrap();
        (raw_root, recordings[0].clone())
    }

    #[test]
    fn test_chain_stage_orders() {
        assert_eq!(
            PipelineChain::Full.stages(true),
            vec![
                StageKind::GradientRemoval,
                StageKind::BcgRemoval,
                StageKind::Prep,
                StageKind::Asr
            ]
        );
        assert_eq!(
            PipelineChain::Cbin.stages(false),
            vec![StageKind::BcgRemoval]
        );
        assert_eq!(
            PipelineChain::CbinAsr.stages(false),
            vec![StageKind::BcgRemoval, StageKind::Asr]
        );
    }

    #[test]
    fn test_apply_stage_appends_tag_and_persists() {
        let tmp = tempfile::tempdir().unwrap();
        let (_raw_root, recording) = simulated_recording(tmp.path());
        let config = CleanConfig::default();
        let registry = StageRegistry::with_defaults();

        let mut pipeline = CleanerPipeline::new(recording.clone(), &config, &registry);
        pipeline.read_raw().unwrap();
        let dir = pipeline.apply_stage(StageKind::BcgRemoval).unwrap();

        assert_eq!(pipeline.ledger().as_folder_name(), "BCG");
        assert_eq!(*pipeline.state(), RunState::Staged { completed: 1 });
        assert!(dir.ends_with("DERIVATIVES/BCG/sub-001/ses-001/eeg"));
        assert!(dir.join(format!("{}.st", recording.stem())).is_file());
        assert!(dir.join(format!("{}.json", recording.stem())).is_file());
    }

    #[test]
    fn test_failed_stage_leaves_ledger_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        let (_raw_root, recording) = simulated_recording(tmp.path());
        let config = CleanConfig::default();
        let mut registry = StageRegistry::with_defaults();
        registry.insert(Box::new(FailingStage(StageKind::Asr)));

        let mut pipeline = CleanerPipeline::new(recording, &config, &registry);
        pipeline.read_raw().unwrap();
        let result = pipeline.apply_stage(StageKind::Asr);

        assert!(result.is_err());
        assert!(pipeline.ledger().is_empty());
        assert_eq!(
            *pipeline.state(),
            RunState::Failed {
                stage: "ASR".to_string()
            }
        );
    }

    #[test]
    fn test_run_chain_reaches_done() {
        let tmp = tempfile::tempdir().unwrap();
        let (_raw_root, recording) = simulated_recording(tmp.path());
        let config = CleanConfig::default();
        let registry = StageRegistry::with_defaults();

        let mut pipeline = CleanerPipeline::new(recording, &config, &registry);
        pipeline.run_chain(PipelineChain::Full, true).unwrap();

        assert_eq!(*pipeline.state(), RunState::Done);
        assert_eq!(pipeline.ledger().as_folder_name(), "GRAD_BCG_PREP_ASR");

        let (buffer, ledger) = pipeline.into_parts();
        assert!(buffer.is_some());
        assert_eq!(ledger.len(), 4);
    }

    #[test]
    fn test_cancelled_run_stops_before_next_stage() {
        let tmp = tempfile::tempdir().unwrap();
        let (_raw_root, recording) = simulated_recording(tmp.path());
        let config = CleanConfig::default();
        let registry = StageRegistry::with_defaults();
        let token = CancelToken::new();

        let mut pipeline = CleanerPipeline::new(recording, &config, &registry)
            .with_cancel_token(token.clone());
        pipeline.read_raw().unwrap();
        token.cancel();

        let failure = pipeline.run_chain(PipelineChain::Full, true).unwrap_err();
        assert!(matches!(failure.error, CleanError::Cancelled));
        assert!(pipeline.ledger().is_empty());
    }

    #[test]
    fn test_gradient_gate_uses_config() {
        let tmp = tempfile::tempdir().unwrap();
        let (_raw_root, recording) = simulated_recording(tmp.path());
        let mut config = CleanConfig::default();
        config.gradient_tasks = vec!["test".to_string()];

        let runner = BatchRunner::new(tmp.path().join("RAW"), config);
        assert_eq!(runner.gradient_gate(&recording), Some(true));

        let mut config = CleanConfig::default();
        config.gradient_tasks = vec!["other".to_string()];
        config.no_gradient_tasks = vec!["test".to_string()];
        let runner = BatchRunner::new(tmp.path().join("RAW"), config);
        assert_eq!(runner.gradient_gate(&recording), Some(false));

        let runner = BatchRunner::new(tmp.path().join("RAW"), CleanConfig::default());
        assert_eq!(runner.gradient_gate(&recording), None);
    }
}
