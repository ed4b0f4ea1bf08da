//! EEG-fMRI cleaning pipelines with provenance-tracked BIDS derivatives.

pub mod algorithms;
pub mod config;
pub mod dataset;
pub mod entities;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod provenance;
pub mod report;
pub mod resolver;
pub mod sidecar;
pub mod signal;
pub mod sim;
pub mod transform;

pub use config::{CleanConfig, StageConfig};
pub use entities::{Entities, RecordingDescriptor};
pub use error::{CleanError, Result};
pub use pipeline::{
    BatchRunner, BatchSummary, CancelToken, CleanerPipeline, PipelineChain, RunState, StageFailure,
};
pub use provenance::ProvenanceLedger;
pub use signal::{Annotation, SignalBuffer};
pub use transform::{SignalTransform, StageKind, StageRegistry};
