use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::algorithms::{AsrReconstructor, BcgRemover, GradientRemover, PrepReference};
use crate::config::StageConfig;
use crate::error::Result;
use crate::signal::SignalBuffer;

/// The artifact-removal stages the pipeline can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    GradientRemoval,
    BcgRemoval,
    Prep,
    Asr,
}

impl StageKind {
    pub const ALL: &'static [StageKind] = &[
        StageKind::GradientRemoval,
        StageKind::BcgRemoval,
        StageKind::Prep,
        StageKind::Asr,
    ];

    /// Provenance tag appended to the ledger when the stage completes.
    pub fn tag(&self) -> &'static str {
        match self {
            StageKind::GradientRemoval => "GRAD",
            StageKind::BcgRemoval => "BCG",
            StageKind::Prep => "PREP",
            StageKind::Asr => "ASR",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "GRAD" => Some(StageKind::GradientRemoval),
            "BCG" => Some(StageKind::BcgRemoval),
            "PREP" => Some(StageKind::Prep),
            "ASR" => Some(StageKind::Asr),
            _ => None,
        }
    }
}

/// One artifact-removal algorithm wrapped behind a uniform interface.
///
/// A stage consumes the previous buffer and returns a cleaned one; it
/// never touches the provenance ledger (the driver appends the tag after
/// a successful return). Rejection of the input surfaces as
/// [`CleanError::Transform`](crate::error::CleanError::Transform) carrying
/// the stage name.
pub trait SignalTransform {
    fn kind(&self) -> StageKind;
    fn apply(&self, signal: SignalBuffer, cfg: &StageConfig) -> Result<SignalBuffer>;
}

/// Explicit lookup table from stage identifiers to implementations.
pub struct StageRegistry {
    stages: HashMap<StageKind, Box<dyn SignalTransform>>,
}

impl StageRegistry {
    pub fn empty() -> Self {
        StageRegistry {
            stages: HashMap::new(),
        }
    }

    /// Registry holding the built-in implementation of every stage.
    pub fn with_defaults() -> Self {
        let mut registry = StageRegistry::empty();
        registry.insert(Box::new(GradientRemover));
        registry.insert(Box::new(BcgRemover));
        registry.insert(Box::new(PrepReference));
        registry.insert(Box::new(AsrReconstructor));
        registry
    }

    /// Register an implementation, replacing any previous one of the same
    /// kind.
    pub fn insert(&mut self, transform: Box<dyn SignalTransform>) {
        self.stages.insert(transform.kind(), transform);
    }

    pub fn get(&self, kind: StageKind) -> Option<&dyn SignalTransform> {
        self.stages.get(&kind).map(|b| b.as_ref())
    }
}

impl Default for StageRegistry {
    fn default() -> Self {
        StageRegistry::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_round_trip() {
        for kind in StageKind::ALL {
            assert_eq!(StageKind::from_tag(kind.tag()), Some(*kind));
        }
        assert_eq!(StageKind::from_tag("NOPE"), None);
    }

    #[test]
    fn test_default_registry_covers_all_stages() {
        let registry = StageRegistry::with_defaults();
        for kind in StageKind::ALL {
            assert!(registry.get(*kind).is_some(), "missing {:?}", kind);
        }
    }

    #[test]
    fn test_insert_replaces_by_kind() {
        struct Identity;
        impl SignalTransform for Identity {
            fn kind(&self) -> StageKind {
                StageKind::Asr
            }
            fn apply(&self, signal: SignalBuffer, _cfg: &StageConfig) -> Result<SignalBuffer> {
                Ok(signal)
            }
        }

        let mut registry = StageRegistry::with_defaults();
        registry.insert(Box::new(Identity));
        let stage = registry.get(StageKind::Asr).unwrap();
        assert_eq!(stage.kind(), StageKind::Asr);
    }
}
