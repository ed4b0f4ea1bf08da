//! Built-in artifact-removal algorithms.
//!
//! The pipeline core only sees these through the
//! [`SignalTransform`](crate::transform::SignalTransform) trait; swapping
//! in a different implementation of any stage is a registry insert away.

mod asr;
mod bcg;
mod gradient;
mod prep;

pub use asr::AsrReconstructor;
pub use bcg::BcgRemover;
pub use gradient::GradientRemover;
pub use prep::PrepReference;
