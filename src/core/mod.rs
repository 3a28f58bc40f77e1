//! Core data structures shared by detectors and callers.

mod context;
mod result;

pub use context::{DetectionContext, TimeResolution, DEFAULT_LEVEL};
pub use result::DetectionResult;
