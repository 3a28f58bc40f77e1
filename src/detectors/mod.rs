//! Temporal anomaly detectors.

mod traits;

pub mod ears;
pub mod ewma;
pub mod gssages;

pub use ears::{ears_statistics, EarsConfig, EarsDetector, EarsStatistics, EarsVariant};
pub use ewma::{EwmaConfig, EwmaSagesDetector};
pub use gssages::{GsSagesConfig, GsSagesDetector, SmoothingCoefficients};
pub use traits::{BoxedDetector, Detector, DetectorRegistry};
