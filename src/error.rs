//! Error types for the anofox-surveillance library.

use thiserror::Error;

/// Result type alias for detection operations.
pub type Result<T> = std::result::Result<T, DetectionError>;

/// Errors that can occur while configuring or running a detector.
///
/// Numeric degeneracies (empty baselines, non-finite statistics) are not
/// errors: they are recovered inside the detectors and leave the affected
/// points at their "no signal" defaults.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectionError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Fewer data points than the detector's hard minimum.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between parallel arrays.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// No detector registered under the requested id.
    #[error("unknown detector: {0}")]
    UnknownDetector(String),

    /// Threshold resource is missing an entry or cannot be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Threshold resource could not be read.
    #[error("io error: {0}")]
    Io(String),
}

impl From<toml::de::Error> for DetectionError {
    fn from(err: toml::de::Error) -> Self {
        DetectionError::Config(err.to_string())
    }
}

impl From<std::io::Error> for DetectionError {
    fn from(err: std::io::Error) -> Self {
        DetectionError::Io(err.to_string())
    }
}
