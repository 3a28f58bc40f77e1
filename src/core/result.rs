//! Detection result container.

use std::collections::HashMap;

use crate::detection::AlertColor;

/// Output of one detector run over one series.
///
/// Every array has one entry per input count. Detectors build a result
/// from scratch on each call; nothing is carried over between runs.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResult {
    /// Severity level per point (a p-value or a raw statistic, depending on
    /// the detector).
    pub levels: Vec<f64>,
    /// Discrete alert color per point.
    pub colors: Vec<AlertColor>,
    /// Expected (baseline) value per point.
    pub expecteds: Vec<f64>,
    /// Test statistic per point.
    pub test_statistics: Vec<f64>,
    /// Goodness-of-fit levels, for detectors that report them.
    pub r2_levels: Option<Vec<f64>>,
    /// Per-point mode switch flags, for detectors that switch algorithms.
    pub switch_flags: Option<Vec<f64>>,
    /// Per-point description of the active mode.
    pub switch_info: Option<Vec<String>>,
    /// Detector-specific diagnostics.
    pub output_values: HashMap<String, Vec<f64>>,
}

impl DetectionResult {
    /// A "no signal" result of length `n` with every level at
    /// `default_level`.
    pub fn new(n: usize, default_level: f64) -> Self {
        Self {
            levels: vec![default_level; n],
            colors: vec![AlertColor::Normal; n],
            expecteds: vec![0.0; n],
            test_statistics: vec![0.0; n],
            r2_levels: None,
            switch_flags: None,
            switch_info: None,
            output_values: HashMap::new(),
        }
    }

    /// Number of points covered.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Attach a named diagnostic series.
    pub fn with_output(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.output_values.insert(name.into(), values);
        self
    }

    /// Number of points at warning level or above.
    pub fn alert_count(&self) -> usize {
        self.colors
            .iter()
            .filter(|&&c| c >= AlertColor::Warning)
            .count()
    }
}
