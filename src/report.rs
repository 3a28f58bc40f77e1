//! Multi-series report runner.
//!
//! A report runs one detector over many series. A series that cannot be
//! analysed is replaced by a readable failure message; the others still
//! run.

use tracing::{debug, warn};

use crate::core::DetectionContext;
use crate::detectors::Detector;
use crate::error::{DetectionError, Result};

/// One labelled series in a report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSeries {
    pub label: String,
    pub context: DetectionContext,
}

impl ReportSeries {
    pub fn new(label: impl Into<String>, context: DetectionContext) -> Self {
        Self {
            label: label.into(),
            context,
        }
    }
}

/// Report-wide options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportOptions {
    /// Warm-up points cropped from every completed series.
    pub crop: usize,
}

impl ReportOptions {
    pub fn with_crop(mut self, crop: usize) -> Self {
        self.crop = crop;
        self
    }
}

/// What happened to one series.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesOutcome {
    Completed {
        label: String,
        context: DetectionContext,
    },
    Failed {
        label: String,
        message: String,
    },
}

impl SeriesOutcome {
    pub fn label(&self) -> &str {
        match self {
            SeriesOutcome::Completed { label, .. } | SeriesOutcome::Failed { label, .. } => label,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, SeriesOutcome::Completed { .. })
    }

    pub fn context(&self) -> Option<&DetectionContext> {
        match self {
            SeriesOutcome::Completed { context, .. } => Some(context),
            SeriesOutcome::Failed { .. } => None,
        }
    }
}

fn run_series(detector: &dyn Detector, context: &mut DetectionContext, crop: usize) -> Result<()> {
    if context.is_empty() {
        return Err(DetectionError::EmptyData);
    }
    detector.run_detector(context)?;
    context.crop_startup(crop)
}

/// Run `detector` over every series, isolating failures.
///
/// # Example
/// ```
/// use anofox_surveillance::core::DetectionContext;
/// use anofox_surveillance::detectors::GsSagesDetector;
/// use anofox_surveillance::report::{run_report, ReportOptions, ReportSeries};
/// use chrono::NaiveDate;
///
/// let start = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
/// let series = vec![
///     ReportSeries::new("county A", DetectionContext::daily(vec![5.0; 70], start)),
///     ReportSeries::new("county B", DetectionContext::daily(vec![5.0; 10], start)),
/// ];
/// let outcomes = run_report(&GsSagesDetector::default(), series, &ReportOptions::default());
/// assert!(outcomes[0].is_completed());
/// assert!(!outcomes[1].is_completed());
/// ```
pub fn run_report(
    detector: &dyn Detector,
    series: Vec<ReportSeries>,
    options: &ReportOptions,
) -> Vec<SeriesOutcome> {
    debug!(detector = detector.id(), series = series.len(), "running report");
    series
        .into_iter()
        .map(|ReportSeries { label, mut context }| {
            match run_series(detector, &mut context, options.crop) {
                Ok(()) => SeriesOutcome::Completed { label, context },
                Err(err) => {
                    warn!(detector = detector.id(), series = %label, error = %err, "series failed");
                    let message = format!(
                        "{} could not be analysed for {}: {err}",
                        detector.name(),
                        label
                    );
                    SeriesOutcome::Failed { label, message }
                }
            }
        })
        .collect()
}
