//! CDC EARS C1, C2 and C3 detectors.
//!
//! All three compare the current count to the mean and standard deviation
//! of a short trailing baseline:
//! - C1 (MILD): the baseline ends at the previous point.
//! - C2 (MEDIUM): the baseline ends two points earlier.
//! - C3 (ULTRA): C2 plus a short CUSUM over the last two sub-threshold
//!   statistics.
//!
//! Levels are raw statistics (default 0, higher is worse).

use tracing::{debug, trace};

use crate::config::{ThresholdTable, Thresholds};
use crate::core::{DetectionContext, DetectionResult};
use crate::detection::ColorCoder;
use crate::error::{DetectionError, Result};
use crate::utils::stats::{mean, std};

use super::Detector;

/// The three EARS variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EarsVariant {
    C1,
    C2,
    C3,
}

impl EarsVariant {
    pub fn id(self) -> &'static str {
        match self {
            EarsVariant::C1 => "C1",
            EarsVariant::C2 => "C2",
            EarsVariant::C3 => "C3",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EarsVariant::C1 => "CDC EARS C1 (MILD)",
            EarsVariant::C2 => "CDC EARS C2 (MEDIUM)",
            EarsVariant::C3 => "CDC EARS C3 (ULTRA)",
        }
    }

    /// Default parameters of this variant.
    pub fn config(self) -> EarsConfig {
        let base = EarsConfig::default();
        match self {
            EarsVariant::C1 => base,
            EarsVariant::C2 => base.with_guard_band(2),
            EarsVariant::C3 => base.with_guard_band(2).with_cusum(true),
        }
    }
}

/// Parameters shared by the EARS variants.
#[derive(Debug, Clone, PartialEq)]
pub struct EarsConfig {
    /// Baseline window length.
    pub baseline: usize,
    /// Points skipped between the baseline and the tested point.
    pub guard_band: usize,
    /// Accumulate the two previous sub-threshold statistics.
    pub cusum: bool,
    /// Reference value, in standard deviations, subtracted before scaling.
    pub cusum_k: f64,
    /// Statistics at or above this value do not carry into the CUSUM.
    pub cusum_threshold: f64,
    /// Floor on the baseline standard deviation.
    pub min_sigma: f64,
}

impl Default for EarsConfig {
    fn default() -> Self {
        Self {
            baseline: 7,
            guard_band: 0,
            cusum: false,
            cusum_k: 1.0,
            cusum_threshold: 2.0,
            min_sigma: 0.2,
        }
    }
}

impl EarsConfig {
    pub fn with_baseline(mut self, baseline: usize) -> Self {
        self.baseline = baseline;
        self
    }

    pub fn with_guard_band(mut self, guard_band: usize) -> Self {
        self.guard_band = guard_band;
        self
    }

    pub fn with_cusum(mut self, cusum: bool) -> Self {
        self.cusum = cusum;
        self
    }

    pub fn with_min_sigma(mut self, min_sigma: f64) -> Self {
        self.min_sigma = min_sigma;
        self
    }
}

/// Per-point output of the EARS recursion.
#[derive(Debug, Clone, PartialEq)]
pub struct EarsStatistics {
    pub statistics: Vec<f64>,
    pub baseline_means: Vec<f64>,
    pub baseline_sigmas: Vec<f64>,
}

/// Run the EARS recursion over `data`.
///
/// Points without a full baseline keep a statistic of 0.
///
/// # Example
/// ```
/// use anofox_surveillance::detectors::{ears_statistics, EarsVariant};
///
/// let data = [3.0, 4.0, 5.0, 4.0, 3.0, 4.0, 5.0, 12.0];
/// let out = ears_statistics(&data, &EarsVariant::C1.config());
/// assert!(out.statistics[7] > 5.0);
/// assert_eq!(out.statistics[6], 0.0);
/// ```
pub fn ears_statistics(data: &[f64], config: &EarsConfig) -> EarsStatistics {
    let n = data.len();
    let mut out = EarsStatistics {
        statistics: vec![0.0; n],
        baseline_means: vec![0.0; n],
        baseline_sigmas: vec![0.0; n],
    };

    let lag = config.baseline + config.guard_band;
    // CUSUM accumulators for the previous two points
    let (mut acc1, mut acc2) = (0.0, 0.0);

    for i in lag..n {
        let window = &data[i - lag..i - config.guard_band];
        let m = mean(window);
        let sd = std(window).max(config.min_sigma);

        let mut c = (data[i] - m - config.cusum_k * sd).max(0.0) / sd;
        if !c.is_finite() {
            c = 0.0;
        }

        out.statistics[i] = if config.cusum { c + acc1 + acc2 } else { c };
        if config.cusum {
            acc2 = acc1;
            acc1 = if c >= config.cusum_threshold { 0.0 } else { c };
        }
        out.baseline_means[i] = m;
        out.baseline_sigmas[i] = sd;
    }
    out
}

/// One CDC EARS variant.
///
/// The detector can optionally read a named regressor from the context in
/// place of the counts; the counts still drive the "no data" color rule.
#[derive(Debug, Clone)]
pub struct EarsDetector {
    variant: EarsVariant,
    config: EarsConfig,
    thresholds: Thresholds,
    input: Option<String>,
}

impl EarsDetector {
    pub fn new(variant: EarsVariant, thresholds: Thresholds) -> Self {
        Self {
            variant,
            config: variant.config(),
            thresholds,
            input: None,
        }
    }

    /// C1 with the default thresholds (red 3, yellow 2).
    pub fn c1() -> Self {
        Self::new(EarsVariant::C1, Thresholds::new(3.0, 2.0))
    }

    /// C2 with the default thresholds (red 3, yellow 2).
    pub fn c2() -> Self {
        Self::new(EarsVariant::C2, Thresholds::new(3.0, 2.0))
    }

    /// C3 with the default thresholds (red 3, yellow 2).
    pub fn c3() -> Self {
        Self::new(EarsVariant::C3, Thresholds::new(3.0, 2.0))
    }

    /// Variant defaults with the thresholds registered for its id.
    pub fn from_thresholds(variant: EarsVariant, table: &ThresholdTable) -> Result<Self> {
        Ok(Self::new(variant, table.get(variant.id())?))
    }

    pub fn with_config(mut self, config: EarsConfig) -> Self {
        self.config = config;
        self
    }

    /// Read the named regressor instead of the counts when present.
    pub fn with_regressor(mut self, regressor: impl Into<String>) -> Self {
        self.input = Some(regressor.into());
        self
    }

    pub fn variant(&self) -> EarsVariant {
        self.variant
    }

    pub fn config(&self) -> &EarsConfig {
        &self.config
    }
}

impl Detector for EarsDetector {
    fn id(&self) -> &str {
        self.variant.id()
    }

    fn name(&self) -> &str {
        self.variant.name()
    }

    fn red_level(&self) -> f64 {
        self.thresholds.red_level
    }

    fn set_red_level(&mut self, level: f64) {
        self.thresholds.red_level = level;
    }

    fn yellow_level(&self) -> f64 {
        self.thresholds.yellow_level
    }

    fn set_yellow_level(&mut self, level: f64) {
        self.thresholds.yellow_level = level;
    }

    fn detect(&self, context: &DetectionContext) -> Result<DetectionResult> {
        if self.config.baseline < 2 {
            return Err(DetectionError::InvalidParameter(format!(
                "EARS baseline needs at least 2 points, got {}",
                self.config.baseline
            )));
        }

        let counts = context.counts();
        let data = match self.input.as_deref() {
            Some(name) => context.regressor(name).unwrap_or_else(|| {
                trace!(regressor = name, "input regressor missing, using counts");
                counts
            }),
            None => counts,
        };

        let stats = ears_statistics(data, &self.config);
        let mut result = DetectionResult::new(counts.len(), 0.0);
        result.levels = stats.statistics.clone();
        result.test_statistics = stats.statistics;
        result.expecteds = stats.baseline_means.clone();

        let coder = ColorCoder::statistic(self.thresholds.red_level, self.thresholds.yellow_level);
        result.colors = coder.apply(counts, &mut result.levels);
        debug!(
            detector = self.variant.id(),
            alerts = result.alert_count(),
            "ears pass complete"
        );

        Ok(result
            .with_output("baseline_mean", stats.baseline_means)
            .with_output("baseline_sigma", stats.baseline_sigmas))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::AlertColor;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn ctx(counts: Vec<f64>) -> DetectionContext {
        DetectionContext::daily(counts, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap())
    }

    #[test]
    fn variant_identity() {
        assert_eq!(EarsDetector::c1().id(), "C1");
        assert_eq!(EarsDetector::c2().name(), "CDC EARS C2 (MEDIUM)");
        assert_eq!(EarsDetector::c3().name(), "CDC EARS C3 (ULTRA)");
        assert!(EarsVariant::C3.config().cusum);
        assert_eq!(EarsVariant::C2.config().guard_band, 2);
        assert_eq!(EarsVariant::C1.config().guard_band, 0);
    }

    #[test]
    fn c1_statistic_by_hand() {
        // Baseline 2,4,2,4,2,4,2: mean 20/7, sum of squares 48/7
        let data = [2.0, 4.0, 2.0, 4.0, 2.0, 4.0, 2.0, 9.0];
        let out = ears_statistics(&data, &EarsVariant::C1.config());
        let m = 20.0 / 7.0;
        let sd = (48.0_f64 / 7.0 / 6.0).sqrt();
        assert_relative_eq!(out.baseline_means[7], m, epsilon = 1e-12);
        assert_relative_eq!(out.baseline_sigmas[7], sd, epsilon = 1e-12);
        assert_relative_eq!(out.statistics[7], (9.0 - m - sd) / sd, epsilon = 1e-12);
    }

    #[test]
    fn c2_skips_guard_band() {
        let mut data = vec![5.0; 7];
        data.extend([50.0, 50.0, 5.0]);
        let c1 = ears_statistics(&data, &EarsVariant::C1.config());
        let c2 = ears_statistics(&data, &EarsVariant::C2.config());
        // C2 first tests index 9, baseline 0..7 of constant fives.
        assert_eq!(c2.statistics[8], 0.0);
        assert_relative_eq!(c2.baseline_means[9], 5.0, epsilon = 1e-12);
        // C1 at index 9 sees the two fifties in its baseline.
        assert!(c1.baseline_means[9] > 5.0);
    }

    #[test]
    fn flat_baseline_uses_sigma_floor() {
        let mut data = vec![5.0; 7];
        data.push(6.0);
        let out = ears_statistics(&data, &EarsVariant::C1.config());
        assert_relative_eq!(out.baseline_sigmas[7], 0.2, epsilon = 1e-12);
        assert_relative_eq!(out.statistics[7], (6.0 - 5.0 - 0.2) / 0.2, epsilon = 1e-12);
    }

    #[test]
    fn below_mean_gives_zero() {
        let mut data = vec![10.0, 12.0, 11.0, 9.0, 10.0, 12.0, 11.0];
        data.push(2.0);
        let out = ears_statistics(&data, &EarsVariant::C1.config());
        assert_eq!(out.statistics[7], 0.0);
    }

    #[test]
    fn c3_accumulates_sub_threshold_statistics() {
        let config = EarsVariant::C3.config();
        let data = [
            10.0, 11.0, 9.0, 10.0, 11.0, 9.0, 10.0, 10.0, 10.0, 11.5, 11.5, 11.5,
        ];
        let out = ears_statistics(&data, &config);
        let c2 = ears_statistics(&data, &EarsVariant::C2.config());
        // Raw statistics are all positive and below the reset threshold.
        assert!(c2.statistics[9..].iter().all(|&c| c > 0.0 && c < 2.0));
        assert_relative_eq!(out.statistics[9], c2.statistics[9], epsilon = 1e-12);
        assert_relative_eq!(
            out.statistics[10],
            c2.statistics[10] + c2.statistics[9],
            epsilon = 1e-12
        );
        assert_relative_eq!(
            out.statistics[11],
            c2.statistics[11] + c2.statistics[10] + c2.statistics[9],
            epsilon = 1e-12
        );
    }

    #[test]
    fn c3_resets_after_large_statistic() {
        let mut data = vec![10.0, 11.0, 9.0, 10.0, 11.0, 9.0, 10.0, 10.0, 10.0];
        data.extend([40.0, 10.0, 10.0]);
        let c3 = ears_statistics(&data, &EarsVariant::C3.config());
        let c2 = ears_statistics(&data, &EarsVariant::C2.config());
        assert!(c2.statistics[9] >= 2.0);
        // The outbreak day does not carry into the next two days.
        assert_relative_eq!(c3.statistics[10], c2.statistics[10], epsilon = 1e-12);
        assert_relative_eq!(
            c3.statistics[11],
            c2.statistics[11] + c2.statistics[10],
            epsilon = 1e-12
        );
    }

    #[test]
    fn detect_colors_by_raw_statistic() {
        let mut counts = vec![10.0, 12.0, 9.0, 11.0, 10.0, 13.0, 12.0];
        counts.push(30.0);
        counts.push(0.0);
        let result = EarsDetector::c1().detect(&ctx(counts)).unwrap();
        assert_eq!(result.colors[7], AlertColor::Alert);
        assert!(result.levels[7] >= 3.0);
        assert_eq!(result.levels[8], 0.0);
        assert_eq!(result.colors[8], AlertColor::Normal);
        assert!(result.colors[..7].iter().all(|&c| c == AlertColor::Normal));
    }

    #[test]
    fn reads_named_regressor() {
        let counts = vec![10.0; 8];
        let mut input = vec![10.0, 12.0, 9.0, 11.0, 10.0, 13.0, 12.0];
        input.push(40.0);
        let context = ctx(counts).with_regressor("visits", input).unwrap();

        let plain = EarsDetector::c1().detect(&context).unwrap();
        let regressed = EarsDetector::c1().with_regressor("visits").detect(&context).unwrap();
        assert_eq!(plain.levels[7], 0.0);
        assert_eq!(regressed.colors[7], AlertColor::Alert);

        let missing = EarsDetector::c1().with_regressor("absent").detect(&context).unwrap();
        assert_eq!(missing.levels, plain.levels);
    }

    #[test]
    fn short_series_has_no_signal() {
        let result = EarsDetector::c3().detect(&ctx(vec![1.0, 5.0, 9.0])).unwrap();
        assert!(result.levels.iter().all(|&l| l == 0.0));
    }

    #[test]
    fn degenerate_baseline_rejected() {
        let detector = EarsDetector::c1().with_config(EarsConfig::default().with_baseline(1));
        assert!(matches!(
            detector.detect(&ctx(vec![1.0; 5])),
            Err(DetectionError::InvalidParameter(_))
        ));
    }
}
