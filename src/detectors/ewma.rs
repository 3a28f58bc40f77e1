//! EWMA Sages detector.
//!
//! Exponentially weighted moving average of the counts, tested against a
//! sliding baseline that ends a guard band before the current point. The
//! baseline sigma is inflated by small-sample correction terms that depend
//! only on the degrees of freedom, so they are tabulated once per run.

use tracing::{debug, trace};

use crate::config::{ThresholdTable, Thresholds};
use crate::core::{DetectionContext, DetectionResult, DEFAULT_LEVEL};
use crate::detection::{filter_baseline_zeros, needs_filtering, ColorCoder, ZeroFilterConfig};
use crate::error::{DetectionError, Result};
use crate::utils::gather;
use crate::utils::stats::{mean, std, tcdf, tinv};

use super::Detector;

/// Tuning parameters for [`EwmaSagesDetector`].
#[derive(Debug, Clone, PartialEq)]
pub struct EwmaConfig {
    /// Smoothing weight of the newest count.
    pub omega: f64,
    /// Smallest usable baseline is `min_deg_freedom + 1` points.
    pub min_deg_freedom: usize,
    /// Largest baseline window.
    pub max_baseline: usize,
    /// Points between the end of the baseline and the tested point.
    pub guard_band: usize,
    /// Filter improbable zero runs out of each baseline.
    pub remove_zeros: bool,
    pub zero_filter: ZeroFilterConfig,
}

impl Default for EwmaConfig {
    fn default() -> Self {
        Self {
            omega: 0.4,
            min_deg_freedom: 2,
            max_baseline: 28,
            guard_band: 2,
            remove_zeros: true,
            zero_filter: ZeroFilterConfig::default(),
        }
    }
}

impl EwmaConfig {
    pub fn with_omega(mut self, omega: f64) -> Self {
        self.omega = omega;
        self
    }

    pub fn with_baseline(mut self, min_deg_freedom: usize, max_baseline: usize) -> Self {
        self.min_deg_freedom = min_deg_freedom;
        self.max_baseline = max_baseline;
        self
    }

    pub fn with_guard_band(mut self, guard_band: usize) -> Self {
        self.guard_band = guard_band;
        self
    }

    pub fn with_remove_zeros(mut self, remove_zeros: bool) -> Self {
        self.remove_zeros = remove_zeros;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.omega > 0.0 && self.omega < 1.0) {
            return Err(DetectionError::InvalidParameter(format!(
                "omega must be in (0, 1), got {}",
                self.omega
            )));
        }
        if self.min_deg_freedom == 0 || self.max_baseline <= self.min_deg_freedom {
            return Err(DetectionError::InvalidParameter(format!(
                "baseline bounds {}..{} are unusable",
                self.min_deg_freedom + 1,
                self.max_baseline
            )));
        }
        Ok(())
    }
}

/// Per-degrees-of-freedom correction terms, indexed by `df`.
#[derive(Debug, Clone)]
struct SigmaCorrections {
    ucl_red: Vec<f64>,
    sigma_coeff: Vec<f64>,
    delta_sigma: Vec<f64>,
    min_sigma: Vec<f64>,
}

impl SigmaCorrections {
    fn new(config: &EwmaConfig, red: f64, yellow: f64) -> Self {
        let max_df = config.max_baseline - 1;
        let w = config.omega;
        let q = 1.0 - w;
        let g = config.guard_band as i32;

        let mut table = Self {
            ucl_red: vec![f64::NAN; max_df + 1],
            sigma_coeff: vec![f64::NAN; max_df + 1],
            delta_sigma: vec![f64::NAN; max_df + 1],
            min_sigma: vec![f64::NAN; max_df + 1],
        };

        for df in config.min_deg_freedom..=max_df {
            let n = (df + 1) as f64;
            let ucl_yellow = tinv(1.0 - yellow, df as f64);
            table.ucl_red[df] = tinv(1.0 - red, df as f64);

            let variance = w / (2.0 - w) + 1.0 / n - 2.0 * q.powi(g + 1) * (1.0 - q.powf(n)) / n;
            table.sigma_coeff[df] = variance.max(0.0).sqrt();

            let scale = if ucl_yellow.is_finite() && ucl_yellow > 0.0 {
                w / ucl_yellow
            } else {
                0.0
            };
            table.delta_sigma[df] =
                scale * (0.1289 - (0.2414 - 0.1826 * q.powi(4)) * (10.0 * yellow).ln());
            table.min_sigma[df] = scale * (1.0 + 0.5 * q * q);
        }
        table
    }

    fn sigma(&self, df: usize, sd: f64) -> f64 {
        let sigma = self.sigma_coeff[df] * sd + self.delta_sigma[df];
        if sigma.is_nan() {
            self.min_sigma[df]
        } else {
            sigma.max(self.min_sigma[df])
        }
    }
}

/// EWMA detector with Sages small-sample sigma corrections.
///
/// Levels are two-sided Student-t p-values (default 0.5, lower is worse).
/// When the smoothed value crosses the red limit it is pulled back to the
/// limit so one outbreak cannot mask the next few days.
///
/// # Example
/// ```
/// use anofox_surveillance::core::DetectionContext;
/// use anofox_surveillance::detection::AlertColor;
/// use anofox_surveillance::detectors::{Detector, EwmaSagesDetector};
/// use chrono::NaiveDate;
///
/// let mut counts = vec![10.0; 30];
/// counts.push(100.0);
/// let ctx = DetectionContext::daily(counts, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
///
/// let detector = EwmaSagesDetector::default();
/// let result = detector.detect(&ctx).unwrap();
/// assert_eq!(result.colors[30], AlertColor::Alert);
/// ```
#[derive(Debug, Clone)]
pub struct EwmaSagesDetector {
    config: EwmaConfig,
    thresholds: Thresholds,
}

impl EwmaSagesDetector {
    pub const ID: &'static str = "EWMASages";
    const NAME: &'static str = "EWMA Sages";

    pub fn new(config: EwmaConfig, thresholds: Thresholds) -> Self {
        Self { config, thresholds }
    }

    /// Default parameters with the thresholds registered for this id.
    pub fn from_thresholds(table: &ThresholdTable) -> Result<Self> {
        Ok(Self::new(EwmaConfig::default(), table.get(Self::ID)?))
    }

    pub fn config(&self) -> &EwmaConfig {
        &self.config
    }
}

impl Default for EwmaSagesDetector {
    fn default() -> Self {
        Self::new(EwmaConfig::default(), Thresholds::new(0.01, 0.05))
    }
}

impl Detector for EwmaSagesDetector {
    fn id(&self) -> &str {
        Self::ID
    }

    fn name(&self) -> &str {
        Self::NAME
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
        self.config.validate()?;
        let data = context.counts();
        let n = data.len();
        let mut result = DetectionResult::new(n, DEFAULT_LEVEL);
        let mut smoothed = vec![0.0; n];
        let mut sigmas = vec![0.0; n];
        if n == 0 {
            return Ok(result
                .with_output("smoothed", smoothed)
                .with_output("sigma", sigmas));
        }

        let cfg = &self.config;
        let corrections =
            SigmaCorrections::new(cfg, self.thresholds.red_level, self.thresholds.yellow_level);
        let min_baseline = cfg.min_deg_freedom + 1;
        let w = cfg.omega;
        let mut dfs: Vec<Option<usize>> = vec![None; n];

        let mut s = data[0];
        smoothed[0] = s;
        for i in 1..n {
            s = w * data[i] + (1.0 - w) * s;

            if i >= min_baseline + cfg.guard_band {
                let end = i - cfg.guard_band;
                let begin = end.saturating_sub(cfg.max_baseline);
                let window = &data[begin..end];

                let baseline = if cfg.remove_zeros && needs_filtering(window) {
                    gather(window, &filter_baseline_zeros(window, &cfg.zero_filter))
                } else {
                    window.to_vec()
                };

                if baseline.len() < min_baseline || baseline.iter().all(|&x| x == 0.0) {
                    trace!(index = i, kept = baseline.len(), "baseline unusable");
                    smoothed[i] = s;
                    continue;
                }

                let df = baseline.len() - 1;
                let expected = mean(&baseline);
                let sigma = corrections.sigma(df, std(&baseline));
                let t = (s - expected) / sigma;

                if t.is_finite() {
                    let ucl = corrections.ucl_red[df];
                    if t > ucl {
                        s = expected + ucl * sigma;
                    } else if t < -ucl {
                        s = expected - ucl * sigma;
                    }
                    result.test_statistics[i] = t;
                    dfs[i] = Some(df);
                }
                result.expecteds[i] = expected;
                sigmas[i] = sigma;
            }
            smoothed[i] = s;
        }

        for (i, df) in dfs.iter().enumerate() {
            let t = result.test_statistics[i];
            if let Some(df) = df {
                if t != 0.0 {
                    let p = 2.0 * (1.0 - tcdf(t.abs(), *df as f64));
                    if p.is_finite() {
                        result.levels[i] = p.clamp(0.0, 1.0);
                    }
                }
            }
        }

        let coder = ColorCoder::p_value(self.thresholds.red_level, self.thresholds.yellow_level);
        result.colors = coder.apply(data, &mut result.levels);
        debug!(
            detector = Self::ID,
            tested = dfs.iter().filter(|d| d.is_some()).count(),
            "ewma pass complete"
        );

        Ok(result
            .with_output("smoothed", smoothed)
            .with_output("sigma", sigmas))
    }
}
