//! Generalized seasonal adaptive smoothing (GSSages).
//!
//! Triple exponential smoothing (level, trend, weekly season) that
//! forecasts each day `guard_band` days ahead and tests the forecast error.
//! Updates that would be driven by outbreaks, holidays or numerical
//! collapse are rolled back so the model keeps tracking the background.
//!
//! Series whose initial baseline has a median of zero switch to a sparse
//! mode: the season is flattened, a small constant is added to every count
//! and the statistic compares the smoothed level against the baseline mean
//! like an EWMA chart.

use tracing::{debug, trace, warn};

use crate::calendar::HolidaySource;
use crate::config::{ThresholdTable, Thresholds};
use crate::core::{DetectionContext, DetectionResult, DEFAULT_LEVEL};
use crate::detection::{filter_baseline_zeros, needs_filtering, ColorCoder, ZeroFilterConfig};
use crate::error::{DetectionError, Result};
use crate::utils::stats::{mean, median, normcdf, percentile, std};
use crate::utils::{gather, reshape, row_means};

use super::Detector;

/// Smoothing weights for level, trend and season.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothingCoefficients {
    pub level: f64,
    pub trend: f64,
    pub season: f64,
}

impl SmoothingCoefficients {
    pub fn new(level: f64, trend: f64, season: f64) -> Self {
        Self {
            level,
            trend,
            season,
        }
    }

    /// Coefficients for a series whose initial level is `m0`.
    ///
    /// Quiet series adapt slowly; busy ones can afford to follow the data.
    pub fn for_level(m0: f64) -> Self {
        if m0 < 1.0 {
            Self::new(0.10, 0.0, 0.05)
        } else if m0 < 10.0 {
            Self::new(0.15, 0.0, 0.05)
        } else if m0 < 100.0 {
            Self::new(0.25, 0.0, 0.10)
        } else {
            Self::new(0.40, 0.0, 0.10)
        }
    }

    fn sparse() -> Self {
        Self::new(0.4, 0.0, 0.0)
    }
}

/// Tuning parameters for [`GsSagesDetector`].
#[derive(Debug, Clone, PartialEq)]
pub struct GsSagesConfig {
    /// Initial baseline length; must be a multiple of `season`.
    pub baseline: usize,
    pub season: usize,
    /// Forecast horizon and gap before the trailing baseline.
    pub guard_band: usize,
    /// Largest absolute percentage error an update may absorb on a full
    /// baseline before it is treated as an outbreak.
    pub ape_limit: f64,
    /// Pick coefficients from the initial level instead of `coefficients`.
    pub auto_coefficients: bool,
    pub coefficients: SmoothingCoefficients,
    /// Added to every count in sparse mode.
    pub sparse_adjustment: f64,
    /// Seasonal factor used on holidays; defaults to the smallest initial
    /// seasonal coefficient.
    pub holiday_factor: Option<f64>,
    pub min_level: f64,
    pub min_seasonal: f64,
    /// Updates that multiply the level by more than this are rejected.
    pub max_level_ratio: f64,
    pub min_deviation: f64,
    /// Number of recent residuals in the local deviation estimate.
    pub deviation_window: usize,
    pub zero_filter: ZeroFilterConfig,
}

impl Default for GsSagesConfig {
    fn default() -> Self {
        Self {
            baseline: 56,
            season: 7,
            guard_band: 2,
            ape_limit: 0.5,
            auto_coefficients: true,
            coefficients: SmoothingCoefficients::new(0.25, 0.0, 0.10),
            sparse_adjustment: 0.2,
            holiday_factor: None,
            min_level: 0.5,
            min_seasonal: 0.05,
            max_level_ratio: 10.0,
            min_deviation: 0.5,
            deviation_window: 28,
            zero_filter: ZeroFilterConfig::default(),
        }
    }
}

impl GsSagesConfig {
    pub fn with_baseline(mut self, baseline: usize) -> Self {
        self.baseline = baseline;
        self
    }

    pub fn with_guard_band(mut self, guard_band: usize) -> Self {
        self.guard_band = guard_band;
        self
    }

    pub fn with_ape_limit(mut self, ape_limit: f64) -> Self {
        self.ape_limit = ape_limit;
        self
    }

    /// Fixed coefficients; disables the level-based lookup.
    pub fn with_coefficients(mut self, coefficients: SmoothingCoefficients) -> Self {
        self.coefficients = coefficients;
        self.auto_coefficients = false;
        self
    }

    pub fn with_holiday_factor(mut self, factor: f64) -> Self {
        self.holiday_factor = Some(factor);
        self
    }

    fn validate(&self) -> Result<()> {
        if self.season == 0 || self.baseline < 2 * self.season || self.baseline % self.season != 0
        {
            return Err(DetectionError::InvalidParameter(format!(
                "baseline {} must be a multiple of the season {} covering two seasons",
                self.baseline, self.season
            )));
        }
        if self.guard_band == 0 || self.guard_band > self.season {
            return Err(DetectionError::InvalidParameter(format!(
                "guard band must be in 1..={}, got {}",
                self.season, self.guard_band
            )));
        }
        Ok(())
    }
}

/// Model state derived from the initial baseline.
#[derive(Debug, Clone)]
struct SeasonalStart {
    sparse: bool,
    adjustment: f64,
    level: f64,
    seasonal: Vec<f64>,
    coefficients: SmoothingCoefficients,
    holiday_factor: f64,
}

impl SeasonalStart {
    fn from_baseline(head: &[f64], config: &GsSagesConfig) -> Self {
        let sparse = median(head) == 0.0;
        let adjustment = if sparse { config.sparse_adjustment } else { 0.0 };
        let adjusted: Vec<f64> = head.iter().map(|x| x + adjustment).collect();

        // One row per weekday, one column per week.
        let weeks = config.baseline / config.season;
        let profile = row_means(&reshape(&adjusted, config.season, weeks));
        let ck = mean(&profile);

        let seasonal: Vec<f64> = if sparse || ck <= 0.0 {
            vec![1.0; config.season]
        } else {
            profile.iter().map(|r| r / ck).collect()
        };
        let coefficients = if sparse {
            SmoothingCoefficients::sparse()
        } else if config.auto_coefficients {
            SmoothingCoefficients::for_level(ck)
        } else {
            config.coefficients
        };
        let holiday_factor = config
            .holiday_factor
            .unwrap_or_else(|| seasonal.iter().copied().fold(f64::INFINITY, f64::min));

        Self {
            sparse,
            adjustment,
            level: ck,
            seasonal,
            coefficients,
            holiday_factor,
        }
    }
}

/// Trailing baseline window with implausible zero runs removed.
#[derive(Debug, Clone, PartialEq)]
struct TrailingBaseline {
    values: Vec<f64>,
    /// Window spans the whole baseline length and nothing was filtered.
    full: bool,
}

impl TrailingBaseline {
    /// Window ending just before `end`.
    ///
    /// Zero runs are detected on the raw `counts`; the surviving points are
    /// read from `adjusted`, which may carry the sparse-mode offset. `None`
    /// when no non-zero count survives.
    fn before(
        counts: &[f64],
        adjusted: &[f64],
        end: usize,
        config: &GsSagesConfig,
    ) -> Option<Self> {
        let start = end.saturating_sub(config.baseline);
        let raw = &counts[start..end];
        let kept: Vec<usize> = if needs_filtering(raw) {
            filter_baseline_zeros(raw, &config.zero_filter)
        } else {
            (0..raw.len()).collect()
        };
        if gather(raw, &kept).iter().all(|&x| x == 0.0) {
            return None;
        }
        Some(Self {
            full: raw.len() == config.baseline && kept.len() == raw.len(),
            values: gather(&adjusted[start..end], &kept),
        })
    }
}

/// Seasonal adaptive smoothing detector.
///
/// Levels are one-sided normal upper-tail probabilities (default 0.5,
/// lower is worse). Needs at least `baseline` points.
///
/// # Example
/// ```
/// use anofox_surveillance::core::DetectionContext;
/// use anofox_surveillance::detectors::{Detector, GsSagesDetector};
/// use chrono::NaiveDate;
///
/// let start = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
/// let short = DetectionContext::daily(vec![5.0; 30], start);
/// assert!(GsSagesDetector::default().detect(&short).is_err());
///
/// let ctx = DetectionContext::daily(vec![5.0; 70], start);
/// let result = GsSagesDetector::default().detect(&ctx).unwrap();
/// assert_eq!(result.len(), 70);
/// ```
#[derive(Debug, Clone)]
pub struct GsSagesDetector {
    config: GsSagesConfig,
    thresholds: Thresholds,
    holidays: HolidaySource,
}

impl GsSagesDetector {
    pub const ID: &'static str = "GSSages";
    const NAME: &'static str = "Generalized Seasonal Adaptive Smoothing";

    pub fn new(config: GsSagesConfig, thresholds: Thresholds) -> Self {
        Self {
            config,
            thresholds,
            holidays: HolidaySource::builtin(),
        }
    }

    /// Default parameters with the thresholds registered for this id.
    pub fn from_thresholds(table: &ThresholdTable) -> Result<Self> {
        Ok(Self::new(GsSagesConfig::default(), table.get(Self::ID)?))
    }

    /// Replace the holiday source (built-in US rules by default).
    pub fn with_holiday_source(mut self, holidays: HolidaySource) -> Self {
        self.holidays = holidays;
        self
    }

    pub fn config(&self) -> &GsSagesConfig {
        &self.config
    }

    pub fn holiday_source(&self) -> &HolidaySource {
        &self.holidays
    }
}

impl Default for GsSagesDetector {
    fn default() -> Self {
        Self::new(GsSagesConfig::default(), Thresholds::new(0.01, 0.05))
    }
}

impl Detector for GsSagesDetector {
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
        let cfg = &self.config;
        cfg.validate()?;
        let counts = context.counts();
        let n = counts.len();
        if n < cfg.baseline {
            return Err(DetectionError::InsufficientData {
                needed: cfg.baseline,
                got: n,
            });
        }

        let init = SeasonalStart::from_baseline(&counts[..cfg.baseline], cfg);
        if init.sparse {
            warn!(
                detector = Self::ID,
                adjustment = init.adjustment,
                "baseline median is zero, using sparse-data mode"
            );
        }

        let dates = context.dates();
        let is_holiday: Vec<bool> = (0..n)
            .map(|i| dates.get(i).is_some_and(|d| self.holidays.is_holiday(*d)))
            .collect();

        let y: Vec<f64> = counts.iter().map(|x| x + init.adjustment).collect();
        let s = cfg.season;
        let g = cfg.guard_band;
        let alpha = init.coefficients;

        let mut level = vec![init.level; n];
        let mut trend = vec![0.0; n];
        let mut seasonal: Vec<f64> = (0..n).map(|i| init.seasonal[i % s]).collect();

        let mut result = DetectionResult::new(n, DEFAULT_LEVEL);
        let mut switch_flags = vec![0.0; n];
        let mut switch_info = vec![String::new(); n];
        let mut residuals: Vec<f64> = Vec::with_capacity(n);
        let mut rejected = 0usize;

        for i in 2 * s..n {
            let Some(TrailingBaseline { values: baseline, full }) =
                TrailingBaseline::before(counts, &y, i - g, cfg)
            else {
                trace!(index = i, "no usable baseline, point skipped");
                level[i] = level[i - 1];
                trend[i] = trend[i - 1];
                seasonal[i] = seasonal[i - s];
                continue;
            };
            let baseline_sd = std(&baseline);

            // Forecast made guard_band days ago
            let forecast_level = level[i - g] + g as f64 * trend[i - g];
            let regular_factor = seasonal[i - s];
            let factor = if is_holiday[i]
                && (y[i] - (regular_factor * forecast_level).max(0.0)).abs() > baseline_sd
            {
                init.holiday_factor
            } else {
                regular_factor
            };
            let predicted = (factor * forecast_level).max(0.0);

            let (m_prev, b_prev) = (level[i - 1], trend[i - 1]);
            let deseasonalised = if factor > 0.0 { y[i] / factor } else { y[i] };
            let m = (alpha.level * deseasonalised + (1.0 - alpha.level) * (m_prev + b_prev))
                .max(cfg.min_level);
            let b = alpha.trend * (m - m_prev) + (1.0 - alpha.trend) * b_prev;
            let c = alpha.season * (y[i] / m) + (1.0 - alpha.season) * regular_factor;

            let ape = if predicted > 0.0 {
                (y[i] - predicted).abs() / predicted
            } else if y[i] == 0.0 {
                0.0
            } else {
                f64::INFINITY
            };
            let outbreak = full && ape > cfg.ape_limit && y[i] > percentile(&baseline, 95.0);

            if c < cfg.min_seasonal || m > cfg.max_level_ratio * m_prev || outbreak || is_holiday[i]
            {
                trace!(index = i, holiday = is_holiday[i], outbreak, "update rejected");
                rejected += 1;
                level[i] = m_prev;
                trend[i] = b_prev;
                seasonal[i] = regular_factor;
            } else {
                level[i] = m;
                trend[i] = b;
                seasonal[i] = c;
            }

            let residual = y[i] - predicted;
            let statistic = if init.sparse {
                // EWMA-style chart on the day's smoothed level
                let sigma = ((alpha.level / (2.0 - alpha.level)).sqrt() * baseline_sd)
                    .max(cfg.min_deviation);
                switch_flags[i] = 1.0;
                switch_info[i] = "sparse-data EWMA".to_string();
                (m - mean(&baseline)) / sigma
            } else {
                let recent = &residuals[residuals.len().saturating_sub(cfg.deviation_window)..];
                let deviation = if recent.len() >= 2 {
                    std(recent)
                } else {
                    baseline_sd
                };
                switch_info[i] = "seasonal smoothing".to_string();
                residual / deviation.max(cfg.min_deviation)
            };
            residuals.push(residual);

            result.expecteds[i] = (predicted - init.adjustment).max(0.0);
            if statistic.is_finite() {
                result.test_statistics[i] = statistic;
                let p = 1.0 - normcdf(statistic, 0.0, 1.0);
                if p.is_finite() {
                    result.levels[i] = p;
                }
            }
        }

        let coder = ColorCoder::p_value(self.thresholds.red_level, self.thresholds.yellow_level);
        result.colors = coder.apply(counts, &mut result.levels);
        result.switch_flags = Some(switch_flags);
        result.switch_info = Some(switch_info);
        debug!(
            detector = Self::ID,
            sparse = init.sparse,
            tested = n - 2 * s,
            rejected,
            "gssages pass complete"
        );

        let holiday_flags = is_holiday.iter().map(|&h| f64::from(u8::from(h))).collect();
        Ok(result
            .with_output("level_state", level)
            .with_output("trend_state", trend)
            .with_output("seasonal_state", seasonal)
            .with_output("holiday", holiday_flags))
    }
}
