//! DetectionContext: the data container detectors read from and write into.

use std::collections::HashMap;

use chrono::{Days, Months, NaiveDate};

use super::result::DetectionResult;
use crate::detection::AlertColor;
use crate::error::{DetectionError, Result};

/// Spacing between consecutive counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeResolution {
    #[default]
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl TimeResolution {
    /// The date `steps` periods after `date`, or `None` on overflow.
    ///
    /// Calendar-month resolutions clamp to the end of shorter months.
    pub fn advance(self, date: NaiveDate, steps: u64) -> Option<NaiveDate> {
        let months = |per_step: u64| {
            u32::try_from(steps.checked_mul(per_step)?)
                .ok()
                .and_then(|m| date.checked_add_months(Months::new(m)))
        };
        match self {
            TimeResolution::Daily => date.checked_add_days(Days::new(steps)),
            TimeResolution::Weekly => date.checked_add_days(Days::new(steps.checked_mul(7)?)),
            TimeResolution::Monthly => months(1),
            TimeResolution::Quarterly => months(3),
            TimeResolution::Yearly => months(12),
        }
    }
}

/// Counts plus everything detectors produce for them.
///
/// A context is created per series, filled with counts and a start date,
/// handed to exactly one detector run at a time, and finally cropped and
/// read by the caller. All output arrays have the same length as
/// `counts`.
///
/// # Example
/// ```
/// use anofox_surveillance::core::{DetectionContext, TimeResolution};
/// use chrono::NaiveDate;
///
/// let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
/// let mut ctx = DetectionContext::new(vec![3.0, 4.0, 5.0], start, TimeResolution::Weekly);
/// assert_eq!(ctx.dates()[2], NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
///
/// ctx.crop_startup(1).unwrap();
/// assert_eq!(ctx.counts(), &[4.0, 5.0]);
/// assert_eq!(ctx.start_date(), NaiveDate::from_ymd_opt(2024, 3, 8).unwrap());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionContext {
    counts: Vec<f64>,
    start_date: NaiveDate,
    resolution: TimeResolution,
    dates: Option<Vec<NaiveDate>>,
    regressors: HashMap<String, Vec<f64>>,
    levels: Vec<f64>,
    colors: Vec<AlertColor>,
    expecteds: Vec<f64>,
    r2_levels: Vec<f64>,
    switch_flags: Vec<f64>,
    switch_info: Vec<String>,
    test_statistics: Vec<f64>,
    output_values: HashMap<String, Vec<f64>>,
}

/// Level every context starts with: "no signal".
pub const DEFAULT_LEVEL: f64 = 0.5;

impl DetectionContext {
    pub fn new(counts: Vec<f64>, start_date: NaiveDate, resolution: TimeResolution) -> Self {
        let n = counts.len();
        Self {
            counts,
            start_date,
            resolution,
            dates: None,
            regressors: HashMap::new(),
            levels: vec![DEFAULT_LEVEL; n],
            colors: vec![AlertColor::Normal; n],
            expecteds: vec![0.0; n],
            r2_levels: vec![0.0; n],
            switch_flags: vec![0.0; n],
            switch_info: vec![String::new(); n],
            test_statistics: vec![0.0; n],
            output_values: HashMap::new(),
        }
    }

    /// Daily context starting at `start_date`.
    pub fn daily(counts: Vec<f64>, start_date: NaiveDate) -> Self {
        Self::new(counts, start_date, TimeResolution::Daily)
    }

    /// Supply explicit dates instead of deriving them from the start date.
    pub fn with_dates(mut self, dates: Vec<NaiveDate>) -> Result<Self> {
        self.set_dates(dates)?;
        Ok(self)
    }

    /// Attach a named regressor.
    pub fn with_regressor(mut self, name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        self.set_regressor(name, values)?;
        Ok(self)
    }

    /// Number of time steps.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn counts(&self) -> &[f64] {
        &self.counts
    }

    /// Replace the counts and reset every output to "no signal".
    ///
    /// Explicit dates and regressors of a different length are dropped.
    pub fn set_counts(&mut self, counts: Vec<f64>) {
        let n = counts.len();
        self.counts = counts;
        if self.dates.as_ref().is_some_and(|d| d.len() != n) {
            self.dates = None;
        }
        self.regressors.retain(|_, v| v.len() == n);
        self.levels = vec![DEFAULT_LEVEL; n];
        self.colors = vec![AlertColor::Normal; n];
        self.expecteds = vec![0.0; n];
        self.r2_levels = vec![0.0; n];
        self.switch_flags = vec![0.0; n];
        self.switch_info = vec![String::new(); n];
        self.test_statistics = vec![0.0; n];
        self.output_values.clear();
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn set_start_date(&mut self, start_date: NaiveDate) {
        self.start_date = start_date;
    }

    pub fn resolution(&self) -> TimeResolution {
        self.resolution
    }

    pub fn set_resolution(&mut self, resolution: TimeResolution) {
        self.resolution = resolution;
    }

    /// Explicit dates must match the counts one to one.
    pub fn set_dates(&mut self, dates: Vec<NaiveDate>) -> Result<()> {
        if dates.len() != self.counts.len() {
            return Err(DetectionError::DimensionMismatch {
                expected: self.counts.len(),
                got: dates.len(),
            });
        }
        if let Some(&first) = dates.first() {
            self.start_date = first;
        }
        self.dates = Some(dates);
        Ok(())
    }

    /// Dates of every count: the explicit dates if supplied, otherwise
    /// generated from the start date and resolution.
    pub fn dates(&self) -> Vec<NaiveDate> {
        match &self.dates {
            Some(dates) => dates.clone(),
            None => (0..self.counts.len())
                .map_while(|i| self.resolution.advance(self.start_date, i as u64))
                .collect(),
        }
    }

    pub fn regressors(&self) -> &HashMap<String, Vec<f64>> {
        &self.regressors
    }

    pub fn regressor(&self, name: &str) -> Option<&[f64]> {
        self.regressors.get(name).map(|v| v.as_slice())
    }

    /// Attach a named regressor; it must be as long as the counts.
    pub fn set_regressor(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        if values.len() != self.counts.len() {
            return Err(DetectionError::DimensionMismatch {
                expected: self.counts.len(),
                got: values.len(),
            });
        }
        self.regressors.insert(name.into(), values);
        Ok(())
    }

    /// Store a copy of the counts delayed by `lag` steps (leading points
    /// zero-filled) as regressor `name`.
    pub fn derive_lag_regressor(&mut self, name: impl Into<String>, lag: usize) {
        let n = self.counts.len();
        let lagged: Vec<f64> = (0..n)
            .map(|i| if i >= lag { self.counts[i - lag] } else { 0.0 })
            .collect();
        self.regressors.insert(name.into(), lagged);
    }

    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    pub fn colors(&self) -> &[AlertColor] {
        &self.colors
    }

    pub fn expecteds(&self) -> &[f64] {
        &self.expecteds
    }

    pub fn r2_levels(&self) -> &[f64] {
        &self.r2_levels
    }

    pub fn switch_flags(&self) -> &[f64] {
        &self.switch_flags
    }

    pub fn switch_info(&self) -> &[String] {
        &self.switch_info
    }

    pub fn test_statistics(&self) -> &[f64] {
        &self.test_statistics
    }

    pub fn output_values(&self) -> &HashMap<String, Vec<f64>> {
        &self.output_values
    }

    pub fn output_value(&self, name: &str) -> Option<&[f64]> {
        self.output_values.get(name).map(|v| v.as_slice())
    }

    /// Write a detector result into the context.
    pub fn apply(&mut self, result: DetectionResult) -> Result<()> {
        let n = self.counts.len();
        if result.len() != n {
            return Err(DetectionError::DimensionMismatch {
                expected: n,
                got: result.len(),
            });
        }
        self.levels = result.levels;
        self.colors = result.colors;
        self.expecteds = result.expecteds;
        self.test_statistics = result.test_statistics;
        self.r2_levels = result.r2_levels.unwrap_or_else(|| vec![0.0; n]);
        self.switch_flags = result.switch_flags.unwrap_or_else(|| vec![0.0; n]);
        self.switch_info = result
            .switch_info
            .unwrap_or_else(|| vec![String::new(); n]);
        self.output_values = result.output_values;
        Ok(())
    }

    /// Discard the first `n` points of every array.
    ///
    /// Inputs, outputs, regressors, diagnostics and explicit dates all
    /// shrink by `min(n, len)`; the start date advances `n` resolution
    /// steps. Fails only when the new start date is unrepresentable.
    pub fn crop_startup(&mut self, n: usize) -> Result<()> {
        if n == 0 {
            return Ok(());
        }
        let new_start = self
            .resolution
            .advance(self.start_date, n as u64)
            .ok_or_else(|| {
                DetectionError::InvalidParameter(format!(
                    "cropping {n} steps moves the start date out of range"
                ))
            })?;

        fn crop<T>(v: &mut Vec<T>, n: usize) {
            v.drain(..n.min(v.len()));
        }

        crop(&mut self.counts, n);
        crop(&mut self.levels, n);
        crop(&mut self.colors, n);
        crop(&mut self.expecteds, n);
        crop(&mut self.r2_levels, n);
        crop(&mut self.switch_flags, n);
        crop(&mut self.switch_info, n);
        crop(&mut self.test_statistics, n);
        for values in self.regressors.values_mut() {
            crop(values, n);
        }
        for values in self.output_values.values_mut() {
            crop(values, n);
        }
        if let Some(dates) = self.dates.as_mut() {
            crop(dates, n);
        }
        self.start_date = new_start;
        Ok(())
    }
}
