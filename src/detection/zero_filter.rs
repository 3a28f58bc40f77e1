//! Baseline zero-run filtering.
//!
//! Long runs of zeros in an otherwise active series usually mean missing
//! reports (a facility stopped sending data), not a real absence of cases.
//! Left in a baseline window they drag the mean down and inflate the
//! variance. The filter removes the runs that are improbably long given the
//! zero rate of the rest of the window.

use crate::utils::stats::median;

/// Configuration for zero-run filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct ZeroFilterConfig {
    /// A run of length `L` is kept once `p0^L` exceeds this probability,
    /// where `p0` is the zero fraction of the rest of the window.
    pub threshold_probability: f64,
    /// Runs shorter than this are never removed.
    pub min_run_length: usize,
    /// A filtered window with fewer strictly positive points is unusable.
    pub min_positive: usize,
}

impl Default for ZeroFilterConfig {
    fn default() -> Self {
        Self {
            threshold_probability: 0.01,
            min_run_length: 1,
            min_positive: 2,
        }
    }
}

impl ZeroFilterConfig {
    pub fn with_threshold_probability(mut self, p: f64) -> Self {
        self.threshold_probability = p;
        self
    }

    pub fn with_min_run_length(mut self, len: usize) -> Self {
        self.min_run_length = len.max(1);
        self
    }
}

/// Maximal run of consecutive zeros.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZeroRun {
    pub start: usize,
    pub len: usize,
}

impl ZeroRun {
    fn contains(&self, i: usize) -> bool {
        i >= self.start && i < self.start + self.len
    }
}

/// Every maximal run of zeros in `window`, in order of appearance.
pub fn zero_runs(window: &[f64]) -> Vec<ZeroRun> {
    let mut runs = Vec::new();
    let mut start = None;
    for (i, &x) in window.iter().enumerate() {
        match (x == 0.0, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                runs.push(ZeroRun { start: s, len: i - s });
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push(ZeroRun {
            start: s,
            len: window.len() - s,
        });
    }
    runs
}

/// Cheap pre-check: is this window active enough for zero runs to be
/// suspicious?
///
/// True when the median of the window is positive, or the median of its
/// non-zero values exceeds 4.
pub fn needs_filtering(window: &[f64]) -> bool {
    if median(window) > 0.0 {
        return true;
    }
    let non_zero: Vec<f64> = window.iter().copied().filter(|&x| x != 0.0).collect();
    median(&non_zero) > 4.0
}

/// Indices into `window` that survive zero-run filtering.
///
/// Runs are considered longest first. Each run is provisionally removed
/// and the zero fraction `p0` of the remaining points is computed; if
/// `p0^len` exceeds the threshold probability the run is plausible and
/// filtering stops, otherwise the run is dropped. An empty result means
/// the window has fewer than `min_positive` positive points left and must
/// not be used as a baseline.
///
/// # Example
/// ```
/// use anofox_surveillance::detection::{filter_baseline_zeros, ZeroFilterConfig};
///
/// let window = [5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 5.0];
/// let kept = filter_baseline_zeros(&window, &ZeroFilterConfig::default());
/// assert_eq!(kept, vec![0, 8]);
/// ```
pub fn filter_baseline_zeros(window: &[f64], config: &ZeroFilterConfig) -> Vec<usize> {
    let mut runs: Vec<ZeroRun> = zero_runs(window)
        .into_iter()
        .filter(|r| r.len >= config.min_run_length)
        .collect();
    // Stable: equal-length runs keep chronological order.
    runs.sort_by(|a, b| b.len.cmp(&a.len));

    let mut removed = vec![false; window.len()];
    for run in &runs {
        let (total, zeros) = window
            .iter()
            .enumerate()
            .filter(|&(i, _)| !removed[i] && !run.contains(i))
            .fold((0usize, 0usize), |(t, z), (_, &x)| {
                (t + 1, z + usize::from(x == 0.0))
            });
        let p0 = if total == 0 {
            0.0
        } else {
            zeros as f64 / total as f64
        };
        if p0.powi(run.len as i32) > config.threshold_probability {
            break;
        }
        for flag in &mut removed[run.start..run.start + run.len] {
            *flag = true;
        }
    }

    let kept: Vec<usize> = (0..window.len()).filter(|&i| !removed[i]).collect();
    let positives = kept.iter().filter(|&&i| window[i] > 0.0).count();
    if positives < config.min_positive {
        return Vec::new();
    }
    kept
}
