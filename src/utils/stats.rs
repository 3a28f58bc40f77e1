//! Statistical utility functions.
//!
//! Every function here is total: degenerate input (empty slices, all
//! non-finite values, invalid distribution parameters) yields a neutral
//! value instead of an error, so detectors can evaluate thousands of
//! baseline windows without special-casing each one.

use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

use super::matrix::interp1;

/// Calculate the mean of a slice.
///
/// Returns 0 for an empty slice or a non-finite result.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = values.iter().sum::<f64>() / values.len() as f64;
    if m.is_finite() {
        m
    } else {
        0.0
    }
}

/// Calculate the sample standard deviation (n-1 denominator).
///
/// Returns 0 for fewer than two values or a non-finite result.
pub fn std(values: &[f64]) -> f64 {
    let n = values.len();
    if n <= 1 {
        return 0.0;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|x| (x - m).powi(2)).sum();
    let sd = (sum_sq / (n - 1) as f64).sqrt();
    if sd.is_finite() {
        sd
    } else {
        0.0
    }
}

/// Calculate the median of a slice.
///
/// The midpoint is located with a 1-based ceiling division (`ceil(n / 2)`)
/// and then translated to 0-based storage; even-length input averages the
/// element at that midpoint with its successor. Returns 0 for an empty
/// slice.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    // 1-based midpoint
    let mid = n.div_ceil(2);
    if n % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid - 1]
    }
}

/// Calculate the `pct`-th percentile (0-100) of a slice.
///
/// Non-finite values are ignored. The sorted values are placed at the
/// mid-point percentile positions `100 * (k + 0.5) / n` and the result is
/// linearly interpolated between them; requests below the first or above
/// the last position clamp to the minimum or maximum.
///
/// Returns NaN when no finite values remain.
///
/// # Example
/// ```
/// use anofox_surveillance::utils::percentile;
///
/// let p = percentile(&[1.0, 2.0, 3.0, 4.0], 50.0);
/// assert!((p - 2.5).abs() < 1e-12);
/// assert!(percentile(&[], 95.0).is_nan());
/// ```
pub fn percentile(values: &[f64], pct: f64) -> f64 {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|x| x.is_finite()).collect();
    if sorted.is_empty() || pct.is_nan() {
        return f64::NAN;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }

    let positions: Vec<f64> = (0..n)
        .map(|k| 100.0 * (k as f64 + 0.5) / n as f64)
        .collect();
    interp1(&positions, &sorted, pct)
}

/// Normal cumulative distribution function.
///
/// Returns NaN for a non-positive or non-finite standard deviation.
pub fn normcdf(x: f64, mean: f64, sd: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    match Normal::new(mean, sd) {
        Ok(dist) if sd > 0.0 => dist.cdf(x),
        _ => f64::NAN,
    }
}

/// Student-t cumulative distribution function with `df` degrees of freedom.
///
/// Returns NaN for `df <= 0` or a NaN statistic.
pub fn tcdf(t: f64, df: f64) -> f64 {
    if t.is_nan() {
        return f64::NAN;
    }
    match students_t(df) {
        Some(dist) => dist.cdf(t),
        None => f64::NAN,
    }
}

/// Student-t quantile (inverse CDF) with `df` degrees of freedom.
///
/// `tinv(1 - alpha, df)` is the one-sided upper critical value at tail
/// probability `alpha`. Probabilities at or beyond 0 and 1 map to the
/// infinite tails.
///
/// # Example
/// ```
/// use anofox_surveillance::utils::tinv;
///
/// // Upper 1% point of t with 27 degrees of freedom.
/// assert!((tinv(0.99, 27.0) - 2.4727).abs() < 1e-3);
/// ```
pub fn tinv(p: f64, df: f64) -> f64 {
    if p.is_nan() {
        return f64::NAN;
    }
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    match students_t(df) {
        Some(dist) => dist.inverse_cdf(p),
        None => f64::NAN,
    }
}

fn students_t(df: f64) -> Option<StudentsT> {
    if df.is_nan() || df <= 0.0 {
        return None;
    }
    StudentsT::new(0.0, 1.0, df).ok()
}
