//! Array reshaping, interpolation and index helpers.
//!
//! Matrices are `Vec<Vec<f64>>` stored row by row (`m[row][col]`), but
//! reshaping always walks elements in column-major order: element `n` of the
//! flattened input lands at `[n % rows][n / rows]`. The seasonal
//! initialisation of the adaptive smoothing detector relies on this layout
//! to group observations by weekday.
//!
//! All index helpers are 0-based. Index vectors that arrive 1-based must be
//! converted with [`from_one_based`] first.

/// Reshape a vector into a `rows x cols` matrix in column-major order.
///
/// Missing elements (input shorter than `rows * cols`) are NaN; surplus
/// input is ignored.
///
/// # Example
/// ```
/// use anofox_surveillance::utils::reshape;
///
/// let m = reshape(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3);
/// assert_eq!(m[0], vec![1.0, 3.0, 5.0]);
/// assert_eq!(m[1], vec![2.0, 4.0, 6.0]);
/// ```
pub fn reshape(values: &[f64], rows: usize, cols: usize) -> Vec<Vec<f64>> {
    let mut out = vec![vec![f64::NAN; cols]; rows];
    if rows == 0 {
        return out;
    }
    for (n, &v) in values.iter().take(rows * cols).enumerate() {
        out[n % rows][n / rows] = v;
    }
    out
}

/// Reshape a matrix into a `rows x cols` matrix, reading and writing in
/// column-major order.
pub fn reshape_matrix(matrix: &[Vec<f64>], rows: usize, cols: usize) -> Vec<Vec<f64>> {
    reshape(&flatten_column_major(matrix), rows, cols)
}

/// Flatten a matrix column by column.
pub fn flatten_column_major(matrix: &[Vec<f64>]) -> Vec<f64> {
    let n_rows = matrix.len();
    let n_cols = matrix.iter().map(|r| r.len()).max().unwrap_or(0);
    let mut out = Vec::with_capacity(n_rows * n_cols);
    for c in 0..n_cols {
        for row in matrix {
            out.push(row.get(c).copied().unwrap_or(f64::NAN));
        }
    }
    out
}

/// Transpose a (possibly ragged) matrix; missing cells become NaN.
pub fn transpose(matrix: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n_cols = matrix.iter().map(|r| r.len()).max().unwrap_or(0);
    (0..n_cols)
        .map(|c| {
            matrix
                .iter()
                .map(|row| row.get(c).copied().unwrap_or(f64::NAN))
                .collect()
        })
        .collect()
}

/// Mean of every matrix row.
pub fn row_means(matrix: &[Vec<f64>]) -> Vec<f64> {
    matrix.iter().map(|row| super::stats::mean(row)).collect()
}

/// Piecewise-linear interpolation of `(xs, ys)` at `x`.
///
/// `xs` must be ascending. Requests outside `[xs[0], xs[last]]` clamp to the
/// end values. Returns NaN for empty or mismatched input.
pub fn interp1(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    if xs.is_empty() || xs.len() != ys.len() || x.is_nan() {
        return f64::NAN;
    }
    let last = xs.len() - 1;
    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[last] {
        return ys[last];
    }
    // First knot strictly greater than x
    let hi = xs.partition_point(|&k| k <= x);
    let lo = hi - 1;
    let span = xs[hi] - xs[lo];
    if span <= 0.0 {
        return ys[lo];
    }
    ys[lo] + (ys[hi] - ys[lo]) * (x - xs[lo]) / span
}

/// Select `values[i]` for every 0-based index; out-of-range indices are
/// skipped.
pub fn gather(values: &[f64], indices: &[usize]) -> Vec<f64> {
    indices
        .iter()
        .filter_map(|&i| values.get(i).copied())
        .collect()
}

/// Write `values[k]` to `target[indices[k]]`; out-of-range indices and
/// surplus values are skipped.
pub fn scatter(target: &mut [f64], indices: &[usize], values: &[f64]) {
    for (&i, &v) in indices.iter().zip(values) {
        if let Some(slot) = target.get_mut(i) {
            *slot = v;
        }
    }
}

/// Convert 1-based indices to 0-based ones, dropping index 0.
pub fn from_one_based(indices: &[usize]) -> Vec<usize> {
    indices.iter().filter(|&&i| i > 0).map(|&i| i - 1).collect()
}
