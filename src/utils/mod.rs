//! Numeric primitives shared by every detector.

pub mod matrix;
pub mod stats;

pub use matrix::{
    flatten_column_major, from_one_based, gather, interp1, reshape, reshape_matrix, row_means,
    scatter, transpose,
};
pub use stats::{mean, median, normcdf, percentile, std, tcdf, tinv};
