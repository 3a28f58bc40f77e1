//! Detection machinery shared by every detector.
//!
//! This module provides:
//! - Baseline zero-run filtering
//! - Post-detection color coding

mod color;
mod zero_filter;

pub use color::{AlertColor, ColorCoder, LevelDirection};
pub use zero_filter::{
    filter_baseline_zeros, needs_filtering, zero_runs, ZeroFilterConfig, ZeroRun,
};
