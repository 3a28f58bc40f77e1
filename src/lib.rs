//! # anofox-surveillance
//!
//! Temporal anomaly detection for public-health surveillance counts.
//!
//! Provides the EWMA Sages detector, the CDC EARS C1/C2/C3 family and
//! generalized seasonal adaptive smoothing (GSSages), together with the
//! shared machinery they rely on: baseline zero-run filtering, a holiday
//! calendar, alert color coding and a data container that carries counts
//! and results between callers and detectors.
//!
//! # Example
//! ```
//! use anofox_surveillance::prelude::*;
//! use chrono::NaiveDate;
//!
//! let registry = DetectorRegistry::bundled().unwrap();
//! let detector = registry.create("C2").unwrap();
//!
//! let mut counts = vec![12.0, 9.0, 11.0, 10.0, 13.0, 12.0, 10.0, 11.0, 9.0];
//! counts.push(35.0);
//! let start = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
//! let mut ctx = DetectionContext::daily(counts, start);
//!
//! detector.run_detector(&mut ctx).unwrap();
//! assert_eq!(ctx.colors()[9], AlertColor::Alert);
//! ```

#![allow(clippy::needless_range_loop)]

pub mod calendar;
pub mod config;
pub mod core;
pub mod detection;
pub mod detectors;
pub mod error;
pub mod report;
pub mod utils;

pub use error::{DetectionError, Result};

pub mod prelude {
    pub use crate::calendar::{HolidayCalendar, HolidaySource};
    pub use crate::config::{ThresholdTable, Thresholds};
    pub use crate::core::{DetectionContext, DetectionResult, TimeResolution};
    pub use crate::detection::AlertColor;
    pub use crate::detectors::{
        Detector, DetectorRegistry, EarsDetector, EwmaSagesDetector, GsSagesDetector,
    };
    pub use crate::error::{DetectionError, Result};
    pub use crate::report::{run_report, ReportOptions, ReportSeries, SeriesOutcome};
}
