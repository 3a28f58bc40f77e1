//! Golden-vector tests for the CDC EARS family.
//!
//! Expected statistics were computed independently from the published
//! EARS definitions (7-day baseline, sigma floor 0.2, k = 1, CUSUM reset
//! at 2) and are compared to a tolerance of 1e-9.

use anofox_surveillance::core::DetectionContext;
use anofox_surveillance::detection::AlertColor;
use anofox_surveillance::detectors::{Detector, EarsDetector};
use approx::assert_relative_eq;
use chrono::NaiveDate;

const COUNTS: [f64; 30] = [
    12.0, 15.0, 9.0, 14.0, 11.0, 13.0, 10.0, 16.0, 12.0, 11.0, 14.0, 25.0, 13.0, 12.0, 10.0,
    15.0, 13.0, 34.0, 28.0, 14.0, 12.0, 11.0, 0.0, 13.0, 15.0, 12.0, 9.0, 14.0, 40.0, 13.0,
];

const C1_EXPECTED: [f64; 30] = [
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.851640199545, 0.0, 0.0, 0.0, 5.072576922213, 0.0, 0.0,
    0.0, 0.0, 0.0, 2.997695188515, 0.205098785765, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
    4.814169517655, 0.0,
];

const C2_EXPECTED: [f64; 30] = [
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 4.334260262932, 0.0, 0.0, 0.0, 0.0,
    0.0, 2.964889395401, 1.729888478514, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
    4.761715753233, 0.0,
];

const C3_EXPECTED: [f64; 30] = [
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 4.334260262932, 0.0, 0.0, 0.0, 0.0,
    0.0, 2.964889395401, 1.729888478514, 1.729888478514, 1.729888478514, 0.0, 0.0, 0.0, 0.0,
    0.0, 0.0, 0.0, 4.761715753233, 0.0,
];

fn context() -> DetectionContext {
    DetectionContext::daily(
        COUNTS.to_vec(),
        NaiveDate::from_ymd_opt(2023, 6, 5).unwrap(),
    )
}

fn assert_statistics(detector: &EarsDetector, expected: &[f64]) {
    let mut ctx = context();
    detector.run_detector(&mut ctx).unwrap();
    for (i, (&got, &want)) in ctx.test_statistics().iter().zip(expected).enumerate() {
        assert_relative_eq!(got, want, epsilon = 1e-9, max_relative = 1e-9);
        if COUNTS[i] > 0.0 {
            assert_relative_eq!(ctx.levels()[i], want, epsilon = 1e-9, max_relative = 1e-9);
        }
    }
}

#[test]
fn c1_matches_golden_vector() {
    assert_statistics(&EarsDetector::c1(), &C1_EXPECTED);
}

#[test]
fn c2_matches_golden_vector() {
    assert_statistics(&EarsDetector::c2(), &C2_EXPECTED);
}

#[test]
fn c3_matches_golden_vector() {
    assert_statistics(&EarsDetector::c3(), &C3_EXPECTED);
}

#[test]
fn c1_colors() {
    let mut ctx = context();
    EarsDetector::c1().run_detector(&mut ctx).unwrap();
    let colors = ctx.colors();

    assert_eq!(colors[11], AlertColor::Alert);
    assert_eq!(colors[17], AlertColor::Warning);
    assert_eq!(colors[28], AlertColor::Alert);
    assert_eq!(colors[7], AlertColor::SubThreshold);
    assert_eq!(colors[18], AlertColor::SubThreshold);
    assert_eq!(colors[22], AlertColor::Normal);
    assert_eq!(colors[0], AlertColor::Normal);
}

#[test]
fn c1_expecteds_are_baseline_means() {
    let mut ctx = context();
    EarsDetector::c1().run_detector(&mut ctx).unwrap();
    // Baseline for index 11 is indices 4..11.
    assert_relative_eq!(ctx.expecteds()[11], 87.0 / 7.0, epsilon = 1e-12);
    assert_eq!(ctx.expecteds()[6], 0.0);
    assert_eq!(
        ctx.output_value("baseline_mean").map(|v| v.len()),
        Some(COUNTS.len())
    );
}

#[test]
fn c3_carries_two_days_after_sub_threshold_signal() {
    let mut ctx = context();
    EarsDetector::c3().run_detector(&mut ctx).unwrap();
    let stats = ctx.test_statistics();
    // Day 17 exceeds the reset threshold, day 18 does not: day 18 carries
    // into days 19 and 20 only.
    assert_relative_eq!(stats[19], stats[18], epsilon = 1e-12);
    assert_relative_eq!(stats[20], stats[18], epsilon = 1e-12);
    assert_eq!(stats[21], 0.0);
}
