//! Property-based tests for the detectors and their shared machinery.
//!
//! These tests verify invariants that should hold for all valid inputs,
//! using randomly generated count series.

use anofox_surveillance::core::{DetectionContext, DEFAULT_LEVEL};
use anofox_surveillance::detection::{
    filter_baseline_zeros, AlertColor, ColorCoder, ZeroFilterConfig,
};
use anofox_surveillance::detectors::{
    Detector, EarsDetector, EwmaSagesDetector, GsSagesDetector,
};
use anofox_surveillance::utils::{median, percentile};
use chrono::NaiveDate;
use proptest::prelude::*;

fn make_context(counts: &[f64]) -> DetectionContext {
    DetectionContext::daily(counts.to_vec(), NaiveDate::from_ymd_opt(2023, 1, 2).unwrap())
}

/// Strategy for count series: non-negative integers with occasional
/// zeros and bursts.
fn counts_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(
        prop_oneof![
            3 => 0u32..5,
            6 => 5u32..40,
            1 => 40u32..200,
        ]
        .prop_map(f64::from),
        min_len..max_len,
    )
}

fn detectors() -> Vec<Box<dyn Detector>> {
    vec![
        Box::new(EwmaSagesDetector::default()),
        Box::new(EarsDetector::c1()),
        Box::new(EarsDetector::c2()),
        Box::new(EarsDetector::c3()),
        Box::new(GsSagesDetector::default()),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn outputs_match_input_length(counts in counts_strategy(56, 150)) {
        for detector in detectors() {
            let result = detector.detect(&make_context(&counts)).unwrap();
            prop_assert_eq!(result.levels.len(), counts.len());
            prop_assert_eq!(result.colors.len(), counts.len());
            prop_assert_eq!(result.expecteds.len(), counts.len());
            prop_assert_eq!(result.test_statistics.len(), counts.len());
            for values in result.output_values.values() {
                prop_assert_eq!(values.len(), counts.len());
            }
        }
    }

    #[test]
    fn detection_is_deterministic(counts in counts_strategy(56, 120)) {
        for detector in detectors() {
            let mut first = make_context(&counts);
            let mut second = make_context(&counts);
            detector.run_detector(&mut first).unwrap();
            detector.run_detector(&mut second).unwrap();
            // Running twice on the same context overwrites, never accumulates.
            detector.run_detector(&mut second).unwrap();
            prop_assert_eq!(first.levels(), second.levels());
            prop_assert_eq!(first.colors(), second.colors());
        }
    }

    #[test]
    fn p_value_levels_stay_in_unit_interval(counts in counts_strategy(56, 150)) {
        let ewma = EwmaSagesDetector::default().detect(&make_context(&counts)).unwrap();
        let gs = GsSagesDetector::default().detect(&make_context(&counts)).unwrap();
        for level in ewma.levels.iter().chain(gs.levels.iter()) {
            prop_assert!((0.0..=1.0).contains(level), "level {}", level);
        }
    }

    #[test]
    fn ears_levels_are_non_negative(counts in counts_strategy(8, 100)) {
        for detector in [EarsDetector::c1(), EarsDetector::c2(), EarsDetector::c3()] {
            let result = detector.detect(&make_context(&counts)).unwrap();
            prop_assert!(result.levels.iter().all(|&l| l >= 0.0 && l.is_finite()));
        }
    }

    #[test]
    fn single_day_ears_ignores_zero_counts(counts in counts_strategy(8, 120)) {
        // C3 carries earlier days forward, so only C1 and C2 qualify.
        for detector in [EarsDetector::c1(), EarsDetector::c2()] {
            let result = detector.detect(&make_context(&counts)).unwrap();
            for (i, &x) in counts.iter().enumerate() {
                if x == 0.0 {
                    prop_assert_eq!(result.colors[i], AlertColor::Normal);
                }
            }
        }
    }

    #[test]
    fn gssages_short_series_always_rejected(counts in counts_strategy(0, 56)) {
        prop_assert!(GsSagesDetector::default().detect(&make_context(&counts)).is_err());
    }

    #[test]
    fn crop_is_consistent(counts in counts_strategy(30, 80), n in 0usize..100) {
        let mut ctx = make_context(&counts);
        EwmaSagesDetector::default().run_detector(&mut ctx).unwrap();
        let levels_before = ctx.levels().to_vec();
        ctx.crop_startup(n).unwrap();
        let kept = counts.len().saturating_sub(n);
        prop_assert_eq!(ctx.len(), kept);
        prop_assert_eq!(ctx.levels(), &levels_before[counts.len() - kept..]);
    }

    #[test]
    fn zero_filter_keeps_sorted_subset(window in counts_strategy(0, 40)) {
        let kept = filter_baseline_zeros(&window, &ZeroFilterConfig::default());
        prop_assert!(kept.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(kept.iter().all(|&i| i < window.len()));
        // Positive points are never removed.
        if !kept.is_empty() {
            for (i, &x) in window.iter().enumerate() {
                if x > 0.0 {
                    prop_assert!(kept.contains(&i));
                }
            }
        }
    }

    #[test]
    fn color_coder_is_monotone(a in 0.0..10.0_f64, b in 0.0..10.0_f64) {
        let coder = ColorCoder::statistic(3.0, 2.0);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(
            coder.classify(lo) <= coder.classify(hi)
                || coder.classify(lo) == AlertColor::SubThreshold
        );

        let coder = ColorCoder::p_value(0.01, 0.05);
        let (p_lo, p_hi) = (lo / 10.0, hi / 10.0);
        prop_assert!(
            coder.classify(p_hi) <= coder.classify(p_lo)
                || p_lo == DEFAULT_LEVEL
                || p_hi == DEFAULT_LEVEL
        );
    }

    #[test]
    fn percentile_bounded_by_extremes(
        values in prop::collection::vec(-100.0..100.0_f64, 1..50),
        p in 0.0..100.0_f64,
    ) {
        let q = percentile(&values, p);
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(q >= min - 1e-9 && q <= max + 1e-9);
        let m = median(&values);
        prop_assert!(m >= min && m <= max);
    }
}
