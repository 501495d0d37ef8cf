//! # Property-Based Tests
//!
//! Invariants of the progress calculator, aggregation rule and status
//! taxonomy, checked with proptest.

use okr_core::{
    Percent, StatusLabel, Tone, completion_rate, key_result_progress, objective_progress,
    selectable_statuses, status_display, time_elapsed, time_remaining,
};
use proptest::collection::vec;
use proptest::prelude::*;

fn finite() -> impl Strategy<Value = f64> {
    -1.0e6f64..1.0e6
}

/// Normal floats of both signs, up to `f64::MAX` in magnitude.
fn extreme() -> impl Strategy<Value = f64> {
    proptest::num::f64::NORMAL | proptest::num::f64::ZERO
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Progress is always inside [0, 100] when defined.
    #[test]
    fn progress_is_bounded(start in finite(), target in finite(), current in finite()) {
        if let Some(p) = key_result_progress(start, target, current) {
            prop_assert!(p.value() >= 0.0);
            prop_assert!(p.value() <= 100.0);
        }
    }

    /// Identical inputs give bit-identical output.
    #[test]
    fn progress_is_deterministic(start in finite(), target in finite(), current in finite()) {
        let a = key_result_progress(start, target, current).map(|p| p.value().to_bits());
        let b = key_result_progress(start, target, current).map(|p| p.value().to_bits());
        prop_assert_eq!(a, b);
    }

    /// A degenerate range never has a defined progress.
    #[test]
    fn degenerate_range_is_undefined(value in finite(), current in finite()) {
        prop_assert_eq!(key_result_progress(value, value, current), None);
    }

    /// Reaching the target is always 100 %, staying at start always 0 %.
    #[test]
    fn endpoints_map_to_bounds(start in finite(), target in finite()) {
        prop_assume!(start != target);
        prop_assert_eq!(key_result_progress(start, target, start), Some(Percent::ZERO));
        prop_assert_eq!(key_result_progress(start, target, target), Some(Percent::FULL));
    }

    /// Endpoints and bounds hold even when `target - start` overflows.
    #[test]
    fn endpoints_hold_over_full_f64_range(
        start in extreme(),
        target in extreme(),
        current in extreme(),
    ) {
        prop_assume!(start != target);
        prop_assert_eq!(key_result_progress(start, target, start), Some(Percent::ZERO));
        prop_assert_eq!(key_result_progress(start, target, target), Some(Percent::FULL));
        let p = key_result_progress(start, target, current).expect("defined");
        prop_assert!((0.0..=100.0).contains(&p.value()));
    }

    /// Moving toward the target never lowers progress, in either direction.
    #[test]
    fn progress_is_monotonic_toward_target(
        start in finite(),
        target in finite(),
        a in 0.0f64..1.0,
        b in 0.0f64..1.0,
    ) {
        prop_assume!(start != target);
        let (near, far) = if a <= b { (a, b) } else { (b, a) };
        let p_near = key_result_progress(start, target, start + (target - start) * near)
            .expect("defined");
        let p_far = key_result_progress(start, target, start + (target - start) * far)
            .expect("defined");
        prop_assert!(p_near.value() <= p_far.value() + 1e-9);
    }

    /// The mean lies between the smallest and largest input.
    #[test]
    fn mean_is_within_bounds(values in vec(0.0f64..=100.0, 1..30)) {
        let percents: Vec<Percent> = values.iter().copied().map(Percent::new).collect();
        let mean = objective_progress(&percents).expect("non-empty");
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(mean.value() >= min - 1e-9);
        prop_assert!(mean.value() <= max + 1e-9);
    }

    /// Aggregating the same key results again yields the same value.
    #[test]
    fn aggregation_is_idempotent(
        values in vec(0.0f64..=100.0, 0..30),
        stored in 0.0f64..=100.0,
    ) {
        let percents: Vec<Percent> = values.iter().copied().map(Percent::new).collect();
        let once = objective_progress(&percents).unwrap_or(Percent::new(stored));
        let twice = objective_progress(&percents).unwrap_or(once);
        prop_assert_eq!(once.value().to_bits(), twice.value().to_bits());
    }

    /// Order of key results does not change the mean.
    #[test]
    fn mean_ignores_order(values in vec(0.0f64..=100.0, 1..30)) {
        let forward: Vec<Percent> = values.iter().copied().map(Percent::new).collect();
        let mut backward = forward.clone();
        backward.reverse();
        let a = objective_progress(&forward).expect("non-empty").value();
        let b = objective_progress(&backward).expect("non-empty").value();
        prop_assert!((a - b).abs() < 1e-9);
    }

    /// Percent construction always clamps.
    #[test]
    fn percent_always_clamps(raw in proptest::num::f64::ANY) {
        let p = Percent::new(raw);
        prop_assert!((0.0..=100.0).contains(&p.value()));
        prop_assert!(p.rounded() <= 100);
    }

    /// Every label string renders, never failing.
    #[test]
    fn any_label_renders(label in ".{0,40}") {
        let display = status_display(&label);
        match StatusLabel::parse(&label) {
            Some(known) => prop_assert_eq!(display.label, known.as_str()),
            None => {
                prop_assert_eq!(display.tone, Tone::Unknown);
                prop_assert_eq!(display.label, label.trim());
            }
        }
    }

    /// Picker output is the allow-list in canonical order.
    #[test]
    fn picker_respects_allow_list(mask in vec(any::<bool>(), 6)) {
        let allow: Vec<StatusLabel> = StatusLabel::ALL
            .iter()
            .zip(&mask)
            .filter(|(_, keep)| **keep)
            .map(|(label, _)| *label)
            .collect();
        let options = selectable_statuses(Some(&allow));
        let values: Vec<&str> = options.iter().map(|o| o.value.as_str()).collect();
        let expected: Vec<&str> = allow.iter().map(StatusLabel::as_str).collect();
        prop_assert_eq!(values, expected);
    }

    /// Completion rate is bounded for any counts.
    #[test]
    fn completion_rate_bounded(completed in 0usize..1000, total in 0usize..1000) {
        let rate = completion_rate(completed.min(total), total);
        prop_assert!((0.0..=100.0).contains(&rate.value()));
    }

    /// Elapsed and remaining time always add up to 100 %.
    #[test]
    fn elapsed_and_remaining_are_complements(
        start in 0i64..3650,
        length in 0i64..400,
        offset in -100i64..600,
    ) {
        let epoch = chrono::NaiveDate::from_ymd_opt(2020, 1, 1).expect("date");
        let s = epoch + chrono::Days::new(start as u64);
        let e = s + chrono::Days::new(length as u64);
        let today = if offset >= 0 {
            s + chrono::Days::new(offset as u64)
        } else {
            s - chrono::Days::new(offset.unsigned_abs())
        };
        let total = time_elapsed(s, e, today).value() + time_remaining(s, e, today).value();
        prop_assert!((total - 100.0).abs() < 1e-9);
    }
}
