//! Property-based tests for the controller's core invariants.

use proptest::prelude::*;

use crate::bands::{select_band, BreathMode, BANDS, GUARDRAILS};
use crate::controller::BreathCoachController;
use crate::signal::ramp_limit;

const SEC: i64 = 1_000_000;

fn any_mode() -> impl Strategy<Value = BreathMode> {
    prop_oneof![
        Just(BreathMode::Calm),
        Just(BreathMode::Focus),
        Just(BreathMode::WindDown),
        Just(BreathMode::Relief),
    ]
}

proptest! {
    // Band selection is total: any finite input resolves to some band
    // without panicking, even far outside [0, 1].
    #[test]
    fn band_selection_is_total(x in -2.0f32..3.0f32, current in any_mode()) {
        let (mode, pattern) = select_band(x, current, 0.07);
        prop_assert!(BANDS.iter().any(|b| b.mode == mode));
        prop_assert!(pattern.total() > 0.0);
    }

    // In-band values always resolve to their own band or the held one.
    #[test]
    fn selection_never_strays_past_a_neighbor(x in 0.0f32..1.0f32, current in any_mode()) {
        let (mode, _) = select_band(x, current, 0.07);
        let raw = BANDS
            .iter()
            .find(|b| x >= b.lo && x < b.hi)
            .map(|b| b.mode)
            .unwrap_or(BreathMode::Calm);
        // Hysteresis may hold the current band near an edge, but never
        // selects some third band.
        prop_assert!(mode == raw || mode == current);
    }

    // The ramped value never moves more than the permitted fraction.
    #[test]
    fn ramp_step_is_bounded(prev in 0.1f32..60.0f32, cand in 0.0f32..60.0f32) {
        let next = ramp_limit(prev, cand, 0.10);
        prop_assert!((next - prev).abs() <= prev * 0.10 + 1e-4);
    }

    // Smoothed stress stays within [0, 1] for any in-range input sequence.
    #[test]
    fn smoothed_stress_stays_in_unit_interval(samples in prop::collection::vec(0.0f32..=1.0f32, 1..40)) {
        let c = BreathCoachController::new();
        for (i, p) in samples.iter().enumerate() {
            c.push_face_stress_at(Some("u"), *p, true, "ok", (i as i64 + 1) * SEC);
        }
        let st = c.get_status_at(Some("u"), (samples.len() as i64 + 1) * SEC);
        prop_assert!((0.0..=1.0).contains(&st.stress_smoothed));
        prop_assert!((0.0..=1.0).contains(&st.stress_raw));
    }

    // Every plan's pattern respects the hard guardrails, and at least one
    // cycle is always prescribed.
    #[test]
    fn plans_respect_guardrails(
        samples in prop::collection::vec(0.0f32..=1.0f32, 1..20),
        window in 1u32..600,
    ) {
        let c = BreathCoachController::new();
        let mut now = SEC;
        for p in &samples {
            c.push_face_stress_at(Some("u"), *p, true, "ok", now);
            now += SEC;
        }
        let plan = c.plan_at(Some("u"), Some(window), now);
        prop_assert!(plan.cycles >= 1);
        prop_assert_eq!(plan.pattern.len(), 4);
        let bounds = [
            GUARDRAILS.inhale,
            GUARDRAILS.hold_in,
            GUARDRAILS.exhale,
            GUARDRAILS.hold_out,
        ];
        for (step, (lo, hi)) in plan.pattern.iter().zip(bounds) {
            prop_assert!(step.seconds >= lo && step.seconds <= hi);
        }
    }

    // The prescribed cycle count always reflects a ramp-limited cycle
    // length: replaying the ramp from the default Calm cycle over the
    // emitted patterns reproduces every plan's count, whatever the stress
    // trajectory does.
    #[test]
    fn cycle_counts_follow_ramped_length(samples in prop::collection::vec(0.0f32..=1.0f32, 2..30)) {
        let c = BreathCoachController::new();
        let mut expected_len = 10.0f32;
        let mut now = SEC;
        for p in &samples {
            c.push_face_stress_at(Some("u"), *p, true, "ok", now);
            let plan = c.plan_at(Some("u"), Some(60), now);
            let candidate = plan.pattern.iter().map(|s| s.seconds).sum::<f32>();
            expected_len = ramp_limit(expected_len, candidate, 0.10);
            let expected_cycles = ((60.0 / expected_len).floor() as u32).max(1);
            prop_assert_eq!(plan.cycles, expected_cycles);
            now += SEC;
        }
    }
}
