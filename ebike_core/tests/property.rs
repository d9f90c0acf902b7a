use ebike_core::cruise::CruiseInput;
use ebike_core::{
    CadenceDetector, CruiseCfg, CruiseController, CruiseState, PedalCfg, RampCfg, RampGenerator,
    clamp, within_tolerance,
};
use proptest::prelude::*;

proptest! {
    #[test]
    fn clamp_result_is_within_bounds(v in any::<u16>(), lo in 0u16..2048, span in 0u16..2048) {
        let hi = lo + span;
        let c = clamp(v, lo, hi);
        prop_assert!(lo <= c && c <= hi);
        if (lo..=hi).contains(&v) {
            prop_assert_eq!(c, v);
        }
    }

    #[test]
    fn tolerance_is_symmetric(a in any::<u16>(), b in any::<u16>(), t in any::<u16>()) {
        prop_assert_eq!(within_tolerance(a, b, t), within_tolerance(b, a, t));
    }

    #[test]
    fn stray_edge_never_asserts_pedaling(
        activation in 2u8..=4,
        tolerance in 0u8..=10,
        base_gap in 10u64..500,
        extra in 1u64..5_000,
    ) {
        let cfg = PedalCfg { activation_edges: activation, pas_tolerance: tolerance, base_gap_ms: base_gap, magnets: 12 };
        let timeout = cfg.idle_timeout_ms();
        let mut d = CadenceDetector::new(&cfg);
        prop_assert!(!d.update(1, 1_000));
        prop_assert!(!d.update(0, 1_000 + timeout + extra));
        prop_assert!(!d.update(1, 1_000 + 2 * (timeout + extra)));
    }

    #[test]
    fn cruise_never_fixes_before_fix_pulses(fix in 2u16..40, level in 200u16..4000) {
        let mut c = CruiseController::new(CruiseCfg { fix_pulses: fix, ..CruiseCfg::default() });
        for i in 0..u64::from(fix - 1) {
            c.update(CruiseInput { pedaling: true, brake: false, level, engaged: true, now_ms: i * 140 });
            let fixed = matches!(c.state(), CruiseState::Fixed { .. });
            prop_assert!(!fixed, "fixed after {} pulses", i + 1);
        }
        c.update(CruiseInput { pedaling: true, brake: false, level, engaged: true, now_ms: 10_000 });
        prop_assert_eq!(c.state(), CruiseState::Fixed { value: level });
    }

    #[test]
    fn brake_release_takes_exactly_n_ticks(n in 2u16..60) {
        let mut c = CruiseController::new(CruiseCfg { fix_pulses: 1, brake_release_pulses: n, ..CruiseCfg::default() });
        c.update(CruiseInput { pedaling: true, brake: false, level: 1500, engaged: true, now_ms: 0 });
        let braking = CruiseInput { pedaling: true, brake: true, level: 0, engaged: false, now_ms: 140 };
        for _ in 0..n - 1 {
            c.update(braking);
            let releasing = matches!(c.state(), CruiseState::Releasing { .. });
            prop_assert!(releasing, "state {:?}", c.state());
        }
        c.update(braking);
        prop_assert_eq!(c.state(), CruiseState::Idle);
    }

    #[test]
    fn ramp_reaches_target_exactly_at_its_duration(
        accel_s in 1u64..20,
        target in 1u16..=4095,
        smoothing in 1.0f32..=10.0,
    ) {
        let mut r = RampGenerator::new(
            RampCfg { accel_delay_ms: accel_s * 1_000, auto_progressive_delay_ms: 10_000, smoothing, auto_smoothing: smoothing },
            4095,
        );
        r.update(target, 0);
        let duration = r.state().duration_ms;
        prop_assert_eq!(duration, accel_s * 1_000 * u64::from(target) / 4095);
        if duration > 0 {
            prop_assert!(r.update(target, duration - 1) <= target);
        }
        prop_assert_eq!(r.update(target, duration), target);
    }

    #[test]
    fn rising_target_never_lowers_output(
        start in 0u16..3000,
        steps in prop::collection::vec(0u16..40, 1..120),
        smoothing in 1.0f32..=10.0,
    ) {
        let mut r = RampGenerator::new(
            RampCfg { accel_delay_ms: 5_000, auto_progressive_delay_ms: 10_000, smoothing, auto_smoothing: smoothing },
            4095,
        );
        let mut target = start;
        let mut prev = 0u16;
        for (i, step) in steps.iter().enumerate() {
            target = (target + step).min(4095);
            let out = r.update(target, i as u64 * 140);
            prop_assert!(out >= prev, "output fell from {} to {}", prev, out);
            prop_assert!(out <= target);
            prev = out;
        }
        let end = steps.len() as u64 * 140 + 5_000;
        prop_assert_eq!(r.update(target, end), target);
    }
}
