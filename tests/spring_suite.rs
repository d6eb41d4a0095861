use lissaviz::config::Mode;
use lissaviz::keyframes::ParameterSet;
use lissaviz::spring::{
    critical_damping, is_non_oscillatory, HarmonicProfile, Profile, SpringEngine,
};
use lissaviz::tuning::SpringTuning;

fn tuning(mode: Mode) -> SpringTuning {
    SpringTuning {
        mode,
        ..SpringTuning::default()
    }
}

/// Steps until every field reports settled; returns the frame count.
fn settle(
    engine: &SpringEngine,
    current: &mut ParameterSet,
    velocity: &mut ParameterSet,
    target: &ParameterSet,
    limit: usize,
) -> Option<usize> {
    for frame in 1..=limit {
        if engine.step(current, velocity, target).all() {
            return Some(frame);
        }
    }
    None
}

#[test]
fn linear_profile_reaches_exact_rest() {
    let engine = SpringEngine::new(&tuning(Mode::StrictTiming));
    assert_eq!(engine.profile(), &Profile::Linear);

    let mut current = ParameterSet::new(1.0, 1.0, std::f64::consts::FRAC_PI_2);
    let mut velocity = ParameterSet::ZERO;
    let target = ParameterSet::new(5.0, 4.0, std::f64::consts::FRAC_PI_4);

    let frames = settle(&engine, &mut current, &mut velocity, &target, 400)
        .expect("linear spring should settle");
    assert!(frames > 1);
    assert_eq!(current, target);
    assert_eq!(velocity, ParameterSet::ZERO);
}

#[test]
fn linear_profile_settles_exactly_from_any_start() {
    let engine = SpringEngine::new(&tuning(Mode::StrictTiming));
    let mut rng = fastrand::Rng::with_seed(0x11ea_4a11);

    for case in 0..200 {
        let mut current = ParameterSet::new(
            0.5 + rng.f64() * 7.0,
            0.5 + rng.f64() * 7.0,
            rng.f64() * 7.0 - 1.0,
        );
        let target = ParameterSet::new(
            0.5 + rng.f64() * 7.0,
            0.5 + rng.f64() * 7.0,
            rng.f64() * 7.0 - 1.0,
        );
        let mut velocity = ParameterSet::new(
            rng.f64() * 0.2 - 0.1,
            rng.f64() * 0.2 - 0.1,
            rng.f64() * 0.2 - 0.1,
        );

        let frames = settle(&engine, &mut current, &mut velocity, &target, 400);
        assert!(frames.is_some(), "case {case} did not settle towards {target:?}");
        assert_eq!(current, target, "case {case}");
        assert_eq!(velocity, ParameterSet::ZERO, "case {case}");
    }
}

#[test]
fn harmonic_profile_reaches_exact_rest_without_overshoot() {
    let engine = SpringEngine::new(&tuning(Mode::SettlementDriven));
    let mut rng = fastrand::Rng::with_seed(0x5eed_1155);

    for _ in 0..200 {
        let start = ParameterSet::new(
            1.0 + rng.f64() * 6.0,
            1.0 + rng.f64() * 6.0,
            rng.f64() * 6.0,
        );
        let target = ParameterSet::new(
            1.0 + rng.f64() * 6.0,
            1.0 + rng.f64() * 6.0,
            rng.f64() * 6.0,
        );
        let mut current = start;
        let mut velocity = ParameterSet::ZERO;

        for _ in 0..HarmonicProfile::default().safety_ceiling {
            let settled = engine.step(&mut current, &mut velocity, &target).all();
            for (s, c, t) in [
                (start.a, current.a, target.a),
                (start.b, current.b, target.b),
                (start.delta, current.delta, target.delta),
            ] {
                // Never past the target on the far side from the start.
                assert!((t - s) * (t - c) >= 0.0, "overshoot: {s} -> {t}, at {c}");
            }
            if settled {
                break;
            }
        }
        assert_eq!(current, target);
        assert_eq!(velocity, ParameterSet::ZERO);
    }
}

#[test]
fn harmonic_stiffness_ramps_with_distance() {
    let h = HarmonicProfile::default();
    assert!((h.stiffness_at(0.0) - h.min_stiffness).abs() < 1e-12);
    assert!((h.stiffness_at(1.0) - h.max_stiffness).abs() < 1e-12);
    assert!((h.stiffness_at(10.0) - h.max_stiffness).abs() < 1e-12);
    assert!(h.stiffness_at(0.5) < h.stiffness_at(0.8));

    let k = h.stiffness_at(0.3);
    assert!(h.damping_for(k, 1.0) > critical_damping(k, 1.0));
}

#[test]
fn step_is_all_or_nothing() {
    let engine = SpringEngine::new(&tuning(Mode::StrictTiming));
    let mut current = ParameterSet::new(1.0, 2.0, 0.5);
    let mut velocity = ParameterSet::new(0.1, 0.1, 0.1);
    let before = (current, velocity);

    let target = ParameterSet::new(3.0, f64::INFINITY, 0.0);
    let settlement = engine.step(&mut current, &mut velocity, &target);

    assert!(!settlement.all());
    assert_eq!((current, velocity), before);
}

#[test]
fn apply_switches_profile_and_keeps_harmonic_overrides() {
    let mut engine = SpringEngine::new(&tuning(Mode::StrictTiming));
    let custom = HarmonicProfile {
        zeta: 1.6,
        safety_ceiling: 900,
        ..HarmonicProfile::default()
    };
    engine.set_harmonic(custom);
    assert_eq!(engine.profile(), &Profile::Linear);

    engine.apply(&tuning(Mode::SettlementDriven));
    assert_eq!(engine.profile(), &Profile::Harmonic(custom));
    assert_eq!(engine.profile().snap_threshold(), 1e-5);

    engine.apply(&tuning(Mode::StrictTiming));
    assert_eq!(engine.profile().snap_threshold(), 1e-3);
}

#[test]
fn oscillation_check_matches_the_damping_ratio() {
    // Stock coefficients ring slightly (damping ratio ~0.9).
    assert!(!is_non_oscillatory(0.025, 0.283, 1.0));
    assert!(!SpringTuning::default().is_non_oscillatory());

    let c = critical_damping(0.025, 1.0);
    assert!(is_non_oscillatory(0.025, c * 1.01, 1.0));
    assert!(!is_non_oscillatory(0.025, c * 0.99, 1.0));
}

#[test]
fn resting_fields_stay_put() {
    let engine = SpringEngine::new(&tuning(Mode::SettlementDriven));
    let target = ParameterSet::new(2.0, 3.0, 1.0);
    let mut current = target;
    let mut velocity = ParameterSet::ZERO;
    for _ in 0..10 {
        assert!(engine.step(&mut current, &mut velocity, &target).all());
    }
    assert_eq!(current, target);
}
