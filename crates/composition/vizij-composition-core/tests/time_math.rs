use vizij_composition_core::{
    ease_factor, frame_of, same_frame, snap, time_of, Interpolation, Keyframe, KeyValue, Track,
    ValueType,
};

fn approx(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-9, "left={a} right={b}");
}

#[test]
fn snap_is_idempotent_across_rates() {
    for fps in [12.0, 24.0, 25.0, 29.97, 30.0, 60.0] {
        for t in [0.0, 0.001, 0.034, 0.5, 1.0 / 3.0, 2.71828, 9.999] {
            let once = snap(t, fps);
            assert_eq!(snap(once, fps), once, "t={t} fps={fps}");
        }
    }
}

#[test]
fn snap_rounds_to_nearest_frame() {
    approx(snap(0.034, 30.0), 1.0 / 30.0);
    approx(snap(0.016, 30.0), 0.0);
    approx(snap(0.017, 30.0), 1.0 / 30.0);
    assert_eq!(snap(1.0, 30.0), 1.0);
}

#[test]
fn invalid_rate_leaves_time_alone() {
    assert_eq!(snap(0.123, 0.0), 0.123);
    assert_eq!(snap(0.123, f64::NAN), 0.123);
}

#[test]
fn frame_numbers() {
    assert_eq!(frame_of(1.0, 30.0), 30);
    assert_eq!(frame_of(0.034, 30.0), 1);
    approx(time_of(45, 30.0), 1.5);
    assert!(same_frame(0.034, 1.0 / 30.0, 30.0));
    assert!(!same_frame(0.0, 1.0 / 30.0, 30.0));
}

#[test]
fn easing_curves() {
    approx(ease_factor(Interpolation::Linear, 0.25), 0.25);
    approx(ease_factor(Interpolation::EaseInOut, 0.5), 0.5);
    assert!(ease_factor(Interpolation::EaseInOut, 0.1) < 0.1);
    assert!(ease_factor(Interpolation::EaseInOut, 0.9) > 0.9);
    assert_eq!(ease_factor(Interpolation::Hold, 0.99), 0.0);
}

fn two_keys(mode: Interpolation) -> Track {
    let mut track = Track::new("Value", ValueType::Scalar);
    track.keys = vec![
        Keyframe::new(0.0, KeyValue::Scalar(0.0)).with_interpolation(mode),
        Keyframe::new(1.0, KeyValue::Scalar(100.0)),
    ];
    track
}

#[test]
fn linear_midpoint() {
    assert_eq!(two_keys(Interpolation::Linear).evaluate(0.5), KeyValue::Scalar(50.0));
}

#[test]
fn hold_keeps_left_value_until_next_key() {
    let track = two_keys(Interpolation::Hold);
    assert_eq!(track.evaluate(0.99), KeyValue::Scalar(0.0));
    assert_eq!(track.evaluate(1.0), KeyValue::Scalar(100.0));
}

#[test]
fn boundaries_are_constant() {
    let track = two_keys(Interpolation::EaseInOut);
    for t in [-100.0, -0.5, 0.0] {
        assert_eq!(track.evaluate(t), KeyValue::Scalar(0.0));
    }
    for t in [1.0, 1.5, 1e6] {
        assert_eq!(track.evaluate(t), KeyValue::Scalar(100.0));
    }
}

#[test]
fn ease_in_out_midpoint_matches_linear() {
    let v = two_keys(Interpolation::EaseInOut).evaluate(0.5).as_scalar().unwrap();
    approx(v, 50.0);
    let early = two_keys(Interpolation::EaseInOut).evaluate(0.25).as_scalar().unwrap();
    assert!(early < 25.0);
}

#[test]
fn non_finite_time_reads_boundary_keys() {
    let track = two_keys(Interpolation::Linear);
    assert_eq!(track.evaluate(f64::NAN), KeyValue::Scalar(0.0));
    assert_eq!(track.evaluate(f64::NEG_INFINITY), KeyValue::Scalar(0.0));
    assert_eq!(track.evaluate(f64::INFINITY), KeyValue::Scalar(100.0));

    let mut ctx = vizij_composition_core::EngineContext::default();
    ctx.load_project(
        &vizij_test_fixtures::projects::json("sample").unwrap(),
        &mut vizij_composition_core::AlwaysReady,
    )
    .unwrap();
    let hero = vizij_composition_core::LayerId::from("layer-hero");
    let world = ctx.resolve_transform(&hero, f64::NAN).unwrap();
    assert_eq!((world.origin.x, world.origin.y), (320.0, 180.0));
}
