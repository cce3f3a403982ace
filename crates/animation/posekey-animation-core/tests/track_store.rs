use posekey_animation_core::{
    data::{Ease, Key, OrientationTrack, ScalarTrack, VectorTrack},
    math::{dot4, normalize_quat},
    sampling::{sample_bool, sample_orientation, sample_scalar, sample_transform, sample_vector},
    state::TransformTracks,
    BoolTrack, Transform,
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn mk_scalar(keys: &[(i32, f32)]) -> ScalarTrack {
    ScalarTrack::from_keys(keys.iter().map(|(f, v)| Key::new(*f, *v)))
}

/// it should hold the first/last value outside the keyed range
#[test]
fn sampling_clamps_outside_range() {
    let t = mk_scalar(&[(5, 1.0), (10, 3.0), (20, -2.0)]);
    for f in [-100.0, -1.0, 0.0, 4.5, 5.0] {
        assert_eq!(sample_scalar(&t, f, None), sample_scalar(&t, 5.0, None));
    }
    for f in [20.0, 21.0, 1e6] {
        assert_eq!(sample_scalar(&t, f, None), Some(-2.0));
    }
}

/// it should linearly blend inside a bracket and honour the earlier key's ease
#[test]
fn sampling_blends_inside_range() {
    let mut t = mk_scalar(&[(0, 0.0), (10, 10.0)]);
    approx(sample_scalar(&t, 2.5, None).unwrap_or(f32::NAN), 2.5, 1e-6);
    t.upsert(0, 0.0, Some(Ease::EaseInOut));
    approx(sample_scalar(&t, 2.5, None).unwrap_or(f32::NAN), 1.25, 1e-5);
    approx(sample_scalar(&t, 7.5, None).unwrap_or(f32::NAN), 8.75, 1e-5);
}

/// it should return the fallback (or nothing) for an empty track
#[test]
fn empty_tracks_use_fallback() {
    let t = ScalarTrack::new();
    assert_eq!(sample_scalar(&t, 3.0, None), None);
    assert_eq!(sample_scalar(&t, 3.0, Some(7.0)), Some(7.0));
    let b = BoolTrack::new();
    assert_eq!(sample_bool(&b, 3.0, Some(true)), Some(true));
    let o = OrientationTrack::new();
    assert_eq!(sample_orientation(&o, 3.0, None), None);
}

/// it should only touch the overwritten frame on upsert
#[test]
fn upsert_overwrites_single_frame() {
    let mut t = mk_scalar(&[(0, 0.0), (10, 1.0), (20, 2.0)]);
    t.upsert(0, 0.0, Some(Ease::EaseOut));
    let before: Vec<(i32, f32, Ease)> = t.keys().iter().map(|k| (k.frame, k.value, k.ease)).collect();
    t.upsert(10, 5.0, None);
    let after: Vec<(i32, f32, Ease)> = t.keys().iter().map(|k| (k.frame, k.value, k.ease)).collect();
    assert_eq!(after.len(), before.len());
    assert_eq!(after[0], before[0]);
    assert_eq!(after[2], before[2]);
    assert_eq!(after[1], (10, 5.0, Ease::Linear));
    assert!(t.keys().windows(2).all(|w| w[0].frame < w[1].frame));
}

/// it should sample vector axes independently with per-axis fallback
#[test]
fn vector_sampling_per_axis() {
    let mut v = VectorTrack::new();
    v.upsert_axis(0, 0, 1.0, None);
    v.upsert_axis(0, 10, 3.0, None);
    v.upsert_axis(1, 5, 9.0, None);
    // z unkeyed and no fallback -> absent
    assert_eq!(sample_vector(&v, 5.0, None), None);
    assert_eq!(sample_vector(&v, 5.0, Some([0.0, 0.0, -1.0])), Some([2.0, 9.0, -1.0]));
}

/// it should return every keyed orientation normalized when sampled at its frame
#[test]
fn orientation_round_trips_at_keys() {
    let keys = [
        (0, [0.0, 0.0, 0.0, 2.0]),
        (7, [0.3, 0.1, -0.2, 0.9]),
        (12, [0.0, 1.0, 0.0, 0.0]),
        (30, [-0.5, 0.5, 0.5, -0.5]),
    ];
    let t = OrientationTrack::from_keys(keys.iter().map(|(f, q)| Key::new(*f, *q)));
    for (f, q) in keys {
        let s = sample_orientation(&t, f as f32, None).unwrap_or([f32::NAN; 4]);
        let n = normalize_quat(q);
        for i in 0..4 {
            approx(s[i], n[i], 1e-5);
        }
    }
    // in-between samples stay unit length
    for f in [1.0, 3.5, 9.0, 20.0, 29.9] {
        let s = sample_orientation(&t, f, None).unwrap_or([f32::NAN; 4]);
        approx(dot4(s, s), 1.0, 1e-4);
    }
}

/// it should never produce a half-on boolean
#[test]
fn bool_sampling_is_stepwise() {
    let mut b = BoolTrack::new();
    b.upsert(0, false, None);
    b.upsert(10, true, None);
    b.upsert(20, false, None);
    assert_eq!(sample_bool(&b, 4.0, None), Some(false));
    assert_eq!(sample_bool(&b, 5.0, None), Some(true));
    assert_eq!(sample_bool(&b, 14.9, None), Some(true));
    assert_eq!(sample_bool(&b, 25.0, None), Some(false));
}

/// it should default each transform part independently
#[test]
fn transform_sampling_defaults() {
    let mut tr = TransformTracks::default();
    tr.position.upsert(0, [1.0, 2.0, 3.0], None);
    let s = sample_transform(&tr, 4.0, &Transform::IDENTITY);
    assert_eq!(s.position, [1.0, 2.0, 3.0]);
    assert_eq!(s.orientation, Transform::IDENTITY.orientation);
    assert_eq!(s.scale, Transform::IDENTITY.scale);
}

/// it should serialize keys with camelCase eases and accept missing eases
#[test]
fn key_json_shape() {
    let mut t = ScalarTrack::new();
    t.upsert(3, 1.5, Some(Ease::EaseInOut));
    let json = serde_json::to_value(&t).unwrap();
    assert_eq!(json, serde_json::json!([{ "frame": 3, "value": 1.5, "ease": "easeInOut" }]));
    let parsed: ScalarTrack = serde_json::from_value(serde_json::json!([{ "frame": 1, "value": 2.0 }])).unwrap();
    assert_eq!(parsed.keys()[0].ease, Ease::Linear);
}
