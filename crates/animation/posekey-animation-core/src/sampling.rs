//! Track sampling.
//!
//! Model:
//! - Tracks hold keys sorted by integer frame; sampling accepts fractional frames
//!   so playback can land between keys.
//! - Outside the keyed range the boundary value is held.
//! - Inside, the bracketing pair (a, b) gives `t = (frame - a) / (b - a)`, eased
//!   by `a.ease`, then blended (lerp for scalars, SLERP for orientations).
//! - Booleans are scalar-sampled as 0/1 and thresholded at 0.5.
//!
//! Empty tracks never panic; they return the caller's fallback (or `None`).

use crate::data::{BoolTrack, Ease, Key, OrientationTrack, ScalarTrack, VectorTrack};
use crate::interp::functions::{apply_ease, lerp_f32, slerp_quat};
use crate::math::{normalize_quat, Quat, Transform, Vec3};
use crate::state::TransformTracks;

/// Where a frame falls relative to a key list.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Segment {
    Empty,
    /// Hold the key at this index (before first / after last / exact hit).
    Hold(usize),
    /// Blend keys `i` and `i + 1` with the raw (un-eased) segment parameter.
    Between(usize, f32),
}

fn find_segment<T>(keys: &[Key<T>], frame: f32) -> Segment {
    let n = keys.len();
    if n == 0 {
        return Segment::Empty;
    }
    if frame <= keys[0].frame as f32 {
        return Segment::Hold(0);
    }
    if frame >= keys[n - 1].frame as f32 {
        return Segment::Hold(n - 1);
    }
    // First key strictly after `frame`; its predecessor starts the segment.
    let upper = keys.partition_point(|k| (k.frame as f32) <= frame);
    let i = upper.saturating_sub(1);
    if i + 1 >= n {
        return Segment::Hold(n - 1);
    }
    let f0 = keys[i].frame as f32;
    let f1 = keys[i + 1].frame as f32;
    let span = f1 - f0;
    let t = if span > 0.0 { (frame - f0) / span } else { 1.0 };
    Segment::Between(i, t.clamp(0.0, 1.0))
}

#[inline]
fn eased(ease: Ease, t: f32) -> f32 {
    apply_ease(ease, t)
}

/// Sample a scalar track at `frame`.
pub fn sample_scalar(track: &ScalarTrack, frame: f32, fallback: Option<f32>) -> Option<f32> {
    let keys = track.keys();
    match find_segment(keys, frame) {
        Segment::Empty => fallback,
        Segment::Hold(i) => Some(keys[i].value),
        Segment::Between(i, t) => {
            let a = &keys[i];
            let b = &keys[i + 1];
            Some(lerp_f32(a.value, b.value, eased(a.ease, t)))
        }
    }
}

/// Sample the three axes independently. Each axis falls back to the matching
/// component of `fallback`; without a fallback any unkeyed axis makes the whole
/// result `None`.
pub fn sample_vector(track: &VectorTrack, frame: f32, fallback: Option<Vec3>) -> Option<Vec3> {
    let x = sample_scalar(&track.x, frame, fallback.map(|f| f[0]))?;
    let y = sample_scalar(&track.y, frame, fallback.map(|f| f[1]))?;
    let z = sample_scalar(&track.z, frame, fallback.map(|f| f[2]))?;
    Some([x, y, z])
}

/// Sample an orientation track with spherical interpolation. Keyed frames come
/// back normalized.
pub fn sample_orientation(
    track: &OrientationTrack,
    frame: f32,
    fallback: Option<Quat>,
) -> Option<Quat> {
    let keys = track.keys();
    match find_segment(keys, frame) {
        Segment::Empty => fallback.map(normalize_quat),
        Segment::Hold(i) => Some(normalize_quat(keys[i].value)),
        Segment::Between(i, t) => {
            let a = &keys[i];
            let b = &keys[i + 1];
            Some(slerp_quat(a.value, b.value, eased(a.ease, t)))
        }
    }
}

/// Stepwise boolean sampling: the 0/1 encoding is scalar-sampled and thresholded
/// at 0.5, so the ease of the earlier key only moves where inside the bracket the
/// switch happens.
pub fn sample_bool(track: &BoolTrack, frame: f32, fallback: Option<bool>) -> Option<bool> {
    let keys = track.keys();
    match find_segment(keys, frame) {
        Segment::Empty => fallback,
        Segment::Hold(i) => Some(keys[i].value),
        Segment::Between(i, t) => {
            let a = &keys[i];
            let b = &keys[i + 1];
            let v = lerp_f32(encode(a.value), encode(b.value), eased(a.ease, t));
            Some(v >= 0.5)
        }
    }
}

#[inline]
fn encode(b: bool) -> f32 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Sample a position/orientation/scale track triple, defaulting each part to
/// the matching component of `defaults`.
pub fn sample_transform(tracks: &TransformTracks, frame: f32, defaults: &Transform) -> Transform {
    Transform {
        position: sample_vector(&tracks.position, frame, Some(defaults.position))
            .unwrap_or(defaults.position),
        orientation: sample_orientation(&tracks.orientation, frame, Some(defaults.orientation))
            .unwrap_or(defaults.orientation),
        scale: sample_vector(&tracks.scale, frame, Some(defaults.scale)).unwrap_or(defaults.scale),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Track;

    #[test]
    fn segment_lookup() {
        let t = ScalarTrack::from_keys([Key::new(0, 0.0), Key::new(10, 1.0), Key::new(20, 2.0)]);
        assert_eq!(find_segment(t.keys(), -3.0), Segment::Hold(0));
        assert_eq!(find_segment(t.keys(), 25.0), Segment::Hold(2));
        assert_eq!(find_segment(t.keys(), 5.0), Segment::Between(0, 0.5));
        assert_eq!(find_segment(t.keys(), 10.0), Segment::Between(1, 0.0));
        assert_eq!(find_segment(Track::<f32>::new().keys(), 1.0), Segment::Empty);
    }

    #[test]
    fn eased_segment_uses_earlier_key() {
        let mut t = ScalarTrack::new();
        t.upsert(0, 0.0, Some(Ease::EaseIn));
        t.upsert(10, 10.0, Some(Ease::EaseOut));
        let v = sample_scalar(&t, 5.0, None).unwrap_or(f32::NAN);
        assert!((v - 2.5).abs() < 1e-5);
    }

    #[test]
    fn bool_threshold_moves_with_ease() {
        let mut t = BoolTrack::new();
        t.upsert(0, false, Some(Ease::EaseIn));
        t.upsert(10, true, None);
        // easeIn(0.6) = 0.36 < 0.5 -> still false; linear would already be true
        assert_eq!(sample_bool(&t, 6.0, None), Some(false));
        assert_eq!(sample_bool(&t, 8.0, None), Some(true));
    }
}
