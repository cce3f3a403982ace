//! Interpolation helpers:
//! - apply_ease (linear / quadratic in / out / in-out)
//! - lerp_f32 (scalar blend)
//! - slerp_quat (spherical blend with shortest-arc correction)

use crate::data::Ease;
use crate::math::{dot4, normalize_quat, Quat};

/// Below this arc angle (radians) SLERP falls back to a normalized lerp.
pub const SLERP_LINEAR_THRESHOLD: f32 = 1e-3;

/// Linear interpolation of scalars.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
fn lerp_quat_raw(a: Quat, b: Quat, t: f32) -> Quat {
    [
        lerp_f32(a[0], b[0], t),
        lerp_f32(a[1], b[1], t),
        lerp_f32(a[2], b[2], t),
        lerp_f32(a[3], b[3], t),
    ]
}

/// Apply an easing curve to a segment-local `t` in [0, 1].
#[inline]
pub fn apply_ease(ease: Ease, t: f32) -> f32 {
    match ease {
        Ease::Linear => t,
        Ease::EaseIn => t * t,
        Ease::EaseOut => t * (2.0 - t),
        Ease::EaseInOut => {
            if t < 0.5 {
                2.0 * t * t
            } else {
                -1.0 + (4.0 - 2.0 * t) * t
            }
        }
    }
}

/// Quaternion SLERP with shortest-arc correction.
/// Both inputs are normalized first; if dot < 0 the second is negated.
/// Coincident inputs return `a`; very small arcs use a normalized lerp.
/// The result is always renormalized.
pub fn slerp_quat(a: Quat, b: Quat, t: f32) -> Quat {
    let a = normalize_quat(a);
    let mut b = normalize_quat(b);
    let mut d = dot4(a, b);
    if d < 0.0 {
        b = [-b[0], -b[1], -b[2], -b[3]];
        d = -d;
    }
    if d >= 1.0 {
        return a;
    }
    let theta = d.acos();
    if theta < SLERP_LINEAR_THRESHOLD {
        return normalize_quat(lerp_quat_raw(a, b, t));
    }
    let sin_theta = theta.sin();
    let wa = ((1.0 - t) * theta).sin() / sin_theta;
    let wb = (t * theta).sin() / sin_theta;
    normalize_quat([
        a[0] * wa + b[0] * wb,
        a[1] * wa + b[1] * wb,
        a[2] * wa + b[2] * wb,
        a[3] * wa + b[3] * wb,
    ])
}
