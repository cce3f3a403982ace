//! Small vector/quaternion helpers over plain arrays.
//!
//! Stored values stay as `[f32; N]` (serde-friendly, same layout as the scene
//! document). Anything that needs real rotation math goes through nalgebra.

use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// 3D vector / point.
pub type Vec3 = [f32; 3];

/// Quaternion (x, y, z, w).
pub type Quat = [f32; 4];

pub const ZERO_VEC3: Vec3 = [0.0, 0.0, 0.0];
pub const ONE_VEC3: Vec3 = [1.0, 1.0, 1.0];
pub const IDENTITY_QUAT: Quat = [0.0, 0.0, 0.0, 1.0];

const NORM_EPS: f32 = 1e-12;

#[inline]
pub fn add3(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
pub fn sub3(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

/// Component-wise product.
#[inline]
pub fn mul3(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] * b[0], a[1] * b[1], a[2] * b[2]]
}

#[inline]
pub fn scale3(a: Vec3, s: f32) -> Vec3 {
    [a[0] * s, a[1] * s, a[2] * s]
}

#[inline]
pub fn length3(a: Vec3) -> f32 {
    (a[0] * a[0] + a[1] * a[1] + a[2] * a[2]).sqrt()
}

#[inline]
pub fn distance3(a: Vec3, b: Vec3) -> f32 {
    length3(sub3(a, b))
}

/// Normalize; a zero-length input comes back unchanged.
#[inline]
pub fn normalize3(a: Vec3) -> Vec3 {
    let len = length3(a);
    if len > NORM_EPS {
        scale3(a, 1.0 / len)
    } else {
        a
    }
}

/// Arithmetic mean of a set of points; `None` when the set is empty.
pub fn mean3<I>(points: I) -> Option<Vec3>
where
    I: IntoIterator<Item = Vec3>,
{
    let mut sum = ZERO_VEC3;
    let mut n = 0usize;
    for p in points {
        sum = add3(sum, p);
        n += 1;
    }
    if n == 0 {
        None
    } else {
        Some(scale3(sum, 1.0 / n as f32))
    }
}

#[inline]
pub fn dot4(a: Quat, b: Quat) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3]
}

/// Normalize a quaternion. Degenerate (zero-length) input yields identity.
#[inline]
pub fn normalize_quat(q: Quat) -> Quat {
    let len2 = dot4(q, q);
    if len2 > NORM_EPS && len2.is_finite() {
        let inv = len2.sqrt().recip();
        [q[0] * inv, q[1] * inv, q[2] * inv, q[3] * inv]
    } else {
        IDENTITY_QUAT
    }
}

#[inline]
pub fn to_vector3(v: Vec3) -> Vector3<f32> {
    Vector3::new(v[0], v[1], v[2])
}

#[inline]
pub fn from_vector3(v: &Vector3<f32>) -> Vec3 {
    [v.x, v.y, v.z]
}

/// Array quaternion (x, y, z, w) to a nalgebra unit quaternion.
#[inline]
pub fn to_unit_quat(q: Quat) -> UnitQuaternion<f32> {
    let q = normalize_quat(q);
    UnitQuaternion::new_unchecked(Quaternion::new(q[3], q[0], q[1], q[2]))
}

#[inline]
pub fn from_unit_quat(q: &UnitQuaternion<f32>) -> Quat {
    [q.i, q.j, q.k, q.w]
}

/// Rotate `point` around `pivot` by `rotation`.
#[inline]
pub fn rotate_about(point: Vec3, pivot: Vec3, rotation: &UnitQuaternion<f32>) -> Vec3 {
    let offset = rotation * to_vector3(sub3(point, pivot));
    add3(pivot, from_vector3(&offset))
}

/// Position / orientation / scale triple (rig root, reference plane).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    pub position: Vec3,
    /// Quaternion (x, y, z, w)
    pub orientation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        position: ZERO_VEC3,
        orientation: IDENTITY_QUAT,
        scale: ONE_VEC3,
    };

    /// Map a local point into the parent space: scale component-wise, rotate by
    /// the orientation, then translate by the position.
    pub fn apply(&self, local: Vec3) -> Vec3 {
        let scaled = mul3(local, self.scale);
        let rotated = to_unit_quat(self.orientation) * to_vector3(scaled);
        add3(self.position, from_vector3(&rotated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn approx3(a: Vec3, b: Vec3) {
        for i in 0..3 {
            assert!((a[i] - b[i]).abs() < 1e-5, "left={a:?} right={b:?}");
        }
    }

    #[test]
    fn mean_of_empty_is_none() {
        assert!(mean3(std::iter::empty()).is_none());
        assert_eq!(mean3([[0.0, 0.0, 0.0], [2.0, 4.0, 6.0]]), Some([1.0, 2.0, 3.0]));
    }

    #[test]
    fn zero_quat_normalizes_to_identity() {
        assert_eq!(normalize_quat([0.0, 0.0, 0.0, 0.0]), IDENTITY_QUAT);
    }

    #[test]
    fn rotate_about_pivot_quarter_turn() {
        let rot = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
        approx3(rotate_about([2.0, 1.0, 0.0], [1.0, 1.0, 0.0], &rot), [1.0, 2.0, 0.0]);
    }

    #[test]
    fn transform_applies_scale_then_rotation_then_translation() {
        let rot = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
        let t = Transform {
            position: [10.0, 0.0, 0.0],
            orientation: from_unit_quat(&rot),
            scale: [2.0, 1.0, 1.0],
        };
        // (1,0,0) -> scale (2,0,0) -> rotate (0,2,0) -> translate (10,2,0)
        approx3(t.apply([1.0, 0.0, 0.0]), [10.0, 2.0, 0.0]);
    }
}
