//! Interpolation helpers.
//!
//! Easing curves plus scalar lerp and quaternion SLERP with shortest-arc sign
//! correction.

pub mod functions;

pub use functions::{apply_ease, lerp_f32, slerp_quat};
