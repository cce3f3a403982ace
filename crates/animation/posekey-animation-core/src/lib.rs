//! posekey animation core (engine-agnostic)
//!
//! Keyframe storage and resampling for the posekey skeleton editor. Tracks are
//! sparse, frame-indexed and unique by frame; the sampler clamps outside the keyed
//! range and blends inside it with per-key easing (linear/eased for scalars and
//! vectors, spherical for orientations, stepped for booleans).

pub mod data;
pub mod ids;
pub mod interp;
pub mod math;
pub mod sampling;
pub mod state;

// Re-exports for consumers (rig evaluator, editor, scene I/O)
pub use data::{BoolTrack, Ease, Key, OrientationTrack, ScalarTrack, Track, VectorTrack};
pub use ids::{GroupId, JointId};
pub use math::{Quat, Transform, Vec3, IDENTITY_QUAT, ONE_VEC3, ZERO_VEC3};
pub use sampling::{
    sample_bool, sample_orientation, sample_scalar, sample_transform, sample_vector,
};
pub use state::{AnimationState, CameraTracks, PlaneTracks, TransformTracks};
