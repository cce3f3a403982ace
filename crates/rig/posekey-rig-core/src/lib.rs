//! posekey rig core
//!
//! Rig profiles (joints, bones, groups, rest pose), the per-profile topology cache
//! and the pure pose evaluator that layers group scaling, joint overrides and the
//! rig-root transform over the rest pose.

pub mod catalog;
pub mod error;
pub mod evaluator;
pub mod profile;
pub mod rig;
pub mod topology;

pub use catalog::{BuiltinCatalog, RigCatalog};
pub use error::RigError;
pub use evaluator::{
    evaluate, evaluate_with, sample_camera, sample_plane, CameraState, EvaluatedPose, PlaneState,
};
pub use profile::{Bone, JointInfo, RestPose, RigDefDocument, RigDefinition, RigProfile, RigProfileId};
pub use rig::Rig;
pub use topology::RigTopology;
