//! Pose evaluation.
//!
//! Layers, in order:
//! 1. rest positions (joints without a rest position never appear)
//! 2. group scaling about the rest centroid, groups in declaration order
//! 3. per-joint position overrides (replace, never add); replacement is per axis,
//!    so an axis the override never keyed keeps its group-scaled value
//! 4. rig-root transform, sampled separately and exposed alongside the local pose
//!
//! Evaluation is pure: nothing here writes to the animation state.

use hashbrown::HashMap;
use indexmap::IndexMap;

use posekey_animation_core::math::{add3, mul3, sub3};
use posekey_animation_core::state::{
    DEFAULT_CAMERA_FOV, DEFAULT_CAMERA_POSITION, DEFAULT_CAMERA_TARGET, DEFAULT_PLANE_TRANSFORM,
};
use posekey_animation_core::{
    sample_bool, sample_scalar, sample_transform, sample_vector, AnimationState, GroupId, JointId,
    Transform, Vec3, ONE_VEC3,
};

use crate::rig::Rig;

/// Local joint positions plus the rig-root transform for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct EvaluatedPose {
    pub frame: f32,
    /// Local-space positions in joint declaration order.
    pub joints: IndexMap<JointId, Vec3>,
    pub root: Transform,
}

impl EvaluatedPose {
    #[inline]
    pub fn local_position(&self, joint: &str) -> Option<Vec3> {
        self.joints.get(joint).copied()
    }

    /// Position after the rig-root transform.
    #[inline]
    pub fn world_position(&self, joint: &str) -> Option<Vec3> {
        self.local_position(joint).map(|p| self.root.apply(p))
    }

    pub fn world_positions(&self) -> IndexMap<JointId, Vec3> {
        self.joints
            .iter()
            .map(|(id, p)| (id.clone(), self.root.apply(*p)))
            .collect()
    }
}

/// Evaluate the committed animation at `frame`.
pub fn evaluate(rig: &Rig, anim: &AnimationState, frame: f32) -> EvaluatedPose {
    evaluate_with(rig, anim, frame, &HashMap::new())
}

/// Evaluate with uncommitted group scales layered over the stored tracks. A pending
/// entry replaces the sampled scale of its group for this evaluation only.
pub fn evaluate_with(
    rig: &Rig,
    anim: &AnimationState,
    frame: f32,
    pending_group_scales: &HashMap<GroupId, Vec3>,
) -> EvaluatedPose {
    let def = rig.definition();
    let rest = rig.rest();
    let topo = rig.topology();

    let mut joints: IndexMap<JointId, Vec3> = def
        .joint_ids()
        .filter_map(|id| rest.get(id).map(|p| (id.to_string(), p)))
        .collect();

    for (group, members) in def.groups() {
        let Some(centroid) = topo.centroid(group) else {
            continue;
        };
        let scale = match pending_group_scales.get(group) {
            Some(s) => *s,
            None => match anim.group_scale_track(group) {
                // an empty track would only restate the rest pose and undo earlier groups
                Some(track) if !track.is_empty() => {
                    sample_vector(track, frame, Some(ONE_VEC3)).unwrap_or(ONE_VEC3)
                }
                _ => continue,
            },
        };
        for member in members {
            let (Some(rest_pos), Some(slot)) = (rest.get(member), joints.get_mut(member.as_str()))
            else {
                continue;
            };
            *slot = add3(centroid, mul3(sub3(rest_pos, centroid), scale));
        }
    }

    for (joint, track) in &anim.joint_positions {
        if let Some(slot) = joints.get_mut(joint.as_str()) {
            if let Some(p) = sample_vector(track, frame, Some(*slot)) {
                *slot = p;
            }
        }
    }

    let root = sample_transform(&anim.rig_root, frame, &Transform::IDENTITY);

    EvaluatedPose {
        frame,
        joints,
        root,
    }
}

/// Sampled camera: position, look-at target, vertical FOV in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraState {
    pub position: Vec3,
    pub target: Vec3,
    pub fov: f32,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            position: DEFAULT_CAMERA_POSITION,
            target: DEFAULT_CAMERA_TARGET,
            fov: DEFAULT_CAMERA_FOV,
        }
    }
}

pub fn sample_camera(anim: &AnimationState, frame: f32) -> CameraState {
    let cam = &anim.camera;
    let d = CameraState::default();
    CameraState {
        position: sample_vector(&cam.position, frame, Some(d.position)).unwrap_or(d.position),
        target: sample_vector(&cam.target, frame, Some(d.target)).unwrap_or(d.target),
        fov: sample_scalar(&cam.fov, frame, Some(d.fov)).unwrap_or(d.fov),
    }
}

/// Sampled reference plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaneState {
    pub transform: Transform,
    /// Seconds added to the video time at this frame.
    pub time_offset: f32,
    pub lock_to_anchor: bool,
}

impl Default for PlaneState {
    fn default() -> Self {
        Self {
            transform: DEFAULT_PLANE_TRANSFORM,
            time_offset: 0.0,
            lock_to_anchor: false,
        }
    }
}

pub fn sample_plane(anim: &AnimationState, frame: f32) -> PlaneState {
    let plane = &anim.video_plane;
    PlaneState {
        transform: sample_transform(&plane.transform, frame, &DEFAULT_PLANE_TRANSFORM),
        time_offset: sample_scalar(&plane.time_offset, frame, Some(0.0)).unwrap_or(0.0),
        lock_to_anchor: sample_bool(&plane.lock_to_anchor, frame, Some(false)).unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BuiltinCatalog;
    use crate::profile::RigProfileId;

    fn rig() -> Rig {
        Rig::from_catalog(&BuiltinCatalog, RigProfileId::VitposeBody17).unwrap()
    }

    #[test]
    fn default_state_evaluates_to_rest() {
        let rig = rig();
        let pose = evaluate(&rig, &rig.default_state(), 12.0);
        assert_eq!(pose.joints.len(), 17);
        for (id, p) in &pose.joints {
            assert_eq!(Some(*p), rig.rest().get(id));
        }
        assert_eq!(pose.root, Transform::IDENTITY);
    }

    #[test]
    fn pending_scale_replaces_track() {
        let rig = rig();
        let mut anim = rig.default_state();
        anim.group_scale_track_mut("Head").upsert(0, [3.0, 3.0, 3.0], None);
        let mut pending = HashMap::new();
        pending.insert("Head".to_string(), ONE_VEC3);
        let pose = evaluate_with(&rig, &anim, 0.0, &pending);
        assert_eq!(pose.local_position("head"), rig.rest().get("head"));
    }

    #[test]
    fn camera_and_plane_defaults() {
        let anim = AnimationState::default();
        assert_eq!(sample_camera(&anim, 5.0), CameraState::default());
        assert_eq!(sample_plane(&anim, 5.0), PlaneState::default());
    }
}
