//! AnimationState: every animatable channel of an editor scene.
//!
//! Rig-root, camera and reference-plane tracks are dense (always present, empty
//! until keyed, sampled with defaults). Group scale tracks exist for every group of
//! the active profile. Per-joint position overrides are sparse and created on the
//! first edit of a joint.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::data::{BoolTrack, Ease, OrientationTrack, ScalarTrack, VectorTrack};
use crate::ids::{GroupId, JointId};
use crate::math::{Transform, Vec3};

pub const DEFAULT_CAMERA_POSITION: Vec3 = [0.0, 1.2, 4.0];
pub const DEFAULT_CAMERA_TARGET: Vec3 = [0.0, 1.0, 0.0];
/// Vertical field of view in degrees.
pub const DEFAULT_CAMERA_FOV: f32 = 35.0;

pub const DEFAULT_PLANE_TRANSFORM: Transform = Transform {
    position: [0.0, 1.0, -1.0],
    orientation: [0.0, 0.0, 0.0, 1.0],
    scale: [1.6, 0.9, 1.0],
};

/// Position / orientation / scale tracks for one transformable object.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformTracks {
    #[serde(default)]
    pub position: VectorTrack,
    #[serde(default)]
    pub orientation: OrientationTrack,
    #[serde(default)]
    pub scale: VectorTrack,
}

impl TransformTracks {
    /// Key all three parts of `value` at `frame`.
    pub fn upsert(&mut self, frame: i32, value: &Transform, ease: Option<Ease>) {
        self.position.upsert(frame, value.position, ease);
        self.orientation.upsert(frame, value.orientation, ease);
        self.scale.upsert(frame, value.scale, ease);
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraTracks {
    #[serde(default)]
    pub position: VectorTrack,
    #[serde(default)]
    pub target: VectorTrack,
    /// Vertical FOV in degrees.
    #[serde(default)]
    pub fov: ScalarTrack,
}

/// Reference (video) plane: transform, video time offset and lock-to-anchor flag.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaneTracks {
    #[serde(flatten)]
    pub transform: TransformTracks,
    #[serde(default)]
    pub time_offset: ScalarTrack,
    #[serde(default)]
    pub lock_to_anchor: BoolTrack,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationState {
    #[serde(default)]
    pub rig_root: TransformTracks,
    /// Group scale tracks in group declaration order.
    #[serde(default)]
    pub group_scales: IndexMap<GroupId, VectorTrack>,
    /// Sparse absolute position overrides.
    #[serde(default)]
    pub joint_positions: BTreeMap<JointId, VectorTrack>,
    #[serde(default)]
    pub camera: CameraTracks,
    #[serde(default)]
    pub video_plane: PlaneTracks,
}

impl AnimationState {
    /// Fresh state with an (empty) scale track for each group, in the given order.
    pub fn with_groups<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<GroupId>,
    {
        let mut state = Self::default();
        for g in groups {
            state.group_scales.insert(g.into(), VectorTrack::new());
        }
        state
    }

    pub fn joint_track(&self, joint: &str) -> Option<&VectorTrack> {
        self.joint_positions.get(joint)
    }

    /// Position override track for `joint`, created on first use.
    pub fn joint_track_mut(&mut self, joint: &str) -> &mut VectorTrack {
        self.joint_positions.entry(joint.to_string()).or_default()
    }

    pub fn group_scale_track(&self, group: &str) -> Option<&VectorTrack> {
        self.group_scales.get(group)
    }

    /// Scale track for `group`, appended after the existing groups if missing.
    pub fn group_scale_track_mut(&mut self, group: &str) -> &mut VectorTrack {
        self.group_scales.entry(group.to_string()).or_default()
    }

    /// Keep only channels that exist in a new rig profile.
    ///
    /// Joint overrides survive for joints the profile knows. Group scale tracks are
    /// rebuilt in the profile's group order, carrying over tracks with a matching
    /// name. Rig-root, camera and plane tracks are profile-independent.
    pub fn remap_to_profile<'a, J, G>(&mut self, mut has_joint: J, groups: G)
    where
        J: FnMut(&str) -> bool,
        G: IntoIterator<Item = &'a str>,
    {
        self.joint_positions.retain(|id, _| has_joint(id.as_str()));
        let mut old = std::mem::take(&mut self.group_scales);
        for g in groups {
            let track = old.shift_remove(g).unwrap_or_default();
            self.group_scales.insert(g.to_string(), track);
        }
    }

    /// Total number of keys across all joint override tracks (diagnostics, tests).
    pub fn joint_key_count(&self) -> usize {
        self.joint_positions
            .values()
            .map(|t| t.x.len() + t.y.len() + t.z.len())
            .sum()
    }
}
