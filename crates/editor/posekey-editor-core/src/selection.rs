//! What the operator has selected.

use posekey_animation_core::{GroupId, JointId};
use posekey_rig_core::RigDefinition;

/// Closed set of selectable things. A `JointSet` is never empty; removing its last
/// member collapses it to `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    None,
    JointSet {
        /// Members in selection order.
        joints: Vec<JointId>,
        /// Most recently selected member.
        focus: JointId,
    },
    Group(GroupId),
    RigRoot,
    ReferencePlane,
}

/// The single non-joint object a selection can point at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExternalTarget {
    RigRoot,
    ReferencePlane,
}

impl Selection {
    pub fn single(joint: impl Into<JointId>) -> Self {
        let joint = joint.into();
        Selection::JointSet {
            joints: vec![joint.clone()],
            focus: joint,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Selection::None)
    }

    /// Add `joint` if absent (it becomes the focus), remove it if present.
    pub fn toggled(&self, joint: &str) -> Selection {
        match self {
            Selection::JointSet { joints, focus } => {
                if joints.iter().any(|j| j == joint) {
                    let rest: Vec<JointId> =
                        joints.iter().filter(|j| *j != joint).cloned().collect();
                    match rest.last().cloned() {
                        None => Selection::None,
                        Some(last) => {
                            let focus = if focus == joint { last } else { focus.clone() };
                            Selection::JointSet {
                                joints: rest,
                                focus,
                            }
                        }
                    }
                } else {
                    let mut joints = joints.clone();
                    joints.push(joint.to_string());
                    Selection::JointSet {
                        joints,
                        focus: joint.to_string(),
                    }
                }
            }
            Selection::None | Selection::Group(_) | Selection::RigRoot | Selection::ReferencePlane => {
                Selection::single(joint)
            }
        }
    }

    /// The lone selected joint, if exactly one joint is selected.
    pub fn lone_joint(&self) -> Option<&str> {
        match self {
            Selection::JointSet { joints, .. } if joints.len() == 1 => Some(joints[0].as_str()),
            _ => None,
        }
    }

    pub fn external(&self) -> Option<ExternalTarget> {
        match self {
            Selection::RigRoot => Some(ExternalTarget::RigRoot),
            Selection::ReferencePlane => Some(ExternalTarget::ReferencePlane),
            Selection::None | Selection::JointSet { .. } | Selection::Group(_) => None,
        }
    }

    /// Joints this selection manipulates, filtered by `is_live` (joints present in
    /// the current pose). Joint-set order or group member order is kept.
    pub fn resolve_joints<F>(&self, def: &RigDefinition, mut is_live: F) -> Vec<JointId>
    where
        F: FnMut(&str) -> bool,
    {
        match self {
            Selection::JointSet { joints, .. } => {
                joints.iter().filter(|j| is_live(j)).cloned().collect()
            }
            Selection::Group(g) => def
                .group_members(g)
                .unwrap_or(&[])
                .iter()
                .filter(|j| is_live(j))
                .cloned()
                .collect(),
            Selection::None | Selection::RigRoot | Selection::ReferencePlane => Vec::new(),
        }
    }
}
