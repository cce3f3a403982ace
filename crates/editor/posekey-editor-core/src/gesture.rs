//! Gesture state machine and delta math.
//!
//! A gesture turns a stream of handle samples into incremental edits: every update
//! applies only the change since the previous sample. Joint edits are position
//! rewrites; rotations carry each target's descendant closure along.

use std::collections::BTreeSet;
use std::fmt;

use hashbrown::{HashMap, HashSet};
use nalgebra::UnitQuaternion;

use posekey_animation_core::math::{add3, mul3, rotate_about, sub3, to_unit_quat};
use posekey_animation_core::{GroupId, JointId, Quat, Transform, Vec3};
use posekey_rig_core::RigTopology;

use crate::selection::ExternalTarget;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureKind {
    Translate,
    Rotate,
    Scale,
    DepthNudge,
}

impl fmt::Display for GestureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GestureKind::Translate => "translate",
            GestureKind::Rotate => "rotate",
            GestureKind::Scale => "scale",
            GestureKind::DepthNudge => "depth nudge",
        })
    }
}

/// One reading of the manipulation handle, in rig-local space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HandleSample {
    /// Handle position (translate).
    Position(Vec3),
    /// Handle orientation (rotate).
    Orientation(Quat),
    /// Cumulative handle scale since the gesture started (scale).
    Scale(Vec3),
    /// Vertical pointer coordinate in pixels, +y down (depth nudge).
    PointerY(f32),
}

impl HandleSample {
    pub fn fits(&self, kind: GestureKind) -> bool {
        matches!(
            (kind, self),
            (GestureKind::Translate, HandleSample::Position(_))
                | (GestureKind::Rotate, HandleSample::Orientation(_))
                | (GestureKind::Scale, HandleSample::Scale(_))
                | (GestureKind::DepthNudge, HandleSample::PointerY(_))
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum GestureTarget {
    Joints(Vec<JointId>),
    External(ExternalTarget),
}

/// Everything cancel needs to put back.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GestureSnapshot {
    pub overlay: HashMap<JointId, Vec3>,
    pub dirty: BTreeSet<JointId>,
    pub pending: bool,
    pub root_override: Option<Transform>,
    pub plane_override: Option<Transform>,
    pub pending_group_scales: HashMap<GroupId, Vec3>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ActiveGesture {
    pub kind: GestureKind,
    pub target: GestureTarget,
    /// Mean live position of the joint targets at start; `None` for external targets.
    pub pivot: Option<Vec3>,
    /// Last accepted handle sample (scale samples are stored clamped).
    pub previous: HandleSample,
    /// Rig-local unit direction for depth nudges.
    pub nudge_axis: Option<Vec3>,
    pub snapshot: GestureSnapshot,
    /// Set once auto-key wrote anything during this gesture.
    pub committed: bool,
    pub updates: u32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum GestureState {
    #[default]
    Idle,
    Active(Box<ActiveGesture>),
}

impl GestureState {
    pub fn is_active(&self) -> bool {
        matches!(self, GestureState::Active(_))
    }

    pub fn active(&self) -> Option<&ActiveGesture> {
        match self {
            GestureState::Active(g) => Some(g),
            GestureState::Idle => None,
        }
    }
}

/// Per-axis ratio `current / previous`; near-zero denominators give 1.
pub fn scale_ratio(current: Vec3, previous: Vec3, eps: f32) -> Vec3 {
    let mut out = [1.0; 3];
    for i in 0..3 {
        if previous[i].abs() > eps {
            out[i] = current[i] / previous[i];
        }
    }
    out
}

/// Incremental rotation `current * previous^-1`.
pub fn rotation_delta(current: Quat, previous: Quat) -> UnitQuaternion<f32> {
    to_unit_quat(current) * to_unit_quat(previous).inverse()
}

/// Add `offset` to every target. Returns the joints that moved.
pub fn translate_joints(
    positions: &mut HashMap<JointId, Vec3>,
    targets: &[JointId],
    offset: Vec3,
) -> Vec<JointId> {
    let mut moved = Vec::with_capacity(targets.len());
    for t in targets {
        if let Some(p) = positions.get_mut(t) {
            *p = add3(*p, offset);
            moved.push(t.clone());
        }
    }
    moved
}

/// Rotate the descendants of every target about that target by `delta`.
///
/// With several targets, the targets and their descendants all turn about `pivot`,
/// so the selection moves rigidly. A lone target stays put and its descendants turn
/// about it. No joint is rotated twice in one call. Returns the joints that moved,
/// in application order.
pub fn rotate_joints(
    positions: &mut HashMap<JointId, Vec3>,
    topology: &RigTopology,
    targets: &[JointId],
    pivot: Vec3,
    delta: &UnitQuaternion<f32>,
) -> Vec<JointId> {
    let mut moved: Vec<JointId> = Vec::new();
    let mut done: HashSet<JointId> = HashSet::new();

    let multi = targets.len() > 1;
    if multi {
        for t in targets {
            if let Some(p) = positions.get_mut(t) {
                *p = rotate_about(*p, pivot, delta);
                done.insert(t.clone());
                moved.push(t.clone());
            }
        }
    } else {
        done.extend(targets.iter().cloned());
    }

    for t in targets {
        // a target already moved about the pivot; its subtree must follow the same turn
        let center = if multi {
            pivot
        } else {
            match positions.get(t) {
                Some(p) => *p,
                None => continue,
            }
        };
        for d in topology.descendants(t).iter() {
            if done.contains(d) {
                continue;
            }
            if let Some(p) = positions.get_mut(d) {
                *p = rotate_about(*p, center, delta);
                done.insert(d.clone());
                moved.push(d.clone());
            }
        }
    }
    moved
}

/// Scale every target's offset from `pivot` by `ratio`, component-wise.
pub fn scale_joints(
    positions: &mut HashMap<JointId, Vec3>,
    targets: &[JointId],
    pivot: Vec3,
    ratio: Vec3,
) -> Vec<JointId> {
    let mut moved = Vec::with_capacity(targets.len());
    for t in targets {
        if let Some(p) = positions.get_mut(t) {
            *p = add3(pivot, mul3(sub3(*p, pivot), ratio));
            moved.push(t.clone());
        }
    }
    moved
}
