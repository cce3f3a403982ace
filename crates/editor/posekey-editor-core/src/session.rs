//! The editor session: owns the rig, the animation state and every piece of
//! interactive state (selection, dirty set, uncommitted overlay, gesture).
//!
//! Joint edits land in an overlay of live positions on top of the evaluated pose.
//! Commit turns overlay entries into position keys at the current frame. With
//! auto-key on, every applied gesture update commits immediately.

use std::collections::BTreeSet;

use hashbrown::HashMap;
use tracing::{debug, info, warn};

use posekey_animation_core::math::{
    add3, from_unit_quat, from_vector3, mean3, mul3, normalize3, scale3, sub3, to_unit_quat,
    to_vector3,
};
use posekey_animation_core::{AnimationState, GroupId, JointId, Transform, Vec3, ZERO_VEC3};
use posekey_rig_core::{
    evaluate_with, sample_camera, sample_plane, BuiltinCatalog, CameraState, EvaluatedPose,
    PlaneState, Rig, RigCatalog, RigProfileId,
};

use crate::config::EditorConfig;
use crate::error::EditError;
use crate::gesture::{
    rotate_joints, rotation_delta, scale_joints, scale_ratio, translate_joints, ActiveGesture,
    GestureKind, GestureSnapshot, GestureState, GestureTarget, HandleSample,
};
use crate::playback::{Playback, Timeline};
use crate::selection::{ExternalTarget, Selection};
use crate::status::{StatusLevel, StatusMessage, StatusQueue};

pub struct EditorSession {
    config: EditorConfig,
    catalog: Box<dyn RigCatalog>,
    rig: Rig,
    anim: AnimationState,
    playback: Playback,

    frame: i32,
    /// Evaluation time in frames; fractional only while playing.
    time: f32,
    auto_key: bool,

    selection: Selection,
    dirty: BTreeSet<JointId>,
    pending: bool,
    overlay: HashMap<JointId, Vec3>,
    root_override: Option<Transform>,
    plane_override: Option<Transform>,
    pending_group_scales: HashMap<GroupId, Vec3>,
    gesture: GestureState,

    status: StatusQueue,
    pose: EvaluatedPose,
}

impl EditorSession {
    pub fn new(
        config: EditorConfig,
        catalog: Box<dyn RigCatalog>,
        profile: RigProfileId,
    ) -> Result<Self, EditError> {
        let rig = Rig::from_catalog(catalog.as_ref(), profile)?;
        let anim = rig.default_state();
        Ok(Self::from_parts(config, catalog, rig, anim, Timeline::default()))
    }

    /// Session over the built-in profile catalogue with default configuration.
    pub fn with_builtin(profile: RigProfileId) -> Result<Self, EditError> {
        Self::new(EditorConfig::default(), Box::new(BuiltinCatalog), profile)
    }

    pub fn from_parts(
        config: EditorConfig,
        catalog: Box<dyn RigCatalog>,
        rig: Rig,
        anim: AnimationState,
        timeline: Timeline,
    ) -> Self {
        let pose = evaluate_with(&rig, &anim, 0.0, &HashMap::new());
        Self {
            auto_key: config.auto_key,
            status: StatusQueue::new(config.max_status_messages),
            config,
            catalog,
            rig,
            anim,
            playback: Playback::new(timeline),
            frame: 0,
            time: 0.0,
            selection: Selection::None,
            dirty: BTreeSet::new(),
            pending: false,
            overlay: HashMap::new(),
            root_override: None,
            plane_override: None,
            pending_group_scales: HashMap::new(),
            gesture: GestureState::Idle,
            pose,
        }
    }

    // ----- read access -----

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn rig(&self) -> &Rig {
        &self.rig
    }

    pub fn anim(&self) -> &AnimationState {
        &self.anim
    }

    pub fn frame(&self) -> i32 {
        self.frame
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn auto_key(&self) -> bool {
        self.auto_key
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn dirty(&self) -> &BTreeSet<JointId> {
        &self.dirty
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn gesture(&self) -> &GestureState {
        &self.gesture
    }

    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    pub fn playback_mut(&mut self) -> &mut Playback {
        &mut self.playback
    }

    pub fn timeline(&self) -> Timeline {
        self.playback.timeline
    }

    /// Live pose: evaluation plus uncommitted edits.
    pub fn pose(&self) -> &EvaluatedPose {
        &self.pose
    }

    pub fn live_position(&self, joint: &str) -> Option<Vec3> {
        self.pose.local_position(joint)
    }

    pub fn live_world_position(&self, joint: &str) -> Option<Vec3> {
        self.pose.world_position(joint)
    }

    pub fn rig_root_transform(&self) -> Transform {
        self.pose.root
    }

    pub fn plane(&self) -> PlaneState {
        let mut plane = sample_plane(&self.anim, self.time);
        if let Some(t) = self.plane_override {
            plane.transform = t;
        }
        plane
    }

    pub fn camera(&self) -> CameraState {
        sample_camera(&self.anim, self.time)
    }

    pub fn pending_group_scale(&self, group: &str) -> Option<Vec3> {
        self.pending_group_scales.get(group).copied()
    }

    /// Anything visible that is not in the track store yet.
    pub fn has_uncommitted_edits(&self) -> bool {
        self.pending
            || !self.overlay.is_empty()
            || self.root_override.is_some()
            || self.plane_override.is_some()
            || !self.pending_group_scales.is_empty()
    }

    pub fn drain_status(&mut self) -> Vec<StatusMessage> {
        self.status.drain()
    }

    // ----- selection -----

    pub fn select_joint(&mut self, joint: &str) -> Result<(), EditError> {
        if !self.rig.definition().has_joint(joint) {
            return Err(self.reject(EditError::UnknownJoint(joint.to_string())));
        }
        self.change_selection(Selection::single(joint));
        Ok(())
    }

    /// Multi-select: add `joint`, or remove it if already selected.
    pub fn toggle_joint(&mut self, joint: &str) -> Result<(), EditError> {
        if !self.rig.definition().has_joint(joint) {
            return Err(self.reject(EditError::UnknownJoint(joint.to_string())));
        }
        let next = self.selection.toggled(joint);
        self.change_selection(next);
        Ok(())
    }

    pub fn select_group(&mut self, group: &str) -> Result<(), EditError> {
        if self.rig.definition().group_members(group).is_none() {
            return Err(self.reject(EditError::UnknownGroup(group.to_string())));
        }
        self.change_selection(Selection::Group(group.to_string()));
        Ok(())
    }

    pub fn select_rig_root(&mut self) {
        self.change_selection(Selection::RigRoot);
    }

    pub fn select_reference_plane(&mut self) {
        self.change_selection(Selection::ReferencePlane);
    }

    pub fn clear_selection(&mut self) {
        self.change_selection(Selection::None);
    }

    /// Joints the current selection manipulates (live joints only).
    pub fn resolved_targets(&self) -> Vec<JointId> {
        let joints = &self.pose.joints;
        self.selection
            .resolve_joints(self.rig.definition(), |j| joints.contains_key(j))
    }

    fn change_selection(&mut self, next: Selection) {
        if next == self.selection {
            return;
        }
        if self.gesture.is_active() {
            self.abort_gesture("selection changed");
        }
        // uncommitted edits belong to the old selection
        if self.has_uncommitted_edits() {
            self.discard_uncommitted();
            self.refresh();
        }
        self.dirty.clear();
        debug!("selection: {:?} -> {:?}", self.selection, next);
        self.selection = next;
    }

    // ----- gestures -----

    /// Start a gesture on the current selection. `initial` is the handle reading at
    /// the start; later updates apply the change relative to the previous reading.
    ///
    /// A depth nudge started here pushes along the keyed camera's view direction;
    /// use [`EditorSession::begin_depth_nudge`] to supply another view.
    pub fn begin_gesture(&mut self, kind: GestureKind, initial: HandleSample) -> Result<(), EditError> {
        let forward = if kind == GestureKind::DepthNudge {
            let cam = self.camera();
            Some(sub3(cam.target, cam.position))
        } else {
            None
        };
        self.start_gesture(kind, initial, forward)
    }

    /// Start a depth nudge along `view_forward` (world space) for the lone selected joint.
    pub fn begin_depth_nudge(&mut self, pointer_y: f32, view_forward: Vec3) -> Result<(), EditError> {
        self.start_gesture(
            GestureKind::DepthNudge,
            HandleSample::PointerY(pointer_y),
            Some(view_forward),
        )
    }

    fn start_gesture(
        &mut self,
        kind: GestureKind,
        initial: HandleSample,
        view_forward: Option<Vec3>,
    ) -> Result<(), EditError> {
        if let Some(active) = self.gesture.active() {
            let err = EditError::GestureActive(active.kind);
            return Err(self.reject(err));
        }
        if !initial.fits(kind) {
            return Err(self.reject(EditError::HandleMismatch(kind)));
        }
        if self.selection.is_none() {
            return Err(self.reject(EditError::NoTargets));
        }

        let (target, pivot) = match self.selection.external() {
            Some(_) if kind == GestureKind::DepthNudge => {
                return Err(self.reject(EditError::NotALoneJoint));
            }
            Some(ext) => (GestureTarget::External(ext), None),
            None => {
                if kind == GestureKind::DepthNudge && self.selection.lone_joint().is_none() {
                    return Err(self.reject(EditError::NotALoneJoint));
                }
                let joints = self.resolved_targets();
                let pivot = mean3(joints.iter().filter_map(|j| self.pose.local_position(j)));
                match pivot {
                    Some(p) => (GestureTarget::Joints(joints), Some(p)),
                    None => {
                        let err = match kind {
                            GestureKind::Rotate | GestureKind::Scale => EditError::NoPivot,
                            GestureKind::Translate | GestureKind::DepthNudge => EditError::NoTargets,
                        };
                        return Err(self.reject(err));
                    }
                }
            }
        };

        let previous = match initial {
            HandleSample::Scale(s) => HandleSample::Scale(self.clamp_scale(s)),
            other => other,
        };
        let nudge_axis = view_forward.map(|f| {
            let inv = to_unit_quat(self.pose.root.orientation).inverse();
            normalize3(from_vector3(&(inv * to_vector3(f))))
        });

        debug!("gesture: begin {} on {:?} (pivot {:?})", kind, target, pivot);
        self.gesture = GestureState::Active(Box::new(ActiveGesture {
            kind,
            target,
            pivot,
            previous,
            nudge_axis,
            snapshot: self.snapshot(),
            committed: false,
            updates: 0,
        }));
        Ok(())
    }

    /// Feed a handle reading to the active gesture. Returns whether anything moved.
    pub fn update_gesture(&mut self, sample: HandleSample) -> Result<bool, EditError> {
        let mut g = match std::mem::take(&mut self.gesture) {
            GestureState::Active(g) => g,
            GestureState::Idle => return Err(self.reject(EditError::NoActiveGesture)),
        };
        if !sample.fits(g.kind) {
            let err = EditError::HandleMismatch(g.kind);
            self.gesture = GestureState::Active(g);
            return Err(self.reject(err));
        }

        let applied = match g.target.clone() {
            GestureTarget::Joints(targets) => {
                let live: Vec<JointId> = targets
                    .into_iter()
                    .filter(|t| self.pose.joints.contains_key(t.as_str()))
                    .collect();
                if live.is_empty() {
                    self.finish_abort(*g, "targets vanished");
                    return Err(self.reject(EditError::TargetsLost));
                }
                self.apply_joint_delta(&mut g, &live, sample)
            }
            GestureTarget::External(ext) => self.apply_external_delta(&mut g, ext, sample),
        };

        if applied {
            g.updates += 1;
            self.pending = true;
            self.refresh();
            if self.auto_key {
                self.commit();
                g.committed = true;
            }
        }
        self.gesture = GestureState::Active(g);
        Ok(applied)
    }

    /// Release: keep whatever the gesture did and return to idle.
    pub fn end_gesture(&mut self) -> Result<(), EditError> {
        match std::mem::take(&mut self.gesture) {
            GestureState::Active(g) => {
                debug!(
                    "gesture: end {} after {} updates (committed: {})",
                    g.kind, g.updates, g.committed
                );
                Ok(())
            }
            GestureState::Idle => Err(self.reject(EditError::NoActiveGesture)),
        }
    }

    /// Abandon the gesture. Uncommitted edits made during it are rolled back; keys
    /// already written by auto-key stay.
    pub fn cancel_gesture(&mut self) -> Result<(), EditError> {
        if !self.gesture.is_active() {
            return Err(self.reject(EditError::NoActiveGesture));
        }
        self.abort_gesture("cancelled");
        Ok(())
    }

    fn abort_gesture(&mut self, reason: &str) {
        if let GestureState::Active(g) = std::mem::take(&mut self.gesture) {
            self.finish_abort(*g, reason);
        }
    }

    fn finish_abort(&mut self, g: ActiveGesture, reason: &str) {
        if !g.committed {
            self.restore(g.snapshot);
            self.refresh();
        }
        debug!("gesture: {} aborted ({})", g.kind, reason);
        self.status
            .push(StatusLevel::Info, format!("{} gesture aborted: {}", g.kind, reason));
    }

    fn snapshot(&self) -> GestureSnapshot {
        GestureSnapshot {
            overlay: self.overlay.clone(),
            dirty: self.dirty.clone(),
            pending: self.pending,
            root_override: self.root_override,
            plane_override: self.plane_override,
            pending_group_scales: self.pending_group_scales.clone(),
        }
    }

    fn restore(&mut self, s: GestureSnapshot) {
        self.overlay = s.overlay;
        self.dirty = s.dirty;
        self.pending = s.pending;
        self.root_override = s.root_override;
        self.plane_override = s.plane_override;
        self.pending_group_scales = s.pending_group_scales;
    }

    fn clamp_scale(&self, s: Vec3) -> Vec3 {
        [
            self.config.clamp_scale_axis(s[0]),
            self.config.clamp_scale_axis(s[1]),
            self.config.clamp_scale_axis(s[2]),
        ]
    }

    fn apply_joint_delta(&mut self, g: &mut ActiveGesture, targets: &[JointId], sample: HandleSample) -> bool {
        let mut positions: HashMap<JointId, Vec3> = self
            .pose
            .joints
            .iter()
            .map(|(id, p)| (id.clone(), *p))
            .collect();
        let pivot = g.pivot.unwrap_or(ZERO_VEC3);

        let moved = match (g.previous, sample) {
            (HandleSample::Position(prev), HandleSample::Position(cur)) => {
                g.previous = sample;
                translate_joints(&mut positions, targets, sub3(cur, prev))
            }
            (HandleSample::Orientation(prev), HandleSample::Orientation(cur)) => {
                let delta = rotation_delta(cur, prev);
                if delta.angle() < self.config.rotate_epsilon {
                    return false;
                }
                g.previous = sample;
                rotate_joints(&mut positions, self.rig.topology(), targets, pivot, &delta)
            }
            (HandleSample::Scale(prev), HandleSample::Scale(cur)) => {
                let cur = self.clamp_scale(cur);
                let ratio = scale_ratio(cur, prev, self.config.ratio_epsilon);
                g.previous = HandleSample::Scale(cur);
                scale_joints(&mut positions, targets, pivot, ratio)
            }
            (HandleSample::PointerY(prev), HandleSample::PointerY(cur)) => {
                let axis = g.nudge_axis.unwrap_or(ZERO_VEC3);
                // dragging up pushes along the view direction
                let offset = scale3(axis, (prev - cur) * self.config.depth_sensitivity);
                g.previous = sample;
                translate_joints(&mut positions, targets, offset)
            }
            _ => return false,
        };

        if moved.is_empty() {
            return false;
        }
        for id in moved {
            if let Some(p) = positions.get(&id) {
                self.overlay.insert(id.clone(), *p);
            }
            self.dirty.insert(id);
        }
        true
    }

    fn apply_external_delta(&mut self, g: &mut ActiveGesture, ext: ExternalTarget, sample: HandleSample) -> bool {
        let mut t = match ext {
            ExternalTarget::RigRoot => self.rig_root_transform(),
            ExternalTarget::ReferencePlane => self.plane().transform,
        };
        match (g.previous, sample) {
            (HandleSample::Position(prev), HandleSample::Position(cur)) => {
                t.position = add3(t.position, sub3(cur, prev));
                g.previous = sample;
            }
            (HandleSample::Orientation(prev), HandleSample::Orientation(cur)) => {
                let delta = rotation_delta(cur, prev);
                if delta.angle() < self.config.rotate_epsilon {
                    return false;
                }
                t.orientation = from_unit_quat(&(delta * to_unit_quat(t.orientation)));
                g.previous = sample;
            }
            (HandleSample::Scale(prev), HandleSample::Scale(cur)) => {
                let cur = self.clamp_scale(cur);
                t.scale = mul3(t.scale, scale_ratio(cur, prev, self.config.ratio_epsilon));
                g.previous = HandleSample::Scale(cur);
            }
            _ => return false,
        }
        match ext {
            ExternalTarget::RigRoot => self.root_override = Some(t),
            ExternalTarget::ReferencePlane => self.plane_override = Some(t),
        }
        true
    }

    // ----- keying -----

    /// Write uncommitted edits as keys at the current frame. Returns the number of
    /// channels keyed. Keys at other frames are never touched.
    ///
    /// Joint and group selections key the dirty joints, or every resolved target
    /// when nothing is dirty and no group scale is being flushed. Rig-root and
    /// reference-plane selections key their whole transform.
    pub fn commit(&mut self) -> usize {
        let frame = self.frame;
        let mut written = 0;

        let flushed_groups = !self.pending_group_scales.is_empty();
        if flushed_groups {
            let groups: Vec<GroupId> = self.rig.definition().groups().keys().cloned().collect();
            for g in groups {
                if let Some(s) = self.pending_group_scales.remove(&g) {
                    self.anim.group_scale_track_mut(&g).upsert(frame, s, None);
                    written += 1;
                }
            }
            self.pending_group_scales.clear();
        }

        match self.selection.clone() {
            Selection::JointSet { .. } | Selection::Group(_) => {
                let ids: Vec<JointId> = if !self.dirty.is_empty() {
                    self.dirty.iter().cloned().collect()
                } else if !flushed_groups {
                    self.resolved_targets()
                } else {
                    Vec::new()
                };
                for id in ids {
                    if let Some(p) = self.pose.local_position(&id) {
                        self.anim.joint_track_mut(&id).upsert(frame, p, None);
                        self.overlay.remove(&id);
                        written += 1;
                    }
                }
            }
            Selection::RigRoot => {
                let t = self.rig_root_transform();
                self.anim.rig_root.upsert(frame, &t, None);
                self.root_override = None;
                written += 1;
            }
            Selection::ReferencePlane => {
                let t = self.plane().transform;
                self.anim.video_plane.transform.upsert(frame, &t, None);
                self.plane_override = None;
                written += 1;
            }
            Selection::None => {}
        }

        self.dirty.clear();
        self.pending = false;
        self.refresh();
        debug!("commit: {} channels keyed at frame {}", written, frame);
        written
    }

    /// Turning auto-key on while edits are pending commits them immediately.
    pub fn set_auto_key(&mut self, on: bool) {
        let was = self.auto_key;
        self.auto_key = on;
        if on && !was && self.pending {
            self.commit();
            if let GestureState::Active(g) = &mut self.gesture {
                g.committed = true;
            }
        }
        self.status.push(
            StatusLevel::Info,
            if on { "auto-key on" } else { "auto-key off" },
        );
    }

    /// Set a group's scale at the current frame: keyed immediately with auto-key,
    /// otherwise held as a pending overlay until commit.
    pub fn set_group_scale(&mut self, group: &str, scale: Vec3) -> Result<(), EditError> {
        if self.rig.definition().group_members(group).is_none() {
            return Err(self.reject(EditError::UnknownGroup(group.to_string())));
        }
        if self.auto_key {
            self.anim
                .group_scale_track_mut(group)
                .upsert(self.frame, scale, None);
            debug!("group scale {} keyed at frame {}: {:?}", group, self.frame, scale);
        } else {
            self.pending_group_scales.insert(group.to_string(), scale);
            self.pending = true;
        }
        self.refresh();
        Ok(())
    }

    // ----- time -----

    /// Jump to `frame`. Uncommitted edits are discarded.
    pub fn set_frame(&mut self, frame: i32) {
        self.playback.seek(frame);
        self.move_playhead(frame, frame as f32);
    }

    /// Advance playback by `dt` seconds. Reads the track store only.
    pub fn tick(&mut self, dt: f32) {
        if !self.playback.is_playing() {
            return;
        }
        let head = self.playback.advance(dt);
        self.move_playhead(head.floor() as i32, head);
    }

    fn move_playhead(&mut self, frame: i32, time: f32) {
        if frame != self.frame {
            if self.gesture.is_active() {
                self.abort_gesture("frame changed");
            }
            self.discard_uncommitted();
        }
        self.frame = frame;
        self.time = time;
        self.refresh();
    }

    fn discard_uncommitted(&mut self) {
        if !self.has_uncommitted_edits() {
            return;
        }
        self.overlay.clear();
        self.root_override = None;
        self.plane_override = None;
        self.pending_group_scales.clear();
        self.dirty.clear();
        self.pending = false;
        info!("discarded uncommitted edits at frame {}", self.frame);
        self.status.push(
            StatusLevel::Info,
            format!("discarded uncommitted edits at frame {}", self.frame),
        );
    }

    // ----- rig / animation replacement -----

    /// Swap to another catalogue profile. Rig, rest pose and topology cache are
    /// replaced together; animation channels the new profile lacks are dropped.
    pub fn switch_profile(&mut self, id: RigProfileId) -> Result<(), EditError> {
        if self.rig.id() == Some(id) {
            return Ok(());
        }
        let rig = match Rig::from_catalog(self.catalog.as_ref(), id) {
            Ok(rig) => rig,
            Err(e) => return Err(self.reject(e.into())),
        };
        self.abort_gesture("profile switched");
        self.discard_uncommitted();
        self.selection = Selection::None;

        let def = rig.definition();
        self.anim.remap_to_profile(
            |j| def.has_joint(j),
            def.groups().keys().map(String::as_str),
        );
        self.rig = rig;
        self.refresh();
        info!("switched rig profile to {}", id);
        self.status
            .push(StatusLevel::Info, format!("rig profile: {}", id));
        Ok(())
    }

    /// Replace rig and animation wholesale (scene load).
    pub fn replace_scene(&mut self, rig: Rig, anim: AnimationState, timeline: Timeline) {
        self.abort_gesture("scene replaced");
        self.discard_uncommitted();
        self.selection = Selection::None;
        self.rig = rig;
        self.anim = anim;
        self.playback = Playback::new(timeline);
        self.frame = 0;
        self.time = 0.0;
        self.refresh();
    }

    /// Run a bulk edit (e.g. pose ingest) against the stored animation. Uncommitted
    /// visual edits are discarded first.
    pub fn edit_animation<R>(&mut self, f: impl FnOnce(&Rig, &mut AnimationState) -> R) -> R {
        self.abort_gesture("animation replaced");
        self.discard_uncommitted();
        let out = f(&self.rig, &mut self.anim);
        self.refresh();
        out
    }

    // ----- internals -----

    fn refresh(&mut self) {
        let mut pose = evaluate_with(&self.rig, &self.anim, self.time, &self.pending_group_scales);
        for (id, p) in &self.overlay {
            if let Some(slot) = pose.joints.get_mut(id.as_str()) {
                *slot = *p;
            }
        }
        if let Some(root) = self.root_override {
            pose.root = root;
        }
        self.pose = pose;
    }

    fn reject(&mut self, err: EditError) -> EditError {
        warn!("rejected: {}", err);
        self.status.push(StatusLevel::Warning, err.to_string());
        err
    }
}
