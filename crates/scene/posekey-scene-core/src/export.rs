//! Build the batch request for the external skeleton renderer.

use nalgebra::{Isometry3, Perspective3, Point3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::info;

use posekey_animation_core::math::{from_vector3, to_vector3};
use posekey_animation_core::{AnimationState, Vec3};
use posekey_editor_core::{EditorSession, Timeline};
use posekey_rig_core::{evaluate, sample_camera, CameraState, Rig};

use crate::document::OutputSettings;
use crate::service::{ExportRequest, Frame2D, Keypoint2D, Person2D};

const ZNEAR: f32 = 0.01;
const ZFAR: f32 = 1000.0;
const MIN_FOV_DEG: f32 = 1.0;
const MAX_FOV_DEG: f32 = 179.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportOptions {
    /// Inclusive frame range; `None` exports the whole timeline.
    pub frames: Option<(i32, i32)>,
    pub out_path: String,
    pub skeleton_only: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            frames: None,
            out_path: "out.mp4".to_string(),
            skeleton_only: true,
        }
    }
}

/// Evaluate, compose and project every exported frame of `anim`.
pub fn export(
    rig: &Rig,
    anim: &AnimationState,
    timeline: &Timeline,
    output: &OutputSettings,
    opts: &ExportOptions,
) -> ExportRequest {
    let (first, last) = opts.frames.unwrap_or((0, timeline.last_frame()));
    let aspect = output.aspect();
    let fps = timeline.fps.max(1);

    let frames: Vec<Frame2D> = (first..=last)
        .map(|frame| {
            let pose = evaluate(rig, anim, frame as f32);
            let camera = Projector::new(&sample_camera(anim, frame as f32), aspect);
            let person: Person2D = pose
                .world_positions()
                .into_iter()
                .map(|(joint, p)| (joint, camera.project(p)))
                .collect();
            Frame2D {
                frame,
                time: frame as f32 / fps as f32,
                persons: vec![person],
            }
        })
        .collect();

    let bones = rig
        .definition()
        .valid_bones()
        .map(|b| [b.parent.clone(), b.child.clone()])
        .collect();
    let (width, height) = output.render_size();

    info!(
        "export: {} frames, {} bones, {}x{} -> {}",
        frames.len(),
        rig.definition().valid_bones().count(),
        width,
        height,
        opts.out_path
    );
    ExportRequest {
        width,
        height,
        fps,
        bones,
        frames,
        out_path: opts.out_path.clone(),
        skeleton_only: opts.skeleton_only,
    }
}

/// Export the committed animation of `session`.
pub fn export_session(
    session: &EditorSession,
    output: &OutputSettings,
    opts: &ExportOptions,
) -> ExportRequest {
    export(session.rig(), session.anim(), &session.timeline(), output, opts)
}

/// Look-at perspective camera mapping world points to normalized device x/y.
struct Projector {
    view: Isometry3<f32>,
    proj: Perspective3<f32>,
}

impl Projector {
    fn new(cam: &CameraState, aspect: f32) -> Self {
        let eye = Point3::from(to_vector3(cam.position));
        let mut target = Point3::from(to_vector3(cam.target));
        if (target - eye).norm_squared() <= f32::EPSILON {
            target = eye - Vector3::z();
        }
        let forward = (target - eye).normalize();
        let up = if forward.cross(&Vector3::y()).norm_squared() <= 1e-8 {
            Vector3::z()
        } else {
            Vector3::y()
        };
        let fovy = cam.fov.clamp(MIN_FOV_DEG, MAX_FOV_DEG).to_radians();
        Self {
            view: Isometry3::look_at_rh(&eye, &target, &up),
            proj: Perspective3::new(aspect.max(f32::EPSILON), fovy, ZNEAR, ZFAR),
        }
    }

    fn project(&self, world: Vec3) -> Keypoint2D {
        let p = self.view.transform_point(&Point3::from(to_vector3(world)));
        // camera looks down -z in view space
        if p.z > -ZNEAR {
            return Keypoint2D { x: 0.0, y: 0.0, c: 0.0 };
        }
        let ndc = from_vector3(&self.proj.project_point(&p).coords);
        Keypoint2D {
            x: ndc[0],
            y: ndc[1],
            c: 1.0,
        }
    }
}
