//! Wire types shared with the pose-estimation service.
//!
//! Keypoints are normalized to `[-1, 1]` with +y up: `nx = x / w * 2 - 1`,
//! `ny = 1 - y / h * 2`. Persons map editor joint ids to keypoints.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use posekey_animation_core::JointId;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Hf,
    Mmpose,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoseModelKind {
    #[default]
    Vitpose,
    Dwpose,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VitposeVariant {
    #[default]
    #[serde(rename = "base-simple")]
    BaseSimple,
    #[serde(rename = "l-wholebody")]
    LWholebody,
    #[serde(rename = "l-wholebody-onnx")]
    LWholebodyOnnx,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    #[default]
    Cpu,
    Cuda,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonMode {
    #[default]
    Single,
    Multi,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SmoothKind {
    #[default]
    OneEuro,
    Savgol,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothOpts {
    #[serde(rename = "type")]
    pub kind: SmoothKind,
    pub strength: f32,
}

impl Default for SmoothOpts {
    fn default() -> Self {
        Self {
            kind: SmoothKind::OneEuro,
            strength: 0.6,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Lift3DOpts {
    pub model: String,
    pub receptive_frames: u32,
    pub scale_to_rig: bool,
}

impl Default for Lift3DOpts {
    fn default() -> Self {
        Self {
            model: "videopose3d".to_string(),
            receptive_frames: 27,
            scale_to_rig: true,
        }
    }
}

/// Request options sent alongside the video asset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessorOptions {
    pub backend: Backend,
    pub model: PoseModelKind,
    pub vitpose_variant: VitposeVariant,
    pub device: Device,
    pub fps: u32,
    pub resize_width: Option<u32>,
    pub resize_height: Option<u32>,
    pub person_mode: PersonMode,
    pub include_hands: bool,
    pub include_face: bool,
    pub smooth: SmoothOpts,
    #[serde(rename = "lift3D")]
    pub lift_3d: Option<Lift3DOpts>,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            model: PoseModelKind::default(),
            vitpose_variant: VitposeVariant::default(),
            device: Device::default(),
            fps: 24,
            resize_width: None,
            resize_height: None,
            person_mode: PersonMode::default(),
            include_hands: false,
            include_face: false,
            smooth: SmoothOpts::default(),
            lift_3d: Some(Lift3DOpts::default()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keypoint2D {
    pub x: f32,
    pub y: f32,
    pub c: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keypoint3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub c: f32,
}

pub type Person2D = IndexMap<JointId, Keypoint2D>;
pub type Person3D = IndexMap<JointId, Keypoint3D>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame2D {
    pub frame: i32,
    /// Seconds from the start of the source.
    #[serde(default)]
    pub time: f32,
    #[serde(default)]
    pub persons: Vec<Person2D>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame3D {
    pub frame: i32,
    #[serde(default)]
    pub persons: Vec<Person3D>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessMeta {
    /// Source video facts (fps, width, height, frame count).
    pub source: IndexMap<String, f32>,
    pub effective_fps: f32,
    pub model: PoseModelKind,
    /// Body profile id reported by the service; may name profiles the editor lacks.
    pub body_profile: String,
    /// Service keypoint index -> editor joint id.
    pub mapping: IndexMap<String, String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResult {
    #[serde(default)]
    pub meta: ProcessMeta,
    #[serde(default)]
    pub kpts2d: Vec<Frame2D>,
    #[serde(default)]
    pub kpts3d: Option<Vec<Frame3D>>,
}

/// Batch job for the external skeleton renderer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub bones: Vec<[JointId; 2]>,
    pub frames: Vec<Frame2D>,
    pub out_path: String,
    pub skeleton_only: bool,
}
