//! Persisted scene document.
//!
//! Saved wholesale from a session and loaded wholesale into one. Loading is
//! tolerant: every top-level section (and every `anim` channel group) is decoded on
//! its own and replaced by its default when missing or malformed. Only a document
//! that is not a JSON object is rejected.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use posekey_animation_core::AnimationState;
use posekey_editor_core::{EditorSession, Timeline};
use posekey_rig_core::{Rig, RigCatalog, RigDefDocument, RigError, RigProfile, RigProfileId};

use crate::error::SceneError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SceneMeta {
    pub app_version: String,
    /// Free-form timestamp supplied by the host.
    pub created_at: String,
}

impl Default for SceneMeta {
    fn default() -> Self {
        Self {
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: String::new(),
        }
    }
}

/// Framing guides drawn over the output frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Guides {
    pub thirds: bool,
    pub center: bool,
    pub action_safe: bool,
    pub title_safe: bool,
    pub action_safe_pct: f32,
    pub title_safe_pct: f32,
}

impl Default for Guides {
    fn default() -> Self {
        Self {
            thirds: true,
            center: true,
            action_safe: true,
            title_safe: false,
            action_safe_pct: 93.0,
            title_safe_pct: 90.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutputSettings {
    pub width: u32,
    pub height: u32,
    pub pixel_aspect: f32,
    pub render_scale: f32,
    pub overscan_pct: f32,
    pub guides: Guides,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            pixel_aspect: 1.0,
            render_scale: 1.0,
            overscan_pct: 0.0,
            guides: Guides::default(),
        }
    }
}

impl OutputSettings {
    /// Rendered size after `render_scale`.
    pub fn render_size(&self) -> (u32, u32) {
        let scale = |v: u32| (v as f32 * self.render_scale).round().max(0.0) as u32;
        (scale(self.width), scale(self.height))
    }

    /// Display aspect ratio (width over height, pixel aspect applied).
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            return 1.0;
        }
        self.width as f32 * self.pixel_aspect / self.height as f32
    }
}

/// On-disk shape of a scene.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDocument {
    pub meta: SceneMeta,
    pub timeline: Timeline,
    pub rig_profile: RigProfileId,
    pub rig_def: RigDefDocument,
    pub anim: AnimationState,
    pub output: OutputSettings,
}

impl SceneDocument {
    /// Snapshot of the committed state of `session`. Uncommitted edits are not saved.
    pub fn capture(session: &EditorSession, meta: SceneMeta, output: OutputSettings) -> Self {
        let rig = session.rig();
        Self {
            meta,
            timeline: session.timeline(),
            rig_profile: rig.id().unwrap_or_default(),
            rig_def: rig.profile().to_document(),
            anim: session.anim().clone(),
            output,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, SceneError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A decoded scene ready to hand to a session.
#[derive(Debug)]
pub struct LoadedScene {
    pub meta: SceneMeta,
    pub timeline: Timeline,
    pub output: OutputSettings,
    pub rig: Rig,
    pub anim: AnimationState,
    /// Sections that were missing or malformed and fell back to defaults.
    pub fallbacks: Vec<String>,
}

impl LoadedScene {
    /// Replace the session's rig and animation with this scene.
    pub fn apply_to(self, session: &mut EditorSession) -> (SceneMeta, OutputSettings) {
        session.replace_scene(self.rig, self.anim, self.timeline);
        (self.meta, self.output)
    }
}

pub fn load_scene(json: &str, catalog: &dyn RigCatalog) -> Result<LoadedScene, SceneError> {
    let value: Value = serde_json::from_str(json)?;
    load_scene_value(&value, catalog)
}

pub fn load_scene_value(value: &Value, catalog: &dyn RigCatalog) -> Result<LoadedScene, SceneError> {
    let obj = value.as_object().ok_or(SceneError::NotAnObject)?;
    let mut fallbacks = Vec::new();

    let meta = section(obj, "meta", &mut fallbacks).unwrap_or_default();
    let timeline = section(obj, "timeline", &mut fallbacks).unwrap_or_default();
    let output = section(obj, "output", &mut fallbacks).unwrap_or_default();
    let profile_id: RigProfileId = section(obj, "rigProfile", &mut fallbacks).unwrap_or_default();
    let rig_def: Option<RigDefDocument> = section(obj, "rigDef", &mut fallbacks);

    let rig = resolve_rig(profile_id, rig_def.as_ref(), catalog, &mut fallbacks)?;
    let anim = match obj.get("anim").and_then(Value::as_object) {
        Some(anim) => decode_anim(anim, &rig, &mut fallbacks),
        None => {
            note_fallback("anim", "missing or not an object", &mut fallbacks);
            rig.default_state()
        }
    };

    info!(
        "scene loaded: profile {}, {} joint tracks, {} fallbacks",
        profile_id,
        anim.joint_positions.len(),
        fallbacks.len()
    );
    Ok(LoadedScene {
        meta,
        timeline,
        output,
        rig,
        anim,
        fallbacks,
    })
}

/// An embedded definition with at least one joint wins over the catalogue entry.
fn resolve_rig(
    id: RigProfileId,
    embedded: Option<&RigDefDocument>,
    catalog: &dyn RigCatalog,
    fallbacks: &mut Vec<String>,
) -> Result<Rig, SceneError> {
    if let Some(doc) = embedded.filter(|d| !d.joints.is_empty()) {
        match RigProfile::from_document(Some(id), doc) {
            Ok(profile) => return Ok(Rig::new(profile)),
            Err(e) => note_fallback("rigDef", &e.to_string(), fallbacks),
        }
    }
    if let Some(profile) = catalog.profile(id) {
        return Ok(Rig::new(profile));
    }
    let default = RigProfileId::default();
    warn!("scene: catalogue has no profile {}, trying {}", id, default);
    catalog
        .profile(default)
        .map(Rig::new)
        .ok_or_else(|| RigError::UnknownProfile(id.to_string()).into())
}

fn decode_anim(obj: &Map<String, Value>, rig: &Rig, fallbacks: &mut Vec<String>) -> AnimationState {
    let mut anim = AnimationState::default();
    if let Some(v) = anim_field(obj, "rigRoot", fallbacks) {
        anim.rig_root = v;
    }
    if let Some(v) = anim_field(obj, "groupScales", fallbacks) {
        anim.group_scales = v;
    }
    if let Some(v) = anim_field(obj, "jointPositions", fallbacks) {
        anim.joint_positions = v;
    }
    if let Some(v) = anim_field(obj, "camera", fallbacks) {
        anim.camera = v;
    }
    if let Some(v) = anim_field(obj, "videoPlane", fallbacks) {
        anim.video_plane = v;
    }

    let def = rig.definition();
    anim.remap_to_profile(|j| def.has_joint(j), def.groups().keys().map(String::as_str));
    anim
}

fn anim_field<T: DeserializeOwned>(
    obj: &Map<String, Value>,
    key: &str,
    fallbacks: &mut Vec<String>,
) -> Option<T> {
    labelled_section(obj, key, &format!("anim.{key}"), fallbacks)
}

fn section<T: DeserializeOwned>(
    obj: &Map<String, Value>,
    key: &str,
    fallbacks: &mut Vec<String>,
) -> Option<T> {
    labelled_section(obj, key, key, fallbacks)
}

/// Decode `obj[key]`; a missing or malformed value is recorded under `label`.
fn labelled_section<T: DeserializeOwned>(
    obj: &Map<String, Value>,
    key: &str,
    label: &str,
    fallbacks: &mut Vec<String>,
) -> Option<T> {
    match obj.get(key) {
        None => {
            fallbacks.push(label.to_string());
            None
        }
        Some(v) => match T::deserialize(v) {
            Ok(t) => Some(t),
            Err(e) => {
                note_fallback(label, &e.to_string(), fallbacks);
                None
            }
        },
    }
}

fn note_fallback(name: &str, why: &str, fallbacks: &mut Vec<String>) {
    warn!("scene: '{}' unusable ({}), using default", name, why);
    fallbacks.push(name.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use posekey_rig_core::BuiltinCatalog;

    #[test]
    fn render_size_rounds() {
        let out = OutputSettings {
            render_scale: 0.333,
            ..OutputSettings::default()
        };
        assert_eq!(out.render_size(), (639, 360));
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(matches!(
            load_scene("[1, 2, 3]", &BuiltinCatalog),
            Err(SceneError::NotAnObject)
        ));
        assert!(matches!(load_scene("{ nope", &BuiltinCatalog), Err(SceneError::Json(_))));
    }

    #[test]
    fn empty_object_is_a_default_scene() {
        let scene = load_scene("{}", &BuiltinCatalog).unwrap();
        assert_eq!(scene.rig.id(), Some(RigProfileId::VitposeBody17));
        assert_eq!(scene.timeline, Timeline::default());
        assert_eq!(scene.output, OutputSettings::default());
        assert_eq!(scene.anim.group_scales.len(), 6);
        assert!(scene.fallbacks.contains(&"anim".to_string()));
    }
}
