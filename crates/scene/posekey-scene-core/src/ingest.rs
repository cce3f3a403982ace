//! Turn a pose-estimation result into joint position keys.
//!
//! The whole clip is fitted onto the rig's rest pose with one uniform scale, so
//! proportions between frames survive: the detected height maps onto the rest
//! height, feet land on the rest floor and the clip is centred on the rest centre.

use std::collections::{BTreeSet, HashSet};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use posekey_animation_core::{AnimationState, JointId, Vec3};
use posekey_rig_core::Rig;

use crate::service::ProcessResult;

/// Joints derived from a pair of source keypoints, in dependency order.
const SYNTHESIZED: [(&str, &str, &str); 4] = [
    ("neck", "leftShoulder", "rightShoulder"),
    ("midHip", "leftHip", "rightHip"),
    ("head", "leftEar", "rightEar"),
    ("chest", "neck", "midHip"),
];

const MIN_EXTENT: f32 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IngestOptions {
    /// Added to every remapped timeline frame.
    pub frame_offset: i32,
    /// Keypoints with a lower confidence are dropped.
    pub min_confidence: f32,
    /// Use `kpts3d` when the result carries it.
    pub prefer_3d: bool,
    /// Derive neck/midHip/head/chest from neighbouring keypoints.
    pub synthesize_missing: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            frame_offset: 0,
            min_confidence: 0.0,
            prefer_3d: true,
            synthesize_missing: true,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Distinct timeline frames that received at least one key.
    pub frames_written: usize,
    pub keys_written: usize,
    /// Source names with no joint in the rig, sorted.
    pub unmapped: Vec<String>,
}

struct SourceFrame {
    frame: i32,
    points: IndexMap<JointId, Vec3>,
}

/// Write the first detected person of every frame into `anim` as joint keys.
pub fn ingest(
    rig: &Rig,
    anim: &mut AnimationState,
    result: &ProcessResult,
    timeline_fps: u32,
    opts: &IngestOptions,
) -> IngestReport {
    let (frames, has_depth) = collect_frames(result, opts);
    let def = rig.definition();
    let rest = rig.rest();

    let mut unmapped = BTreeSet::new();
    let mut frames: Vec<SourceFrame> = frames
        .into_iter()
        .map(|mut f| {
            if opts.synthesize_missing {
                synthesize(&mut f.points, |j| def.has_joint(j));
            }
            f.points.retain(|name, _| {
                let known = def.has_joint(name) && rest.contains(name);
                if !known {
                    unmapped.insert(name.clone());
                }
                known
            });
            f
        })
        .collect();

    let fit = Fit::new(&frames, rig);
    let effective = if result.meta.effective_fps > 0.0 {
        result.meta.effective_fps
    } else {
        timeline_fps as f32
    };
    let ratio = timeline_fps as f32 / effective;

    let mut touched = HashSet::new();
    let mut keys_written = 0;
    for f in frames.iter_mut() {
        let target = (f.frame as f32 * ratio).round() as i32 + opts.frame_offset;
        for (joint, p) in f.points.drain(..) {
            let rest_z = rest.get(&joint).map(|r| r[2]).unwrap_or(0.0);
            let value = fit.apply(p, has_depth, rest_z);
            anim.joint_track_mut(&joint).upsert(target, value, None);
            keys_written += 1;
            touched.insert(target);
        }
    }

    let report = IngestReport {
        frames_written: touched.len(),
        keys_written,
        unmapped: unmapped.into_iter().collect(),
    };
    info!(
        "ingest: {} keys over {} frames ({} fps -> {} fps, {})",
        report.keys_written,
        report.frames_written,
        effective,
        timeline_fps,
        if has_depth { "3d" } else { "2d" }
    );
    if !report.unmapped.is_empty() {
        debug!("ingest: unmapped keypoints {:?}", report.unmapped);
    }
    report
}

/// First person of each frame, confidence-filtered. The flag is true for 3D input.
fn collect_frames(result: &ProcessResult, opts: &IngestOptions) -> (Vec<SourceFrame>, bool) {
    let keep = |c: f32| c >= opts.min_confidence;
    match result.kpts3d.as_ref() {
        Some(frames3d) if opts.prefer_3d && !frames3d.is_empty() => {
            let frames = frames3d
                .iter()
                .map(|f| SourceFrame {
                    frame: f.frame,
                    points: f
                        .persons
                        .first()
                        .map(|p| {
                            p.iter()
                                .filter(|(_, k)| keep(k.c))
                                .map(|(j, k)| (j.clone(), [k.x, k.y, k.z]))
                                .collect()
                        })
                        .unwrap_or_default(),
                })
                .collect();
            (frames, true)
        }
        _ => {
            let frames = result
                .kpts2d
                .iter()
                .map(|f| SourceFrame {
                    frame: f.frame,
                    points: f
                        .persons
                        .first()
                        .map(|p| {
                            p.iter()
                                .filter(|(_, k)| keep(k.c))
                                .map(|(j, k)| (j.clone(), [k.x, k.y, 0.0]))
                                .collect()
                        })
                        .unwrap_or_default(),
                })
                .collect();
            (frames, false)
        }
    }
}

fn synthesize(points: &mut IndexMap<JointId, Vec3>, has_joint: impl Fn(&str) -> bool) {
    for (target, a, b) in SYNTHESIZED {
        if !has_joint(target) || points.contains_key(target) {
            continue;
        }
        if let (Some(pa), Some(pb)) = (points.get(a), points.get(b)) {
            let mid = [
                (pa[0] + pb[0]) * 0.5,
                (pa[1] + pb[1]) * 0.5,
                (pa[2] + pb[2]) * 0.5,
            ];
            points.insert(target.to_string(), mid);
        }
    }
}

/// Clip-global uniform fit of source bounds onto rest bounds.
struct Fit {
    scale: f32,
    src_min: Vec3,
    src_max: Vec3,
    rest_min: Vec3,
    rest_max: Vec3,
}

impl Fit {
    fn new(frames: &[SourceFrame], rig: &Rig) -> Self {
        let (rest_min, rest_max) = rig.rest().bounds().unwrap_or(([0.0; 3], [0.0; 3]));
        let mut points = frames.iter().flat_map(|f| f.points.values().copied());
        let (src_min, src_max) = match points.next() {
            Some(first) => points.fold((first, first), |(mut lo, mut hi), p| {
                for i in 0..3 {
                    lo[i] = lo[i].min(p[i]);
                    hi[i] = hi[i].max(p[i]);
                }
                (lo, hi)
            }),
            None => ([0.0; 3], [0.0; 3]),
        };
        let src_h = src_max[1] - src_min[1];
        let rest_h = rest_max[1] - rest_min[1];
        let scale = if src_h > MIN_EXTENT && rest_h > MIN_EXTENT {
            rest_h / src_h
        } else {
            1.0
        };
        Self {
            scale,
            src_min,
            src_max,
            rest_min,
            rest_max,
        }
    }

    fn apply(&self, p: Vec3, has_depth: bool, rest_z: f32) -> Vec3 {
        let mid = |lo: Vec3, hi: Vec3, i: usize| (lo[i] + hi[i]) * 0.5;
        let x = mid(self.rest_min, self.rest_max, 0)
            + (p[0] - mid(self.src_min, self.src_max, 0)) * self.scale;
        let y = self.rest_min[1] + (p[1] - self.src_min[1]) * self.scale;
        let z = if has_depth {
            mid(self.rest_min, self.rest_max, 2)
                + (p[2] - mid(self.src_min, self.src_max, 2)) * self.scale
        } else {
            rest_z
        };
        [x, y, z]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthesizes_in_dependency_order() {
        let mut points: IndexMap<JointId, Vec3> = IndexMap::new();
        points.insert("leftShoulder".into(), [-1.0, 2.0, 0.0]);
        points.insert("rightShoulder".into(), [1.0, 2.0, 0.0]);
        points.insert("leftHip".into(), [-1.0, 0.0, 0.0]);
        points.insert("rightHip".into(), [1.0, 0.0, 0.0]);
        synthesize(&mut points, |_| true);
        assert_eq!(points["neck"], [0.0, 2.0, 0.0]);
        assert_eq!(points["midHip"], [0.0, 0.0, 0.0]);
        assert_eq!(points["chest"], [0.0, 1.0, 0.0]);
        assert!(!points.contains_key("head"));
    }

    #[test]
    fn supplied_joints_are_not_replaced() {
        let mut points: IndexMap<JointId, Vec3> = IndexMap::new();
        points.insert("neck".into(), [5.0, 5.0, 5.0]);
        points.insert("leftShoulder".into(), [-1.0, 2.0, 0.0]);
        points.insert("rightShoulder".into(), [1.0, 2.0, 0.0]);
        synthesize(&mut points, |j| j != "chest");
        assert_eq!(points["neck"], [5.0, 5.0, 5.0]);
    }
}
