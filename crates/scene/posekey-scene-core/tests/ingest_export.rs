use posekey_animation_core::{sample_vector, Vec3};
use posekey_editor_core::{EditorSession, Timeline};
use posekey_rig_core::{Rig, RigProfile, RigProfileId};
use posekey_scene_core::{
    export, export_session, ingest, ExportOptions, IngestOptions, OutputSettings, ProcessResult,
};
use posekey_test_fixtures::pose_results;

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn approx3(a: Vec3, b: Vec3, eps: f32) {
    for i in 0..3 {
        approx(a[i], b[i], eps);
    }
}

fn keyed(session: &EditorSession, joint: &str, frame: i32) -> Vec3 {
    let track = session.anim().joint_track(joint).unwrap();
    assert!(track.key_frames().contains(&frame), "{joint} not keyed at {frame}");
    sample_vector(track, frame as f32, None).unwrap()
}

const FIT: f32 = 1.54 / 1.5;

/// it should fit the clip onto the rest pose and remap service frames onto the timeline
#[test]
fn ingest_2d_rescales_and_remaps() {
    let result: ProcessResult = pose_results::load("vitpose-2d").unwrap();
    let mut session = EditorSession::with_builtin(RigProfileId::VitposeBody17).unwrap();
    let opts = IngestOptions {
        frame_offset: 10,
        min_confidence: 0.3,
        ..IngestOptions::default()
    };
    let fps = session.timeline().fps;
    let report = session.edit_animation(|rig, anim| ingest(rig, anim, &result, fps, &opts));

    assert_eq!(report.frames_written, 2);
    assert_eq!(report.keys_written, 22);
    assert_eq!(report.unmapped, vec!["leftEar", "leftEye", "rightEar"]);
    assert!(session.anim().joint_track("leftWrist").is_none());

    // feet on the rest floor, rest depth kept for 2D input
    approx3(keyed(&session, "leftAnkle", 10), [0.05 * FIT, 0.08, -0.02], 1e-5);
    approx3(keyed(&session, "leftAnkle", 12), [0.15 * FIT, 0.08, -0.02], 1e-5);
    // synthesized from the ears, top of the clip maps to the top of the rest pose
    approx3(keyed(&session, "head", 10), [-0.05 * FIT, 1.62, 0.0], 1e-5);
    approx(keyed(&session, "neck", 10)[1], 0.08 + 1.2 * FIT, 1e-5);
    approx(keyed(&session, "chest", 10)[1], 0.08 + 0.95 * FIT, 1e-5);

    // the live pose reflects the new keys
    approx3(
        session.live_position("leftAnkle").unwrap(),
        [0.05 * FIT, 0.08, -0.02],
        1e-5,
    );
}

/// it should use lifted depth when present and fall back to rest depth when asked not to
#[test]
fn ingest_prefers_3d() {
    let result: ProcessResult = pose_results::load("lifted-3d").unwrap();
    let fit = 1.6 / 1.5;

    let mut session = EditorSession::with_builtin(RigProfileId::DwposeBody25).unwrap();
    let report = session.edit_animation(|rig, anim| {
        ingest(rig, anim, &result, 24, &IngestOptions::default())
    });
    assert_eq!(report.keys_written, 3);
    assert!(report.unmapped.is_empty());
    approx3(
        keyed(&session, "leftAnkle", 0),
        [0.1 * fit, 0.02, 0.04 + 0.2 * fit],
        1e-5,
    );
    approx(keyed(&session, "nose", 0)[1], 1.62, 1e-5);

    let flat = IngestOptions {
        prefer_3d: false,
        ..IngestOptions::default()
    };
    session.edit_animation(|rig, anim| ingest(rig, anim, &result, 24, &flat));
    approx3(keyed(&session, "leftAnkle", 0), [0.1 * fit, 0.02, -0.02], 1e-5);
}

fn probe_rig() -> Rig {
    let profile = RigProfile::from_json(
        None,
        r#"{
            "joints": ["centre", "behind", "ghost"],
            "bones": [["centre", "behind"], ["behind", "nowhere"]],
            "defaultRest": { "centre": [0.0, 1.0, 0.0], "behind": [0.0, 1.0, 9.0] }
        }"#,
    )
    .unwrap();
    Rig::new(profile)
}

/// it should project the camera target to the frame centre and blank joints behind the camera
#[test]
fn export_projects_through_camera() {
    let rig = probe_rig();
    let anim = rig.default_state();
    let timeline = Timeline {
        fps: 24,
        frame_count: 3,
    };
    let output = OutputSettings {
        render_scale: 0.5,
        ..OutputSettings::default()
    };
    let req = export(&rig, &anim, &timeline, &output, &ExportOptions::default());

    assert_eq!((req.width, req.height, req.fps), (960, 540, 24));
    assert_eq!(req.out_path, "out.mp4");
    assert!(req.skeleton_only);
    assert_eq!(req.bones, vec![["centre".to_string(), "behind".to_string()]]);
    assert_eq!(req.frames.len(), 3);
    approx(req.frames[2].time, 2.0 / 24.0, 1e-6);

    let person = &req.frames[0].persons[0];
    assert_eq!(person.len(), 2);
    let centre = person["centre"];
    approx(centre.x, 0.0, 1e-5);
    approx(centre.y, 0.0, 1e-5);
    assert_eq!(centre.c, 1.0);
    assert_eq!(person["behind"].c, 0.0);
}

/// it should export only the requested frames of a session's committed animation
#[test]
fn export_session_frame_range() {
    let session = EditorSession::with_builtin(RigProfileId::VitposeBody17).unwrap();
    let opts = ExportOptions {
        frames: Some((5, 7)),
        out_path: "clip.mp4".to_string(),
        skeleton_only: false,
    };
    let req = export_session(&session, &OutputSettings::default(), &opts);
    let frames: Vec<i32> = req.frames.iter().map(|f| f.frame).collect();
    assert_eq!(frames, vec![5, 6, 7]);
    assert_eq!(req.bones.len(), 16);
    assert_eq!(req.frames[0].persons[0].len(), 17);
    assert!(req.frames[0].persons[0].values().all(|k| k.c == 1.0));
    // nose sits above the hips on screen
    let p = &req.frames[0].persons[0];
    assert!(p["nose"].y > p["midHip"].y);
}
