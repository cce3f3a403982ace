//! posekey scene core
//!
//! Everything that crosses the editor boundary: the persisted scene document, the
//! pose-estimation service wire types with their ingest into joint keys, and the
//! projected skeleton request handed to the external renderer.

pub mod document;
pub mod error;
pub mod export;
pub mod ingest;
pub mod service;

pub use document::{
    load_scene, load_scene_value, Guides, LoadedScene, OutputSettings, SceneDocument, SceneMeta,
};
pub use error::SceneError;
pub use export::{export, export_session, ExportOptions};
pub use ingest::{ingest, IngestOptions, IngestReport};
pub use service::{
    ExportRequest, Frame2D, Frame3D, Keypoint2D, Keypoint3D, ProcessMeta, ProcessResult,
    ProcessorOptions,
};
