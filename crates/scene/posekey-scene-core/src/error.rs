use thiserror::Error;

use posekey_rig_core::RigError;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("scene document is not a JSON object")]
    NotAnObject,
    #[error("scene JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Rig(#[from] RigError),
}
