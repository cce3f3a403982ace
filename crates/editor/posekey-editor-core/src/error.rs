use thiserror::Error;

use posekey_rig_core::RigError;

use crate::gesture::GestureKind;

/// Rejected editor operations. None of these end the session; each is also queued
/// as a status message for the host.
#[derive(Debug, Error)]
pub enum EditError {
    #[error("a {0} gesture is already active")]
    GestureActive(GestureKind),
    #[error("no gesture is active")]
    NoActiveGesture,
    #[error("nothing selected to manipulate")]
    NoTargets,
    #[error("selection has no resolvable pivot")]
    NoPivot,
    #[error("depth nudge needs exactly one selected joint")]
    NotALoneJoint,
    #[error("handle sample does not fit a {0} gesture")]
    HandleMismatch(GestureKind),
    #[error("gesture aborted: its targets are gone")]
    TargetsLost,
    #[error("unknown joint '{0}'")]
    UnknownJoint(String),
    #[error("unknown group '{0}'")]
    UnknownGroup(String),
    #[error(transparent)]
    Rig(#[from] RigError),
}
