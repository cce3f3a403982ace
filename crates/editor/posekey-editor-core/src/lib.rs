//! posekey editor core
//!
//! One `EditorSession` owns everything an editing host touches: the active rig,
//! the animation state, selection, dirty set, uncommitted overlay, the gesture
//! state machine and playback. Sessions share nothing, so any number can coexist.

pub mod config;
pub mod error;
pub mod gesture;
pub mod playback;
pub mod selection;
pub mod session;
pub mod status;

pub use config::EditorConfig;
pub use error::EditError;
pub use gesture::{ActiveGesture, GestureKind, GestureState, GestureTarget, HandleSample};
pub use playback::{LoopMode, Playback, Timeline};
pub use selection::{ExternalTarget, Selection};
pub use session::EditorSession;
pub use status::{StatusLevel, StatusMessage};
