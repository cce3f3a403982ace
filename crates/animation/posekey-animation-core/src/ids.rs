//! Identifiers shared across the workspace.
//!
//! Joint and group ids are the small string keys used by rig profiles and the
//! persisted scene document (e.g. `"leftElbow"`, `"Head"`).

/// Joint identifier (rig-profile scoped).
pub type JointId = String;

/// Group identifier (rig-profile scoped).
pub type GroupId = String;
