use thiserror::Error;

/// Errors produced while building a rig profile from its JSON definition.
#[derive(Debug, Error)]
pub enum RigError {
    #[error("rig definition parse error: {0}")]
    Parse(String),
    #[error("rig definition has no joints")]
    Empty,
    #[error("duplicate joint id '{0}' in rig definition")]
    DuplicateJoint(String),
    #[error("unknown rig profile '{0}'")]
    UnknownProfile(String),
}
