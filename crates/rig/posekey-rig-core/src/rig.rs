use tracing::info;

use posekey_animation_core::AnimationState;

use crate::catalog::RigCatalog;
use crate::error::RigError;
use crate::profile::{RestPose, RigDefinition, RigProfile, RigProfileId};
use crate::topology::RigTopology;

/// Definition, rest pose and topology cache for one profile, built together.
///
/// Replacing a `Rig` is the only way to change any of the three, so the cache
/// can never describe a different skeleton than the definition next to it.
#[derive(Debug)]
pub struct Rig {
    profile: RigProfile,
    topology: RigTopology,
}

impl Rig {
    pub fn new(profile: RigProfile) -> Self {
        let topology = RigTopology::new(&profile.definition, &profile.rest);
        Self { profile, topology }
    }

    pub fn from_catalog(catalog: &dyn RigCatalog, id: RigProfileId) -> Result<Self, RigError> {
        let profile = catalog
            .profile(id)
            .ok_or_else(|| RigError::UnknownProfile(id.to_string()))?;
        info!(
            "Rig '{}' loaded: {} joints, {} groups",
            id,
            profile.definition.joints().len(),
            profile.definition.groups().len()
        );
        Ok(Self::new(profile))
    }

    pub fn profile(&self) -> &RigProfile {
        &self.profile
    }

    pub fn id(&self) -> Option<RigProfileId> {
        self.profile.id
    }

    #[inline]
    pub fn definition(&self) -> &RigDefinition {
        &self.profile.definition
    }

    #[inline]
    pub fn rest(&self) -> &RestPose {
        &self.profile.rest
    }

    #[inline]
    pub fn topology(&self) -> &RigTopology {
        &self.topology
    }

    /// Empty animation state with a scale track per group of this rig.
    pub fn default_state(&self) -> AnimationState {
        AnimationState::with_groups(self.definition().groups().keys().cloned())
    }
}
