//! Rig profile catalogue.
//!
//! The editor only needs "give me the profile for this id"; hosts can plug in their
//! own source. `BuiltinCatalog` serves the profiles embedded in this crate.

use tracing::warn;

use crate::profile::{RigProfile, RigProfileId};

pub trait RigCatalog {
    /// Look up a profile; `None` when the catalogue does not carry it.
    fn profile(&self, id: RigProfileId) -> Option<RigProfile>;
}

const VITPOSE_BODY_17: &str = include_str!("../profiles/vitpose_body_17.json");
const DWPOSE_BODY_25: &str = include_str!("../profiles/dwpose_body_25.json");

#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinCatalog;

impl BuiltinCatalog {
    fn source(id: RigProfileId) -> &'static str {
        match id {
            RigProfileId::VitposeBody17 => VITPOSE_BODY_17,
            RigProfileId::DwposeBody25 => DWPOSE_BODY_25,
        }
    }
}

impl RigCatalog for BuiltinCatalog {
    fn profile(&self, id: RigProfileId) -> Option<RigProfile> {
        match RigProfile::from_json(Some(id), Self::source(id)) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!("Builtin rig profile '{}' failed to load: {}", id, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_profiles_load() {
        let cat = BuiltinCatalog;
        let v = cat.profile(RigProfileId::VitposeBody17).unwrap();
        assert_eq!(v.definition.joints().len(), 17);
        assert_eq!(v.rest.len(), 17);
        assert_eq!(v.id, Some(RigProfileId::VitposeBody17));
        let groups: Vec<&str> = v.definition.groups().keys().map(String::as_str).collect();
        assert_eq!(groups[0], "Head");

        let d = cat.profile(RigProfileId::DwposeBody25).unwrap();
        assert_eq!(d.definition.joints().len(), 25);
        assert_eq!(d.definition.valid_bones().count(), d.definition.bones().len());
    }
}
