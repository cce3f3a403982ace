//! Rig profile data: definition (joints, bones, groups, rest lengths) and rest pose.
//!
//! Both are immutable once built; a profile switch replaces them wholesale.

use std::fmt;

use hashbrown::{HashMap, HashSet};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use posekey_animation_core::math::distance3;
use posekey_animation_core::{GroupId, JointId, Vec3};

use crate::error::RigError;

/// Catalogue identifier of a rig profile.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RigProfileId {
    #[default]
    #[serde(rename = "vitpose_body_17")]
    VitposeBody17,
    #[serde(rename = "dwpose_body_25")]
    DwposeBody25,
}

impl RigProfileId {
    pub const ALL: [RigProfileId; 2] = [RigProfileId::VitposeBody17, RigProfileId::DwposeBody25];

    pub fn as_str(&self) -> &'static str {
        match self {
            RigProfileId::VitposeBody17 => "vitpose_body_17",
            RigProfileId::DwposeBody25 => "dwpose_body_25",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.as_str() == s)
    }
}

impl fmt::Display for RigProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JointInfo {
    pub id: JointId,
    pub name: String,
}

/// Directed parent -> child bone.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Bone {
    pub parent: JointId,
    pub child: JointId,
}

/// Joint id -> rest position. Joints missing here never appear in an evaluated pose.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RestPose {
    positions: HashMap<JointId, Vec3>,
}

impl RestPose {
    pub fn new(positions: HashMap<JointId, Vec3>) -> Self {
        Self { positions }
    }

    #[inline]
    pub fn get(&self, joint: &str) -> Option<Vec3> {
        self.positions.get(joint).copied()
    }

    #[inline]
    pub fn contains(&self, joint: &str) -> bool {
        self.positions.contains_key(joint)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Axis-aligned bounds `(min, max)` over all rest positions.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut it = self.positions.values();
        let first = *it.next()?;
        let (mut min, mut max) = (first, first);
        for p in it {
            for i in 0..3 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }
        Some((min, max))
    }
}

/// Immutable per-profile structure.
#[derive(Clone, Debug, PartialEq)]
pub struct RigDefinition {
    joints: Vec<JointInfo>,
    joint_index: HashMap<JointId, usize>,
    bones: Vec<Bone>,
    groups: IndexMap<GroupId, Vec<JointId>>,
    rest_lengths: HashMap<(JointId, JointId), f32>,
}

impl RigDefinition {
    /// Build a definition. Rest lengths are measured for bones whose endpoints both
    /// have rest positions; other bones are kept but carry no length.
    pub fn new(
        joints: Vec<JointInfo>,
        bones: Vec<Bone>,
        groups: IndexMap<GroupId, Vec<JointId>>,
        rest: &RestPose,
    ) -> Result<Self, RigError> {
        if joints.is_empty() {
            return Err(RigError::Empty);
        }
        let mut joint_index = HashMap::with_capacity(joints.len());
        for (i, j) in joints.iter().enumerate() {
            if joint_index.insert(j.id.clone(), i).is_some() {
                return Err(RigError::DuplicateJoint(j.id.clone()));
            }
        }
        let mut rest_lengths = HashMap::new();
        for b in &bones {
            if let (Some(a), Some(c)) = (rest.get(&b.parent), rest.get(&b.child)) {
                rest_lengths.insert((b.parent.clone(), b.child.clone()), distance3(a, c));
            }
        }
        Ok(Self {
            joints,
            joint_index,
            bones,
            groups,
            rest_lengths,
        })
    }

    /// Joints in declaration order.
    pub fn joints(&self) -> &[JointInfo] {
        &self.joints
    }

    pub fn joint_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.joints.iter().map(|j| j.id.as_str())
    }

    #[inline]
    pub fn has_joint(&self, joint: &str) -> bool {
        self.joint_index.contains_key(joint)
    }

    pub fn joint_name(&self, joint: &str) -> Option<&str> {
        self.joint_index
            .get(joint)
            .map(|&i| self.joints[i].name.as_str())
    }

    /// Every bone as declared, including ones that reference unknown joints.
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    /// Bones whose endpoints are both known joints.
    pub fn valid_bones(&self) -> impl Iterator<Item = &Bone> + '_ {
        self.bones
            .iter()
            .filter(|b| self.has_joint(&b.parent) && self.has_joint(&b.child))
    }

    /// Groups in declaration order.
    pub fn groups(&self) -> &IndexMap<GroupId, Vec<JointId>> {
        &self.groups
    }

    pub fn group_members(&self, group: &str) -> Option<&[JointId]> {
        self.groups.get(group).map(Vec::as_slice)
    }

    pub fn rest_length(&self, parent: &str, child: &str) -> Option<f32> {
        self.rest_lengths
            .get(&(parent.to_string(), child.to_string()))
            .copied()
    }
}

/// A complete profile: definition plus rest pose.
#[derive(Clone, Debug, PartialEq)]
pub struct RigProfile {
    /// Catalogue id; `None` for a custom definition loaded from a document.
    pub id: Option<RigProfileId>,
    pub definition: RigDefinition,
    pub rest: RestPose,
}

impl RigProfile {
    pub fn from_document(id: Option<RigProfileId>, doc: &RigDefDocument) -> Result<Self, RigError> {
        let rest = RestPose::new(
            doc.default_rest
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
        );
        let joints = doc
            .joints
            .iter()
            .map(|j| match j {
                JointEntry::Id(id) => JointInfo {
                    id: id.clone(),
                    name: id.clone(),
                },
                JointEntry::Detailed(info) => info.clone(),
            })
            .collect();
        let bones = doc
            .bones
            .iter()
            .map(|[p, c]| Bone {
                parent: p.clone(),
                child: c.clone(),
            })
            .collect();
        let definition = RigDefinition::new(joints, bones, doc.groups.clone(), &rest)?;
        Ok(Self {
            id,
            definition,
            rest,
        })
    }

    pub fn from_json(id: Option<RigProfileId>, json: &str) -> Result<Self, RigError> {
        let doc: RigDefDocument =
            serde_json::from_str(json).map_err(|e| RigError::Parse(e.to_string()))?;
        Self::from_document(id, &doc)
    }

    /// Serializable form, rest positions listed in joint order.
    pub fn to_document(&self) -> RigDefDocument {
        let mut default_rest = IndexMap::new();
        for j in self.definition.joints() {
            if let Some(p) = self.rest.get(&j.id) {
                default_rest.insert(j.id.clone(), p);
            }
        }
        RigDefDocument {
            joints: self
                .definition
                .joints()
                .iter()
                .cloned()
                .map(JointEntry::Detailed)
                .collect(),
            bones: self
                .definition
                .bones()
                .iter()
                .map(|b| [b.parent.clone(), b.child.clone()])
                .collect(),
            default_rest,
            groups: self.definition.groups().clone(),
        }
    }

    /// Ids of all joints that have a rest position.
    pub fn posed_joints(&self) -> HashSet<&str> {
        self.definition
            .joint_ids()
            .filter(|j| self.rest.contains(j))
            .collect()
    }
}

/// Joint entry in JSON: either a bare id or `{ id, name }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JointEntry {
    Id(JointId),
    Detailed(JointInfo),
}

/// JSON shape of a rig definition (`rigDef` in the scene document).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RigDefDocument {
    #[serde(default)]
    pub joints: Vec<JointEntry>,
    #[serde(default)]
    pub bones: Vec<[JointId; 2]>,
    #[serde(default)]
    pub default_rest: IndexMap<JointId, Vec3>,
    #[serde(default)]
    pub groups: IndexMap<GroupId, Vec<JointId>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> RigDefDocument {
        serde_json::from_value(serde_json::json!({
            "joints": ["a", { "id": "b", "name": "Bee" }, "c"],
            "bones": [["a", "b"], ["b", "c"], ["c", "ghost"]],
            "defaultRest": { "a": [0.0, 0.0, 0.0], "b": [0.0, 3.0, 4.0] },
            "groups": { "G": ["a", "b"] }
        }))
        .unwrap()
    }

    #[test]
    fn builds_from_mixed_joint_entries() {
        let p = RigProfile::from_document(None, &doc()).unwrap();
        assert_eq!(p.definition.joints().len(), 3);
        assert_eq!(p.definition.joint_name("a"), Some("a"));
        assert_eq!(p.definition.joint_name("b"), Some("Bee"));
        assert_eq!(p.definition.rest_length("a", "b"), Some(5.0));
        // c has no rest position, ghost is unknown
        assert_eq!(p.definition.rest_length("b", "c"), None);
        assert_eq!(p.definition.valid_bones().count(), 2);
        assert_eq!(p.posed_joints().len(), 2);
    }

    #[test]
    fn rejects_duplicates_and_empty() {
        let mut d = doc();
        d.joints.push(JointEntry::Id("a".into()));
        assert!(matches!(
            RigProfile::from_document(None, &d),
            Err(RigError::DuplicateJoint(id)) if id == "a"
        ));
        assert!(matches!(
            RigProfile::from_document(None, &RigDefDocument::default()),
            Err(RigError::Empty)
        ));
    }

    #[test]
    fn profile_ids_round_trip() {
        for id in RigProfileId::ALL {
            assert_eq!(RigProfileId::parse(id.as_str()), Some(id));
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(json, format!("\"{}\"", id.as_str()));
        }
        assert_eq!(RigProfileId::parse("vitpose_wholebody_133"), None);
    }
}
