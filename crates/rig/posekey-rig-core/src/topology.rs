//! Rig topology cache: group centroids, bone children and memoized descendant sets.
//!
//! Built once per profile from the definition and rest pose. Centroids always use
//! *rest* positions so group scaling has a fixed anchor. Descendant closures are
//! computed on first request and kept for the lifetime of the cache; a profile
//! switch drops the whole cache with the `Rig` that owns it.

use std::cell::RefCell;
use std::rc::Rc;

use hashbrown::{HashMap, HashSet};
use indexmap::IndexMap;

use posekey_animation_core::math::mean3;
use posekey_animation_core::{GroupId, JointId, Vec3};

use crate::profile::{RestPose, RigDefinition};

#[derive(Debug, Default)]
pub struct RigTopology {
    centroids: IndexMap<GroupId, Vec3>,
    children: HashMap<JointId, Vec<JointId>>,
    descendants: RefCell<HashMap<JointId, Rc<[JointId]>>>,
}

impl RigTopology {
    pub fn new(def: &RigDefinition, rest: &RestPose) -> Self {
        let mut centroids = IndexMap::with_capacity(def.groups().len());
        for (group, members) in def.groups() {
            let resolved = members
                .iter()
                .filter(|j| def.has_joint(j))
                .filter_map(|j| rest.get(j));
            if let Some(c) = mean3(resolved) {
                centroids.insert(group.clone(), c);
            }
        }

        let mut children: HashMap<JointId, Vec<JointId>> = HashMap::new();
        for bone in def.valid_bones() {
            let list = children.entry(bone.parent.clone()).or_default();
            if !list.contains(&bone.child) {
                list.push(bone.child.clone());
            }
        }

        Self {
            centroids,
            children,
            descendants: RefCell::new(HashMap::new()),
        }
    }

    /// Rest centroid per group, in declaration order. Groups with no resolvable
    /// members are absent.
    pub fn group_centroids(&self) -> &IndexMap<GroupId, Vec3> {
        &self.centroids
    }

    #[inline]
    pub fn centroid(&self, group: &str) -> Option<Vec3> {
        self.centroids.get(group).copied()
    }

    /// Direct bone children of `joint` (empty for leaves and unknown ids).
    pub fn children(&self, joint: &str) -> &[JointId] {
        self.children.get(joint).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Transitive children of `joint`, excluding `joint` itself, in DFS pre-order.
    pub fn descendants(&self, joint: &str) -> Rc<[JointId]> {
        if let Some(hit) = self.descendants.borrow().get(joint) {
            return Rc::clone(hit);
        }
        let computed: Rc<[JointId]> = self.walk(joint).into();
        self.descendants
            .borrow_mut()
            .insert(joint.to_string(), Rc::clone(&computed));
        computed
    }

    /// Number of memoized closures (diagnostics, tests).
    pub fn cached_descendant_count(&self) -> usize {
        self.descendants.borrow().len()
    }

    fn walk(&self, root: &str) -> Vec<JointId> {
        let mut out = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(root);
        let mut stack: Vec<&str> = self.children(root).iter().rev().map(String::as_str).collect();
        while let Some(j) = stack.pop() {
            // cycles in malformed bone lists stop here
            if !visited.insert(j) {
                continue;
            }
            out.push(j.to_string());
            stack.extend(self.children(j).iter().rev().map(String::as_str));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{Bone, JointInfo};

    fn def(joints: &[&str], bones: &[(&str, &str)], groups: &[(&str, &[&str])]) -> (RigDefinition, RestPose) {
        let rest = RestPose::new(
            joints
                .iter()
                .enumerate()
                .map(|(i, j)| (j.to_string(), [i as f32, 0.0, 0.0]))
                .collect(),
        );
        let d = RigDefinition::new(
            joints
                .iter()
                .map(|j| JointInfo { id: j.to_string(), name: j.to_string() })
                .collect(),
            bones
                .iter()
                .map(|(p, c)| Bone { parent: p.to_string(), child: c.to_string() })
                .collect(),
            groups
                .iter()
                .map(|(g, m)| (g.to_string(), m.iter().map(|s| s.to_string()).collect()))
                .collect(),
            &rest,
        )
        .unwrap();
        (d, rest)
    }

    #[test]
    fn centroids_skip_empty_groups() {
        let (d, r) = def(&["a", "b", "c"], &[], &[("AB", &["a", "b"]), ("Ghost", &["zz"])]);
        let t = RigTopology::new(&d, &r);
        assert_eq!(t.centroid("AB"), Some([0.5, 0.0, 0.0]));
        assert!(t.centroid("Ghost").is_none());
        assert_eq!(t.group_centroids().len(), 1);
    }

    #[test]
    fn descendants_are_memoized_and_exclude_self() {
        let (d, r) = def(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("b", "c"), ("a", "d"), ("c", "ghost")],
            &[],
        );
        let t = RigTopology::new(&d, &r);
        assert_eq!(t.children("a"), &["b".to_string(), "d".to_string()]);
        let first = t.descendants("a");
        assert_eq!(&*first, &["b".to_string(), "c".to_string(), "d".to_string()]);
        assert_eq!(t.cached_descendant_count(), 1);
        let again = t.descendants("a");
        assert!(Rc::ptr_eq(&first, &again));
        assert!(t.descendants("c").is_empty());
    }

    #[test]
    fn cycles_terminate() {
        let (d, r) = def(&["a", "b"], &[("a", "b"), ("b", "a")], &[]);
        let t = RigTopology::new(&d, &r);
        assert_eq!(&*t.descendants("a"), &["b".to_string()]);
    }
}
