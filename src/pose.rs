use std::sync::Arc;

use parking_lot::RwLock;

use crate::math::Vector3;
use crate::rig::Bone;

/// Thread-safe pose shared between script threads and the host.
#[derive(Debug, Default)]
pub struct PoseModel {
    bones: Arc<RwLock<Vec<Bone>>>,
}

impl Clone for PoseModel {
    fn clone(&self) -> Self {
        Self {
            bones: Arc::clone(&self.bones),
        }
    }
}

impl PoseModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bones(bones: Vec<Bone>) -> Self {
        Self {
            bones: Arc::new(RwLock::new(bones)),
        }
    }

    /// Returns a snapshot of every bone, parents before children.
    pub fn all_bones(&self) -> Vec<Bone> {
        self.bones.read().clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.bones.read().iter().map(|bone| bone.name.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<Bone> {
        self.bones
            .read()
            .iter()
            .find(|bone| bone.name == name)
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bones.read().iter().any(|bone| bone.name == name)
    }

    /// Applies a mutation to the named bone.
    pub fn update<F, R>(&self, name: &str, mut updater: F) -> Option<R>
    where
        F: FnMut(&mut Bone) -> R,
    {
        let mut guard = self.bones.write();
        let bone = guard.iter_mut().find(|bone| bone.name == name)?;
        Some(updater(bone))
    }

    pub fn set_pivot(&self, name: &str, pivot: Vector3) -> bool {
        self.update(name, |bone| bone.pivot = pivot).is_some()
    }

    pub fn set_position(&self, name: &str, position: Vector3) -> bool {
        self.update(name, |bone| bone.position = position).is_some()
    }

    pub fn set_rotation(&self, name: &str, rotation: Vector3) -> bool {
        self.update(name, |bone| bone.rotation = rotation).is_some()
    }

    pub fn set_scale(&self, name: &str, scale: Vector3) -> bool {
        self.update(name, |bone| bone.scale = scale).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let pose = PoseModel::from_bones(vec![Bone::new("Head")]);
        let other = pose.clone();
        assert!(other.set_rotation("Head", Vector3::of(0.0, 90.0, 0.0)));
        assert_eq!(
            pose.get("Head").unwrap().rotation,
            Vector3::of(0.0, 90.0, 0.0)
        );
    }

    #[test]
    fn update_returns_false_for_missing_bone() {
        let pose = PoseModel::new();
        assert!(!pose.set_scale("Tail", Vector3::splat(2.0)));
        assert!(!pose.contains("Tail"));
        assert!(pose.names().is_empty());
    }
}
