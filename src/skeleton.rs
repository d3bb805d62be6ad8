//! Hierarchical bone composition over a pooled transform stack.

use std::collections::{HashMap, HashSet};

use log::warn;

use crate::cache::{CacheStack, MathPools, Pool};
use crate::error::{MathError, MathResult};
use crate::math::Matrix4;
use crate::pose::PoseModel;
use crate::rig::Bone;

/// World transform of one bone.
#[derive(Debug, Clone, PartialEq)]
pub struct BoneTransform {
    pub name: String,
    pub world: Matrix4,
}

/// Computes world matrices for every bone of the shared pose.
///
/// Works on a snapshot, so scripts are not blocked while composing.
pub fn world_transforms(
    pose: &PoseModel,
    pools: &mut MathPools,
) -> MathResult<Vec<BoneTransform>> {
    compose_bones(&pose.all_bones(), pools)
}

/// Computes world matrices for every bone, parents before children.
///
/// A bone's world matrix is its parent's world matrix right-multiplied by its
/// own local matrix. Bones naming an unknown parent are treated as roots, as
/// are bones caught in a parent cycle. Duplicate names are rejected.
pub fn compose_bones(bones: &[Bone], pools: &mut MathPools) -> MathResult<Vec<BoneTransform>> {
    let mut seen = HashSet::with_capacity(bones.len());
    for bone in bones {
        if !seen.insert(bone.name.as_str()) {
            return Err(MathError::DuplicateBone {
                name: bone.name.clone(),
            });
        }
    }

    let mut children: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut roots = Vec::new();
    for (index, bone) in bones.iter().enumerate() {
        match bone.parent.as_deref() {
            Some(parent) if seen.contains(parent) => {
                children.entry(parent).or_default().push(index);
            }
            Some(parent) => {
                warn!("bone {} names unknown parent {parent}", bone.name);
                roots.push(index);
            }
            None => roots.push(index),
        }
    }

    let pool = pools.pool_mut::<Matrix4>();
    let mut walk = Walk {
        bones,
        children: &children,
        visited: vec![false; bones.len()],
        stack: CacheStack::new(),
        out: Vec::with_capacity(bones.len()),
    };
    for root in roots {
        walk.visit(root, pool)?;
    }
    // anything left over hangs off a parent cycle
    for index in 0..bones.len() {
        if !walk.visited[index] {
            warn!(
                "bone {} is part of a parent cycle, composing it as a root",
                bones[index].name
            );
            walk.visit(index, pool)?;
        }
    }
    debug_assert!(walk.stack.is_empty());
    Ok(walk.out)
}

struct Walk<'a> {
    bones: &'a [Bone],
    children: &'a HashMap<&'a str, Vec<usize>>,
    visited: Vec<bool>,
    stack: CacheStack<Matrix4>,
    out: Vec<BoneTransform>,
}

impl Walk<'_> {
    fn visit(&mut self, index: usize, pool: &mut Pool<Matrix4>) -> MathResult<()> {
        self.visited[index] = true;
        let (bones, children) = (self.bones, self.children);
        let bone = &bones[index];
        self.stack.push(pool);

        let mut local = pool.get_fresh();
        bone.write_local_matrix(&mut local);
        let composed = self.stack.modify(&local);
        pool.release(local);
        composed?;

        if let Some(world) = self.stack.peek() {
            self.out.push(BoneTransform {
                name: bone.name.clone(),
                world: world.copy(),
            });
        }
        if let Some(kids) = children.get(bone.name.as_str()) {
            for &child in kids {
                if !self.visited[child] {
                    self.visit(child, pool)?;
                }
            }
        }
        self.stack.try_pop(pool)
    }
}
