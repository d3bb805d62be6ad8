//! Pooling and transform-stack helpers.
//!
//! Script calls churn through short-lived vectors and matrices. Rather than a
//! process-wide registry, every script context owns a [`MathPools`] and hands
//! it to whatever needs pooled instances.

mod pool;
mod stack;

pub use pool::{Pool, PoolStats, Poolable};
pub use stack::{CacheStack, Stackable};

use log::debug;

use crate::config::MathConfig;
use crate::math::{Matrix2, Matrix3, Matrix4, Vector2, Vector3, Vector4};

/// Selects the pool that stores a given type inside [`MathPools`].
pub trait Pooled: Poolable {
    fn pool(pools: &mut MathPools) -> &mut Pool<Self>;
}

/// Per-context allocator holding one bounded pool per math type.
#[derive(Debug)]
pub struct MathPools {
    vec2: Pool<Vector2>,
    vec3: Pool<Vector3>,
    vec4: Pool<Vector4>,
    mat2: Pool<Matrix2>,
    mat3: Pool<Matrix3>,
    mat4: Pool<Matrix4>,
}

impl Default for MathPools {
    fn default() -> Self {
        Self::from_config(&MathConfig::default())
    }
}

impl MathPools {
    pub fn new(capacity: usize) -> Self {
        Self {
            vec2: Pool::new(capacity),
            vec3: Pool::new(capacity),
            vec4: Pool::new(capacity),
            mat2: Pool::new(capacity),
            mat3: Pool::new(capacity),
            mat4: Pool::new(capacity),
        }
    }

    pub fn from_config(config: &MathConfig) -> Self {
        Self::new(config.pool_capacity)
    }

    pub fn pool_mut<T: Pooled>(&mut self) -> &mut Pool<T> {
        T::pool(self)
    }

    pub fn fresh<T: Pooled>(&mut self) -> T {
        T::pool(self).get_fresh()
    }

    /// Checks out an instance and overwrites it with `source`.
    pub fn fresh_copy<T: Pooled + Stackable>(&mut self, source: &T) -> T {
        let mut value = self.fresh::<T>();
        value.copy_from(source);
        value
    }

    pub fn release<T: Pooled>(&mut self, value: T) -> bool {
        T::pool(self).release(value)
    }

    /// Number of instances currently parked across all pools.
    pub fn free_total(&self) -> usize {
        self.vec2.free_count()
            + self.vec3.free_count()
            + self.vec4.free_count()
            + self.mat2.free_count()
            + self.mat3.free_count()
            + self.mat4.free_count()
    }

    pub fn stats(&self) -> [(&'static str, PoolStats); 6] {
        [
            ("vec2", self.vec2.stats()),
            ("vec3", self.vec3.stats()),
            ("vec4", self.vec4.stats()),
            ("mat2", self.mat2.stats()),
            ("mat3", self.mat3.stats()),
            ("mat4", self.mat4.stats()),
        ]
    }

    /// Empties every pool. Call between independent script executions.
    pub fn reset(&mut self) {
        for (name, stats) in self.stats() {
            if stats.created > 0 {
                debug!(
                    "{name} pool: created={} recycled={} discarded={}",
                    stats.created, stats.recycled, stats.discarded
                );
            }
        }
        self.vec2.clear();
        self.vec3.clear();
        self.vec4.clear();
        self.mat2.clear();
        self.mat3.clear();
        self.mat4.clear();
    }
}

impl Pooled for Vector2 {
    fn pool(pools: &mut MathPools) -> &mut Pool<Self> {
        &mut pools.vec2
    }
}

impl Pooled for Vector3 {
    fn pool(pools: &mut MathPools) -> &mut Pool<Self> {
        &mut pools.vec3
    }
}

impl Pooled for Vector4 {
    fn pool(pools: &mut MathPools) -> &mut Pool<Self> {
        &mut pools.vec4
    }
}

impl Pooled for Matrix2 {
    fn pool(pools: &mut MathPools) -> &mut Pool<Self> {
        &mut pools.mat2
    }
}

impl Pooled for Matrix3 {
    fn pool(pools: &mut MathPools) -> &mut Pool<Self> {
        &mut pools.mat3
    }
}

impl Pooled for Matrix4 {
    fn pool(pools: &mut MathPools) -> &mut Pool<Self> {
        &mut pools.mat4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_matrices_are_identity_even_when_recycled() {
        let mut pools = MathPools::new(4);
        let mut matrix: Matrix4 = pools.fresh();
        matrix.scale(2.0, 3.0, 4.0);
        matrix.invert();
        pools.release(matrix);

        let matrix: Matrix4 = pools.fresh();
        assert_eq!(matrix, Matrix4::identity());
        assert!(!matrix.has_cached_inverse());
        assert_eq!(pools.pool_mut::<Matrix4>().stats().recycled, 1);
    }

    #[test]
    fn fresh_copy_duplicates_source() {
        let mut pools = MathPools::default();
        let source = Vector3::of(1.0, 2.0, 3.0);
        let copy: Vector3 = pools.fresh_copy(&source);
        assert_eq!(copy, source);
    }

    #[test]
    fn reset_clears_every_pool() {
        let mut pools = MathPools::new(8);
        let v: Vector2 = pools.fresh();
        let m: Matrix3 = pools.fresh();
        pools.release(v);
        pools.release(m);
        assert_eq!(pools.free_total(), 2);
        pools.reset();
        assert_eq!(pools.free_total(), 0);
        assert!(pools.stats().iter().all(|(_, stats)| stats.created == 0));
    }

    #[test]
    fn pools_are_sized_from_config() {
        let config = MathConfig {
            pool_capacity: 1,
            ..MathConfig::default()
        };
        let mut pools = MathPools::from_config(&config);
        assert!(pools.release(Matrix2::identity()));
        assert!(!pools.release(Matrix2::identity()));
    }
}
