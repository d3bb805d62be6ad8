//! Pooled vector and matrix math for scripted avatar transforms.
//!
//! The crate exposes the math core (`math`), the pooling and transform-stack
//! helpers built around it (`cache`), an avatar rig loader with hierarchical
//! composition (`rig`, `pose`, `skeleton`) and the Lua surface scripts use to
//! drive it (`scripting`). Rendering stays with the host; `bridge` converts
//! results into the `f32` layouts it expects.

pub mod bridge;
pub mod cache;
pub mod config;
pub mod error;
pub mod math;
pub mod pose;
pub mod report;
pub mod rig;
pub mod scripting;
pub mod skeleton;

pub use bridge::BoneConstants;
pub use cache::{CacheStack, MathPools, Pool, PoolStats, Poolable, Pooled, Stackable};
pub use config::MathConfig;
pub use error::{MathError, MathResult};
pub use math::{Matrix, Matrix2, Matrix3, Matrix4, Vector, Vector2, Vector3, Vector4};
pub use pose::PoseModel;
pub use rig::{Bone, Rig, ScriptSource};
pub use scripting::{LuaScriptManager, ScriptReport};
pub use skeleton::{compose_bones, world_transforms, BoneTransform};
