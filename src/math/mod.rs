//! Vector and matrix types exposed to avatar scripts.

pub mod matrix;
pub mod vector;

pub use matrix::{Cofactors, Matrix, Matrix2, Matrix3, Matrix4};
pub use vector::{Vector, Vector2, Vector3, Vector4};
