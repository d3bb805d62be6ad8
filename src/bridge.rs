//! Conversions to and from the host renderer's `f32` representation.
//!
//! Float buffers are laid out column by column (`n11, n21, n31, n12, ...`),
//! the same order as [`glam::Mat3::to_cols_array`] and the component lists
//! accepted by `Matrix::of`.

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

use crate::math::{Matrix, Matrix3, Matrix4, Vector2, Vector3, Vector4};

/// Per-bone uniform block handed to the host renderer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct BoneConstants {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 3],
}

impl BoneConstants {
    /// Builds the model matrix and its inverse-transpose normal matrix.
    pub fn from_world(world: &Matrix4) -> Self {
        let normal = world.deaugmented().inverted().transposed();
        Self {
            model: to_mat4(world).to_cols_array_2d(),
            normal: mat3_to_3x4(&normal),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

fn mat3_to_3x4(matrix: &Matrix3) -> [[f32; 4]; 3] {
    let cols = to_float_buffer(matrix);
    [
        [cols[0], cols[1], cols[2], 0.0],
        [cols[3], cols[4], cols[5], 0.0],
        [cols[6], cols[7], cols[8], 0.0],
    ]
}

/// Narrows every entry to `f32`, column by column.
pub fn to_float_buffer<const N: usize>(matrix: &Matrix<N>) -> Vec<f32> {
    matrix.to_cols_vec().into_iter().map(|value| value as f32).collect()
}

/// Reads a column-ordered `f32` buffer. Returns `None` if the length is not
/// `N * N`.
pub fn from_float_buffer<const N: usize>(buffer: &[f32]) -> Option<Matrix<N>> {
    let values: Vec<f64> = buffer.iter().map(|value| f64::from(*value)).collect();
    Matrix::from_cols_slice(&values).ok()
}

pub fn to_mat3(matrix: &Matrix3) -> Mat3 {
    let cols = to_float_buffer(matrix);
    Mat3::from_cols_slice(&cols)
}

pub fn from_mat3(matrix: &Mat3) -> Matrix3 {
    // glam columns become rows, then swap back
    Matrix3::from_rows(matrix.to_cols_array_2d().map(|col| col.map(f64::from))).transposed()
}

pub fn to_mat4(matrix: &Matrix4) -> Mat4 {
    let cols = to_float_buffer(matrix);
    Mat4::from_cols_slice(&cols)
}

pub fn from_mat4(matrix: &Mat4) -> Matrix4 {
    Matrix4::from_rows(matrix.to_cols_array_2d().map(|col| col.map(f64::from))).transposed()
}

pub fn to_vec2(v: &Vector2) -> Vec2 {
    Vec2::new(v.x() as f32, v.y() as f32)
}

pub fn to_vec3(v: &Vector3) -> Vec3 {
    Vec3::new(v.x() as f32, v.y() as f32, v.z() as f32)
}

pub fn to_vec4(v: &Vector4) -> Vec4 {
    Vec4::new(v.x() as f32, v.y() as f32, v.z() as f32, v.w() as f32)
}

pub fn from_vec3(v: Vec3) -> Vector3 {
    Vector3::of(f64::from(v.x), f64::from(v.y), f64::from(v.z))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_buffer_is_column_ordered() {
        let m = Matrix3::of(1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0);
        assert_eq!(
            to_float_buffer(&m),
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]
        );
        assert_eq!(to_mat3(&m).to_cols_array(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        assert_eq!(from_mat3(&to_mat3(&m)), m);
    }

    #[test]
    fn glam_agrees_on_translation_layout() {
        let m = Matrix4::create_translation_matrix(1.0, 2.0, 3.0);
        let host = to_mat4(&m);
        assert_eq!(host, Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(from_mat4(&host), m);
        assert_eq!(
            to_vec3(&m.apply_point(&Vector3::zero())),
            host.transform_point3(Vec3::ZERO)
        );
    }

    #[test]
    fn float_buffer_length_is_checked() {
        assert!(from_float_buffer::<3>(&[0.0; 8]).is_none());
        let m: Matrix4 = from_float_buffer(&[
            1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
        ])
        .unwrap();
        assert_eq!(m, Matrix4::identity());
    }

    #[test]
    fn bone_constants_use_inverse_transpose_normals() {
        let world = Matrix4::create_scale_matrix(2.0, 4.0, 8.0);
        let constants = BoneConstants::from_world(&world);
        assert_eq!(constants.model[1][1], 4.0);
        assert_eq!(constants.normal[0], [0.5, 0.0, 0.0, 0.0]);
        assert_eq!(constants.normal[2], [0.0, 0.0, 0.125, 0.0]);
        assert_eq!(constants.as_bytes().len(), 28 * 4);
    }

    #[test]
    fn vectors_narrow_componentwise() {
        assert_eq!(from_vec3(to_vec3(&Vector3::of(1.0, 2.0, 3.0))), Vector3::of(1.0, 2.0, 3.0));
        assert_eq!(to_vec2(&Vector2::of(0.5, -1.0)), Vec2::new(0.5, -1.0));
        assert_eq!(to_vec4(&Vector4::of(1.0, 2.0, 3.0, 1.0)), Vec4::new(1.0, 2.0, 3.0, 1.0));
    }
}
