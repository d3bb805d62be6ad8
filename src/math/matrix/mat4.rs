use super::{zyx_rotation_block, Cofactors, Matrix, Matrix3};
use crate::math::Vector3;

fn cofactor(m: &[[f64; 4]; 4], row: usize, col: usize) -> f64 {
    let mut minor = [[0.0; 3]; 3];
    for (target, source) in (0..4).filter(|r| *r != row).enumerate() {
        for (slot, value) in (0..4)
            .filter(|c| *c != col)
            .map(|c| m[source][c])
            .enumerate()
        {
            minor[target][slot] = value;
        }
    }
    let det = Matrix3::determinant_of(&minor);
    if (row + col) % 2 == 0 {
        det
    } else {
        -det
    }
}

impl Cofactors<4> for Matrix<4> {
    fn determinant_of(m: &[[f64; 4]; 4]) -> f64 {
        (0..4).map(|col| m[0][col] * cofactor(m, 0, col)).sum()
    }

    fn adjugate_of(m: &[[f64; 4]; 4]) -> [[f64; 4]; 4] {
        let mut result = [[0.0; 4]; 4];
        for (row, entries) in result.iter_mut().enumerate() {
            for (col, value) in entries.iter_mut().enumerate() {
                *value = cofactor(m, col, row);
            }
        }
        result
    }
}

impl Matrix<4> {
    /// Components in column order.
    #[allow(clippy::too_many_arguments)]
    pub fn of(
        n11: f64,
        n21: f64,
        n31: f64,
        n41: f64,
        n12: f64,
        n22: f64,
        n32: f64,
        n42: f64,
        n13: f64,
        n23: f64,
        n33: f64,
        n43: f64,
        n14: f64,
        n24: f64,
        n34: f64,
        n44: f64,
    ) -> Self {
        Self::from_rows([
            [n11, n12, n13, n14],
            [n21, n22, n23, n24],
            [n31, n32, n33, n34],
            [n41, n42, n43, n44],
        ])
    }

    pub fn create_scale_matrix(x: f64, y: f64, z: f64) -> Self {
        Self::with_block3(&[[x, 0.0, 0.0], [0.0, y, 0.0], [0.0, 0.0, z]])
    }

    pub fn create_x_rotation_matrix(degrees: f64) -> Self {
        Matrix3::create_x_rotation_matrix(degrees).augmented()
    }

    pub fn create_y_rotation_matrix(degrees: f64) -> Self {
        Matrix3::create_y_rotation_matrix(degrees).augmented()
    }

    pub fn create_z_rotation_matrix(degrees: f64) -> Self {
        Matrix3::create_z_rotation_matrix(degrees).augmented()
    }

    /// Rotation applying X first, then Y, then Z.
    pub fn create_zyx_rotation_matrix(x: f64, y: f64, z: f64) -> Self {
        Self::with_block3(&zyx_rotation_block(x, y, z))
    }

    pub fn create_translation_matrix(x: f64, y: f64, z: f64) -> Self {
        let mut result = Self::identity();
        result.m[0][3] = x;
        result.m[1][3] = y;
        result.m[2][3] = z;
        result
    }

    pub fn scale(&mut self, x: f64, y: f64, z: f64) -> &mut Self {
        self.scale_rows(&[x, y, z]);
        self
    }

    pub fn translate(&mut self, x: f64, y: f64, z: f64) -> &mut Self {
        self.translate_rows(&[x, y, z]);
        self
    }

    pub fn rotate_x(&mut self, degrees: f64) -> &mut Self {
        self.rotate_plane(1, 2, degrees);
        self
    }

    pub fn rotate_y(&mut self, degrees: f64) -> &mut Self {
        self.rotate_plane(2, 0, degrees);
        self
    }

    pub fn rotate_z(&mut self, degrees: f64) -> &mut Self {
        self.rotate_plane(0, 1, degrees);
        self
    }

    /// Rotates about X, then Y, then Z.
    pub fn rotate_zyx(&mut self, x: f64, y: f64, z: f64) -> &mut Self {
        self.recombine_rows3(&zyx_rotation_block(x, y, z));
        self
    }

    /// Top-left 3×3 block.
    pub fn deaugmented(&self) -> Matrix3 {
        let m = &self.m;
        Matrix3::from_rows([
            [m[0][0], m[0][1], m[0][2]],
            [m[1][0], m[1][1], m[1][2]],
            [m[2][0], m[2][1], m[2][2]],
        ])
    }

    /// Transforms a point (`w = 1`), dropping the homogeneous component.
    pub fn apply_point(&self, point: &Vector3) -> Vector3 {
        self.apply(&point.augmented()).truncated()
    }

    /// Transforms a direction (`w = 0`), ignoring translation.
    pub fn apply_dir(&self, dir: &Vector3) -> Vector3 {
        self.deaugmented().apply(dir)
    }
}
