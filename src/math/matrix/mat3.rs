use super::{zyx_rotation_block, Cofactors, Matrix, Matrix2, Matrix4};

impl Cofactors<3> for Matrix<3> {
    fn determinant_of(m: &[[f64; 3]; 3]) -> f64 {
        let sub11 = m[1][1] * m[2][2] - m[1][2] * m[2][1];
        let sub12 = m[1][0] * m[2][2] - m[1][2] * m[2][0];
        let sub13 = m[1][0] * m[2][1] - m[1][1] * m[2][0];
        m[0][0] * sub11 - m[0][1] * sub12 + m[0][2] * sub13
    }

    fn adjugate_of(m: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
        let sub11 = m[1][1] * m[2][2] - m[1][2] * m[2][1];
        let sub12 = m[1][0] * m[2][2] - m[1][2] * m[2][0];
        let sub13 = m[1][0] * m[2][1] - m[1][1] * m[2][0];
        let sub21 = m[0][1] * m[2][2] - m[0][2] * m[2][1];
        let sub22 = m[0][0] * m[2][2] - m[0][2] * m[2][0];
        let sub23 = m[0][0] * m[2][1] - m[0][1] * m[2][0];
        let sub31 = m[0][1] * m[1][2] - m[0][2] * m[1][1];
        let sub32 = m[0][0] * m[1][2] - m[0][2] * m[1][0];
        let sub33 = m[0][0] * m[1][1] - m[0][1] * m[1][0];
        [
            [sub11, -sub21, sub31],
            [-sub12, sub22, -sub32],
            [sub13, -sub23, sub33],
        ]
    }
}

impl Matrix<3> {
    /// Components in column order.
    #[allow(clippy::too_many_arguments)]
    pub fn of(
        n11: f64,
        n21: f64,
        n31: f64,
        n12: f64,
        n22: f64,
        n32: f64,
        n13: f64,
        n23: f64,
        n33: f64,
    ) -> Self {
        Self::from_rows([[n11, n12, n13], [n21, n22, n23], [n31, n32, n33]])
    }

    pub fn create_scale_matrix(x: f64, y: f64, z: f64) -> Self {
        Self::from_rows([[x, 0.0, 0.0], [0.0, y, 0.0], [0.0, 0.0, z]])
    }

    pub fn create_x_rotation_matrix(degrees: f64) -> Self {
        let (s, c) = degrees.to_radians().sin_cos();
        Self::from_rows([[1.0, 0.0, 0.0], [0.0, c, -s], [0.0, s, c]])
    }

    pub fn create_y_rotation_matrix(degrees: f64) -> Self {
        let (s, c) = degrees.to_radians().sin_cos();
        Self::from_rows([[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]])
    }

    pub fn create_z_rotation_matrix(degrees: f64) -> Self {
        let (s, c) = degrees.to_radians().sin_cos();
        Self::from_rows([[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]])
    }

    /// Rotation applying X first, then Y, then Z.
    pub fn create_zyx_rotation_matrix(x: f64, y: f64, z: f64) -> Self {
        Self::from_rows(zyx_rotation_block(x, y, z))
    }

    /// 2D homogeneous translation.
    pub fn create_translation_matrix(x: f64, y: f64) -> Self {
        Self::from_rows([[1.0, 0.0, x], [0.0, 1.0, y], [0.0, 0.0, 1.0]])
    }

    pub fn scale(&mut self, x: f64, y: f64, z: f64) -> &mut Self {
        self.scale_rows(&[x, y, z]);
        self
    }

    pub fn translate(&mut self, x: f64, y: f64) -> &mut Self {
        self.translate_rows(&[x, y]);
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

    /// Embeds this matrix in the top-left of a 4×4 identity.
    pub fn augmented(&self) -> Matrix4 {
        Matrix4::with_block3(&self.m)
    }

    /// Top-left 2×2 block.
    pub fn deaugmented(&self) -> Matrix2 {
        let m = &self.m;
        Matrix2::from_rows([[m[0][0], m[0][1]], [m[1][0], m[1][1]]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Vector2, Vector3};

    type Matrix3 = Matrix<3>;

    fn sample() -> Matrix3 {
        Matrix3::of(1.0, -2.0, 0.5, 3.0, 0.25, 4.0, -1.0, 2.0, 5.0)
    }

    #[test]
    fn zero_angle_rotations_are_identity() {
        assert_eq!(Matrix3::create_x_rotation_matrix(0.0), Matrix3::identity());
        assert_eq!(Matrix3::create_y_rotation_matrix(0.0), Matrix3::identity());
        assert_eq!(Matrix3::create_z_rotation_matrix(0.0), Matrix3::identity());
        assert_eq!(
            Matrix3::create_zyx_rotation_matrix(0.0, 0.0, 0.0),
            Matrix3::identity()
        );
    }

    #[test]
    fn closed_form_zyx_matches_incremental() {
        for (x, y, z) in [(10.0, 20.0, 30.0), (-45.0, 90.0, 135.0), (0.5, -170.0, 33.3)] {
            let mut incremental = Matrix3::identity();
            incremental.rotate_zyx(x, y, z);
            assert_eq!(Matrix3::create_zyx_rotation_matrix(x, y, z), incremental);
        }
    }

    #[test]
    fn closed_form_zyx_matches_sequential_product() {
        let (x, y, z) = (15.0, -40.0, 75.0);
        let sequential = &(&Matrix3::create_z_rotation_matrix(z)
            * &Matrix3::create_y_rotation_matrix(y))
            * &Matrix3::create_x_rotation_matrix(x);
        assert!(Matrix3::create_zyx_rotation_matrix(x, y, z).approx_eq(&sequential, 1e-12));
    }

    #[test]
    fn in_place_rotations_match_left_multiplication() {
        let cases: [(fn(&mut Matrix3, f64) -> &mut Matrix3, fn(f64) -> Matrix3); 3] = [
            (Matrix3::rotate_x, Matrix3::create_x_rotation_matrix),
            (Matrix3::rotate_y, Matrix3::create_y_rotation_matrix),
            (Matrix3::rotate_z, Matrix3::create_z_rotation_matrix),
        ];
        for (rotate, create) in cases {
            let mut rotated = sample();
            rotate(&mut rotated, 37.0);
            let mut expected = sample();
            expected.multiply(&create(37.0));
            assert!(rotated.approx_eq(&expected, 1e-12));
        }

        let mut rotated = sample();
        rotated.rotate_zyx(12.0, 34.0, 56.0);
        let mut expected = sample();
        expected.multiply(&Matrix3::create_zyx_rotation_matrix(12.0, 34.0, 56.0));
        assert!(rotated.approx_eq(&expected, 1e-12));
    }

    #[test]
    fn rotation_about_z_turns_x_axis_into_y_axis() {
        let v = Matrix3::create_z_rotation_matrix(90.0).apply(&Vector3::of(1.0, 0.0, 0.0));
        assert!(v.x().abs() < 1e-15);
        assert_eq!(v.y(), 1.0);
    }

    #[test]
    fn scale_then_augment_scenario() {
        let augmented = Matrix3::create_scale_matrix(2.0, 3.0, 4.0).augmented();
        assert_eq!(
            augmented.to_rows(),
            [
                [2.0, 0.0, 0.0, 0.0],
                [0.0, 3.0, 0.0, 0.0],
                [0.0, 0.0, 4.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ]
        );
        assert_eq!(augmented.deaugmented(), Matrix3::create_scale_matrix(2.0, 3.0, 4.0));
    }

    #[test]
    fn translation_moves_homogeneous_points() {
        let m = Matrix3::create_translation_matrix(2.0, -1.0);
        let moved = m.apply(&Vector2::of(1.0, 1.0).augmented());
        assert_eq!(moved, Vector3::of(3.0, 0.0, 1.0));

        let mut translated = Matrix3::identity();
        translated.translate(2.0, -1.0);
        assert_eq!(translated, m);
    }

    #[test]
    fn scale_invalidates_determinant() {
        let mut m = sample();
        let det = m.det();
        m.scale(2.0, 1.0, 1.0);
        assert_eq!(m.cached_determinant(), None);
        assert_eq!(m.det(), det * 2.0);
    }

    #[test]
    fn adjugate_yields_inverse() {
        let m = sample();
        assert!((&m * &m.inverted()).approx_identity(1e-12));
        assert!((&m.inverted() * &m).approx_identity(1e-12));
    }
}
