use super::{Cofactors, Matrix, Matrix3};

impl Cofactors<2> for Matrix<2> {
    fn determinant_of(m: &[[f64; 2]; 2]) -> f64 {
        m[0][0] * m[1][1] - m[0][1] * m[1][0]
    }

    fn adjugate_of(m: &[[f64; 2]; 2]) -> [[f64; 2]; 2] {
        [[m[1][1], -m[0][1]], [-m[1][0], m[0][0]]]
    }
}

impl Matrix<2> {
    /// Components in column order.
    pub fn of(n11: f64, n21: f64, n12: f64, n22: f64) -> Self {
        Self::from_rows([[n11, n12], [n21, n22]])
    }

    pub fn create_scale_matrix(x: f64, y: f64) -> Self {
        Self::from_rows([[x, 0.0], [0.0, y]])
    }

    pub fn create_rotation_matrix(degrees: f64) -> Self {
        let (s, c) = degrees.to_radians().sin_cos();
        Self::from_rows([[c, -s], [s, c]])
    }

    pub fn scale(&mut self, x: f64, y: f64) -> &mut Self {
        self.scale_rows(&[x, y]);
        self
    }

    pub fn rotate(&mut self, degrees: f64) -> &mut Self {
        self.rotate_plane(0, 1, degrees);
        self
    }

    /// Embeds this matrix in the top-left of a 3×3 identity.
    pub fn augmented(&self) -> Matrix3 {
        let m = &self.m;
        Matrix3::from_rows([
            [m[0][0], m[0][1], 0.0],
            [m[1][0], m[1][1], 0.0],
            [0.0, 0.0, 1.0],
        ])
    }
}
