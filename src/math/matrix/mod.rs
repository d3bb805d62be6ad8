//! Square matrices with cached determinant and one-step inverse memoization.
//!
//! Entries are stored row-major and addressed 1-indexed in the public API.
//! Component lists (`of`, [`Matrix::set_components`]) are read in column
//! order: `n11, n21, n31, n12, ...`.

mod mat2;
mod mat3;
mod mat4;

use std::cell::Cell;
use std::fmt;
use std::ops::Mul;

use log::trace;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::cache::{Poolable, Stackable};
use crate::error::{checked_index, column_error, row_error, MathError, MathResult};

use super::vector::Vector;

pub type Matrix2 = Matrix<2>;
pub type Matrix3 = Matrix<3>;
pub type Matrix4 = Matrix<4>;

/// Dimension-specific closed forms. Implemented for 2×2, 3×3 and 4×4.
pub trait Cofactors<const N: usize> {
    fn determinant_of(m: &[[f64; N]; N]) -> f64;

    /// Transposed cofactor matrix.
    fn adjugate_of(m: &[[f64; N]; N]) -> [[f64; N]; N];
}

#[derive(Debug, Clone)]
struct InverseSnapshot<const N: usize> {
    entries: [[f64; N]; N],
    determinant: Option<f64>,
}

/// N×N matrix of `f64`.
///
/// Any mutation drops the cached determinant and inverse, except
/// [`Matrix::transpose`] which keeps the determinant.
#[derive(Debug, Clone)]
pub struct Matrix<const N: usize> {
    m: [[f64; N]; N],
    cached_det: Cell<Option<f64>>,
    cached_inverse: Option<InverseSnapshot<N>>,
}

impl<const N: usize> Default for Matrix<N> {
    fn default() -> Self {
        Self::identity()
    }
}

impl<const N: usize> PartialEq for Matrix<N> {
    /// Exact component comparison. No epsilon is applied.
    fn eq(&self, other: &Self) -> bool {
        self.m == other.m
    }
}

impl<const N: usize> Matrix<N> {
    pub fn identity() -> Self {
        let mut m = [[0.0; N]; N];
        for (index, row) in m.iter_mut().enumerate() {
            row[index] = 1.0;
        }
        Self::from_rows(m)
    }

    pub fn from_rows(rows: [[f64; N]; N]) -> Self {
        Self {
            m: rows,
            cached_det: Cell::new(None),
            cached_inverse: None,
        }
    }

    pub fn from_columns(columns: [Vector<N>; N]) -> Self {
        let mut m = [[0.0; N]; N];
        for (col, column) in columns.iter().enumerate() {
            for (row, entries) in m.iter_mut().enumerate() {
                entries[col] = column.at(row);
            }
        }
        Self::from_rows(m)
    }

    /// Builds a matrix from `N * N` values in column order.
    pub fn from_cols_slice(values: &[f64]) -> MathResult<Self> {
        let mut matrix = Self::identity();
        matrix.set_components(values)?;
        Ok(matrix)
    }

    pub const fn rows(&self) -> usize {
        N
    }

    pub const fn cols(&self) -> usize {
        N
    }

    pub fn to_rows(&self) -> [[f64; N]; N] {
        self.m
    }

    /// Entries in column order, the layout used by the host bridge.
    pub fn to_cols_vec(&self) -> Vec<f64> {
        let mut values = Vec::with_capacity(N * N);
        for col in 0..N {
            for row in 0..N {
                values.push(self.m[row][col]);
            }
        }
        values
    }

    pub(crate) fn at(&self, row: usize, col: usize) -> f64 {
        self.m[row][col]
    }

    pub(crate) fn put(&mut self, row: usize, col: usize, value: f64) {
        self.m[row][col] = value;
        self.invalidate();
    }

    /// Reads entry `(row, col)`, both 1-indexed.
    pub fn entry(&self, row: i64, col: i64) -> MathResult<f64> {
        let row = checked_index(row, N, row_error)?;
        let col = checked_index(col, N, column_error)?;
        Ok(self.m[row][col])
    }

    /// Writes entry `(row, col)`, both 1-indexed.
    pub fn set_entry(&mut self, row: i64, col: i64, value: f64) -> MathResult<&mut Self> {
        let row = checked_index(row, N, row_error)?;
        let col = checked_index(col, N, column_error)?;
        self.put(row, col, value);
        Ok(self)
    }

    pub fn get_row(&self, row: i64) -> MathResult<Vector<N>> {
        let row = checked_index(row, N, row_error)?;
        Ok(Vector::from_array(self.m[row]))
    }

    pub fn get_column(&self, col: i64) -> MathResult<Vector<N>> {
        let col = checked_index(col, N, column_error)?;
        let mut column = Vector::zero();
        for row in 0..N {
            *column.at_mut(row) = self.m[row][col];
        }
        Ok(column)
    }

    pub fn set(&mut self, other: &Self) -> &mut Self {
        self.m = other.m;
        self.invalidate();
        self
    }

    /// Overwrites every entry from `N * N` values in column order.
    pub fn set_components(&mut self, values: &[f64]) -> MathResult<&mut Self> {
        if values.len() != N * N {
            return Err(MathError::ComponentCount {
                expected: N * N,
                got: values.len(),
            });
        }
        for (index, value) in values.iter().enumerate() {
            self.m[index % N][index / N] = *value;
        }
        self.invalidate();
        Ok(self)
    }

    /// A copy of the entries without the cached state.
    pub fn copy(&self) -> Self {
        Self::from_rows(self.m)
    }

    pub fn reset(&mut self) -> &mut Self {
        self.set(&Self::identity())
    }

    /// `self = other × self`.
    pub fn multiply(&mut self, other: &Self) -> &mut Self {
        self.m = product(&other.m, &self.m);
        self.invalidate();
        self
    }

    /// `self = self × other`.
    pub fn right_multiply(&mut self, other: &Self) -> &mut Self {
        self.m = product(&self.m, &other.m);
        self.invalidate();
        self
    }

    pub fn transpose(&mut self) -> &mut Self {
        for row in 0..N {
            for col in (row + 1)..N {
                let temp = self.m[row][col];
                self.m[row][col] = self.m[col][row];
                self.m[col][row] = temp;
            }
        }
        // the determinant survives a transpose, the inverse snapshot does not
        self.cached_inverse = None;
        self
    }

    pub fn transposed(&self) -> Self {
        let mut result = self.clone();
        result.transpose();
        result
    }

    pub fn add(&mut self, other: &Self) -> &mut Self {
        for (row, rhs) in self.m.iter_mut().zip(other.m.iter()) {
            for (value, rhs) in row.iter_mut().zip(rhs.iter()) {
                *value += rhs;
            }
        }
        self.invalidate();
        self
    }

    pub fn sub(&mut self, other: &Self) -> &mut Self {
        for (row, rhs) in self.m.iter_mut().zip(other.m.iter()) {
            for (value, rhs) in row.iter_mut().zip(rhs.iter()) {
                *value -= rhs;
            }
        }
        self.invalidate();
        self
    }

    /// `self × v`.
    pub fn apply(&self, v: &Vector<N>) -> Vector<N> {
        let mut result = Vector::zero();
        for (row, entries) in self.m.iter().enumerate() {
            *result.at_mut(row) = entries
                .iter()
                .enumerate()
                .map(|(col, value)| value * v.at(col))
                .sum();
        }
        result
    }

    pub fn cached_determinant(&self) -> Option<f64> {
        self.cached_det.get()
    }

    pub fn has_cached_inverse(&self) -> bool {
        self.cached_inverse.is_some()
    }

    fn invalidate(&mut self) {
        self.cached_det.set(None);
        self.cached_inverse = None;
    }

    /// Scales the first `factors.len()` rows.
    pub(crate) fn scale_rows(&mut self, factors: &[f64]) {
        for (row, factor) in self.m.iter_mut().zip(factors) {
            for value in row.iter_mut() {
                *value *= factor;
            }
        }
        self.invalidate();
    }

    /// Adds `offset[i] × last row` to row `i`.
    pub(crate) fn translate_rows(&mut self, offsets: &[f64]) {
        let last = self.m[N - 1];
        for (row, offset) in self.m.iter_mut().zip(offsets) {
            for (value, base) in row.iter_mut().zip(last.iter()) {
                *value += offset * base;
            }
        }
        self.invalidate();
    }

    /// Rotates rows `a` and `b` in their plane: `a' = c·a - s·b`,
    /// `b' = s·a + c·b`.
    pub(crate) fn rotate_plane(&mut self, a: usize, b: usize, degrees: f64) {
        let radians = degrees.to_radians();
        let c = radians.cos();
        let s = radians.sin();
        for col in 0..N {
            let va = self.m[a][col];
            let vb = self.m[b][col];
            self.m[a][col] = c * va - s * vb;
            self.m[b][col] = s * va + c * vb;
        }
        self.invalidate();
    }

    /// Left-multiplies the first three rows by a 3×3 block.
    pub(crate) fn recombine_rows3(&mut self, block: &[[f64; 3]; 3]) {
        for col in 0..N {
            let r0 = self.m[0][col];
            let r1 = self.m[1][col];
            let r2 = self.m[2][col];
            for (row, coefficients) in block.iter().enumerate() {
                self.m[row][col] =
                    coefficients[0] * r0 + coefficients[1] * r1 + coefficients[2] * r2;
            }
        }
        self.invalidate();
    }

    /// Identity with the top-left 3×3 replaced by `block`.
    pub(crate) fn with_block3(block: &[[f64; 3]; 3]) -> Self {
        let mut result = Self::identity();
        for (row, entries) in block.iter().enumerate() {
            result.m[row][..3].copy_from_slice(entries);
        }
        result
    }
}

impl<const N: usize> Matrix<N>
where
    Matrix<N>: Cofactors<N>,
{
    /// Returns the determinant, computing and caching it when absent.
    pub fn det(&self) -> f64 {
        if let Some(det) = self.cached_det.get() {
            return det;
        }
        let det = Self::determinant_of(&self.m);
        self.cached_det.set(Some(det));
        det
    }

    /// Inverts in place via the adjugate.
    ///
    /// A zero determinant is replaced by `f64::MIN_POSITIVE` instead of
    /// failing. The pre-inversion entries are remembered, so inverting twice
    /// in a row restores them without recomputation. Only one level is kept.
    pub fn invert(&mut self) -> &mut Self {
        let previous = self.m;
        let snapshot = if let Some(cached) = self.cached_inverse.take() {
            trace!("restoring memoized {}x{} inverse", N, N);
            let current_det = self.cached_det.get();
            let restored_det = cached
                .determinant
                .or_else(|| current_det.filter(|det| *det != 0.0).map(|det| 1.0 / det));
            self.m = cached.entries;
            self.cached_det.set(restored_det);
            InverseSnapshot {
                entries: previous,
                determinant: current_det,
            }
        } else {
            let det = Self::determinant_of(&self.m);
            let adjugate = Self::adjugate_of(&self.m);
            let divisor = if det == 0.0 { f64::MIN_POSITIVE } else { det };
            let factor = 1.0 / divisor;
            for (row, adj) in self.m.iter_mut().zip(adjugate.iter()) {
                for (value, cofactor) in row.iter_mut().zip(adj.iter()) {
                    // the substituted divisor must not push entries to infinity
                    *value = (cofactor * factor).clamp(-f64::MAX, f64::MAX);
                }
            }
            // the substituted determinant says nothing about the result
            self.cached_det.set((det != 0.0).then_some(factor));
            InverseSnapshot {
                entries: previous,
                determinant: Some(det),
            }
        };
        self.cached_inverse = Some(snapshot);
        self
    }

    pub fn inverted(&self) -> Self {
        let mut result = self.clone();
        result.invert();
        result
    }
}

fn product<const N: usize>(lhs: &[[f64; N]; N], rhs: &[[f64; N]; N]) -> [[f64; N]; N] {
    let mut result = [[0.0; N]; N];
    for (i, row) in result.iter_mut().enumerate() {
        for (j, value) in row.iter_mut().enumerate() {
            let mut sum = lhs[i][0] * rhs[0][j];
            for k in 1..N {
                sum += lhs[i][k] * rhs[k][j];
            }
            *value = sum;
        }
    }
    result
}

/// Closed-form `Rz × Ry × Rx` for angles in degrees.
pub(crate) fn zyx_rotation_block(x: f64, y: f64, z: f64) -> [[f64; 3]; 3] {
    let (b, a) = x.to_radians().sin_cos();
    let (d, c) = y.to_radians().sin_cos();
    let (f, e) = z.to_radians().sin_cos();
    [
        [c * e, b * d * e - a * f, a * d * e + b * f],
        [c * f, b * d * f + a * e, a * d * f - b * e],
        [-d, b * c, a * c],
    ]
}

impl<const N: usize> Mul for &Matrix<N> {
    type Output = Matrix<N>;

    /// Ordinary product `self × rhs`.
    fn mul(self, rhs: Self) -> Matrix<N> {
        let mut result = self.copy();
        result.right_multiply(rhs);
        result
    }
}

impl<const N: usize> Mul<Vector<N>> for &Matrix<N> {
    type Output = Vector<N>;

    fn mul(self, rhs: Vector<N>) -> Vector<N> {
        self.apply(&rhs)
    }
}

impl<const N: usize> fmt::Display for Matrix<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, row) in self.m.iter().enumerate() {
            write!(f, "{}", if index == 0 { "[  " } else { "\n   " })?;
            for (col, value) in row.iter().enumerate() {
                if col > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", *value as f32)?;
            }
        }
        write!(f, "  ]")
    }
}

impl<const N: usize> Serialize for Matrix<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.m.iter().map(|row| row.as_slice()))
    }
}

impl<'de, const N: usize> Deserialize<'de> for Matrix<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let rows = Vec::<Vec<f64>>::deserialize(deserializer)?;
        if rows.len() != N || rows.iter().any(|row| row.len() != N) {
            return Err(D::Error::custom(format!("expected {}x{} rows", N, N)));
        }
        let mut m = [[0.0; N]; N];
        for (target, row) in m.iter_mut().zip(rows) {
            target.copy_from_slice(&row);
        }
        Ok(Self::from_rows(m))
    }
}

impl<const N: usize> Poolable for Matrix<N> {
    fn create() -> Self {
        Self::identity()
    }

    fn reset(&mut self) {
        Matrix::reset(self);
    }
}

/// Matrix stacks compose by right-multiplication.
impl<const N: usize> Stackable for Matrix<N> {
    fn modify(&mut self, arg: &Self) {
        self.right_multiply(arg);
    }

    fn copy_from(&mut self, other: &Self) {
        self.set(other);
    }
}
