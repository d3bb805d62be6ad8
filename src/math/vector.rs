use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::cache::{Poolable, Stackable};
use crate::error::{checked_index, index_error, MathError, MathResult};

/// Fixed-arity tuple of `f64` components with value semantics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vector<const N: usize> {
    components: [f64; N],
}

pub type Vector2 = Vector<2>;
pub type Vector3 = Vector<3>;
pub type Vector4 = Vector<4>;

impl<const N: usize> Default for Vector<N> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<const N: usize> Vector<N> {
    pub const fn from_array(components: [f64; N]) -> Self {
        Self { components }
    }

    pub const fn zero() -> Self {
        Self {
            components: [0.0; N],
        }
    }

    pub const fn splat(value: f64) -> Self {
        Self {
            components: [value; N],
        }
    }

    /// Builds a vector from a slice that must hold exactly `N` values.
    pub fn from_slice(values: &[f64]) -> MathResult<Self> {
        if values.len() != N {
            return Err(MathError::ComponentCount {
                expected: N,
                got: values.len(),
            });
        }
        let mut components = [0.0; N];
        components.copy_from_slice(values);
        Ok(Self { components })
    }

    pub const fn size(&self) -> usize {
        N
    }

    pub fn as_array(&self) -> &[f64; N] {
        &self.components
    }

    pub fn to_array(self) -> [f64; N] {
        self.components
    }

    /// 0-based component access for internal callers.
    pub(crate) fn at(&self, index: usize) -> f64 {
        self.components[index]
    }

    pub(crate) fn at_mut(&mut self, index: usize) -> &mut f64 {
        &mut self.components[index]
    }

    /// Reads a component, 1-indexed.
    pub fn get(&self, index: i64) -> MathResult<f64> {
        let index = checked_index(index, N, index_error)?;
        Ok(self.components[index])
    }

    /// Writes a component, 1-indexed.
    pub fn set_component(&mut self, index: i64, value: f64) -> MathResult<()> {
        let index = checked_index(index, N, index_error)?;
        self.components[index] = value;
        Ok(())
    }

    pub fn set(&mut self, other: &Self) -> &mut Self {
        self.components = other.components;
        self
    }

    pub fn reset(&mut self) -> &mut Self {
        self.components = [0.0; N];
        self
    }

    pub fn copy(&self) -> Self {
        *self
    }

    pub fn add_vector(&mut self, other: &Self) -> &mut Self {
        for (value, rhs) in self.components.iter_mut().zip(other.components) {
            *value += rhs;
        }
        self
    }

    pub fn sub_vector(&mut self, other: &Self) -> &mut Self {
        for (value, rhs) in self.components.iter_mut().zip(other.components) {
            *value -= rhs;
        }
        self
    }

    /// Component-wise product.
    pub fn mul_components(&mut self, other: &Self) -> &mut Self {
        for (value, rhs) in self.components.iter_mut().zip(other.components) {
            *value *= rhs;
        }
        self
    }

    /// Component-wise quotient.
    pub fn div_components(&mut self, other: &Self) -> &mut Self {
        for (value, rhs) in self.components.iter_mut().zip(other.components) {
            *value /= rhs;
        }
        self
    }

    pub fn scale(&mut self, factor: f64) -> &mut Self {
        for value in self.components.iter_mut() {
            *value *= factor;
        }
        self
    }

    pub fn dot(&self, other: &Self) -> f64 {
        self.components
            .iter()
            .zip(other.components.iter())
            .map(|(a, b)| a * b)
            .sum()
    }

    pub fn length_squared(&self) -> f64 {
        self.dot(self)
    }

    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Scales the vector to unit length. A zero vector is left untouched.
    pub fn normalize(&mut self) -> &mut Self {
        let length = self.length();
        if length != 0.0 {
            for value in self.components.iter_mut() {
                *value /= length;
            }
        }
        self
    }

    pub fn normalized(&self) -> Self {
        let mut result = *self;
        result.normalize();
        result
    }
}

impl Vector<2> {
    pub const fn of(x: f64, y: f64) -> Self {
        Self::from_array([x, y])
    }

    pub fn x(&self) -> f64 {
        self.components[0]
    }

    pub fn y(&self) -> f64 {
        self.components[1]
    }

    /// Appends a homogeneous `1.0`.
    pub fn augmented(&self) -> Vector3 {
        Vector3::of(self.x(), self.y(), 1.0)
    }
}

impl Vector<3> {
    pub const fn of(x: f64, y: f64, z: f64) -> Self {
        Self::from_array([x, y, z])
    }

    pub fn x(&self) -> f64 {
        self.components[0]
    }

    pub fn y(&self) -> f64 {
        self.components[1]
    }

    pub fn z(&self) -> f64 {
        self.components[2]
    }

    pub fn cross(&self, other: &Self) -> Self {
        let [ax, ay, az] = self.components;
        let [bx, by, bz] = other.components;
        Self::of(ay * bz - az * by, az * bx - ax * bz, ax * by - ay * bx)
    }

    /// Appends a homogeneous `1.0`.
    pub fn augmented(&self) -> Vector4 {
        Vector4::of(self.x(), self.y(), self.z(), 1.0)
    }
}

impl Vector<4> {
    pub const fn of(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self::from_array([x, y, z, w])
    }

    pub fn x(&self) -> f64 {
        self.components[0]
    }

    pub fn y(&self) -> f64 {
        self.components[1]
    }

    pub fn z(&self) -> f64 {
        self.components[2]
    }

    pub fn w(&self) -> f64 {
        self.components[3]
    }

    /// Drops the homogeneous component.
    pub fn truncated(&self) -> Vector3 {
        Vector3::of(self.x(), self.y(), self.z())
    }
}

impl<const N: usize> Add for Vector<N> {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self.add_vector(&rhs);
        self
    }
}

impl<const N: usize> AddAssign for Vector<N> {
    fn add_assign(&mut self, rhs: Self) {
        self.add_vector(&rhs);
    }
}

impl<const N: usize> Sub for Vector<N> {
    type Output = Self;

    fn sub(mut self, rhs: Self) -> Self {
        self.sub_vector(&rhs);
        self
    }
}

impl<const N: usize> SubAssign for Vector<N> {
    fn sub_assign(&mut self, rhs: Self) {
        self.sub_vector(&rhs);
    }
}

impl<const N: usize> Mul<f64> for Vector<N> {
    type Output = Self;

    fn mul(mut self, rhs: f64) -> Self {
        self.scale(rhs);
        self
    }
}

impl<const N: usize> Neg for Vector<N> {
    type Output = Self;

    fn neg(mut self) -> Self {
        self.scale(-1.0);
        self
    }
}

impl<const N: usize> fmt::Display for Vector<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (index, value) in self.components.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, "}}")
    }
}

impl<const N: usize> Serialize for Vector<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.components.iter())
    }
}

impl<'de, const N: usize> Deserialize<'de> for Vector<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let values = Vec::<f64>::deserialize(deserializer)?;
        Self::from_slice(&values).map_err(D::Error::custom)
    }
}

impl<const N: usize> Poolable for Vector<N> {
    fn create() -> Self {
        Self::zero()
    }

    fn reset(&mut self) {
        Vector::reset(self);
    }
}

/// Vector stacks accumulate offsets.
impl<const N: usize> Stackable for Vector<N> {
    fn modify(&mut self, arg: &Self) {
        self.add_vector(arg);
    }

    fn copy_from(&mut self, other: &Self) {
        self.set(other);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_is_component_wise() {
        let mut v = Vector3::of(1.0, 2.0, 3.0);
        v.add_vector(&Vector3::of(1.0, 1.0, 1.0)).scale(2.0);
        assert_eq!(v, Vector3::of(4.0, 6.0, 8.0));
        v.mul_components(&Vector3::of(0.5, 0.5, 0.25));
        assert_eq!(v, Vector3::of(2.0, 3.0, 2.0));
        v.div_components(&Vector3::of(2.0, 3.0, 2.0));
        assert_eq!(v, Vector3::splat(1.0));
        v.sub_vector(&Vector3::splat(3.0));
        assert_eq!(-v, Vector3::splat(2.0));
        assert_eq!(v - Vector3::splat(1.0), Vector3::splat(-3.0));
    }

    #[test]
    fn operators_and_in_place_methods_agree() {
        let a = Vector3::of(1.0, 2.0, 3.0);
        let b = Vector3::of(0.5, -1.0, 4.0);
        let mut sum = a;
        sum += b;
        assert_eq!(sum, a + b);
        assert_eq!(*a.copy().add_vector(&b), sum);
        let mut diff = a;
        diff -= b;
        assert_eq!(diff, a - b);
        assert_eq!(*a.copy().sub_vector(&b), diff);
        assert_eq!(a * 2.0, *a.copy().scale(2.0));
    }

    #[test]
    fn normalize_leaves_zero_vector_alone() {
        let mut zero = Vector2::zero();
        zero.normalize();
        assert_eq!(zero, Vector2::zero());

        let unit = Vector2::of(3.0, 4.0).normalized();
        assert_eq!(unit, Vector2::of(0.6, 0.8));
        assert_eq!(Vector2::of(3.0, 4.0).length(), 5.0);
    }

    #[test]
    fn cross_follows_right_hand_rule() {
        let x = Vector3::of(1.0, 0.0, 0.0);
        let y = Vector3::of(0.0, 1.0, 0.0);
        assert_eq!(x.cross(&y), Vector3::of(0.0, 0.0, 1.0));
        assert_eq!(x.dot(&y), 0.0);
    }

    #[test]
    fn one_based_component_access() {
        let mut v = Vector4::of(1.0, 2.0, 3.0, 4.0);
        assert_eq!(v.get(4), Ok(4.0));
        v.set_component(1, 9.0).unwrap();
        assert_eq!(v.x(), 9.0);
        assert_eq!(
            v.get(5),
            Err(MathError::IndexOutOfRange { got: 5, max: 4 })
        );
    }

    #[test]
    fn augmented_appends_homogeneous_one() {
        assert_eq!(Vector2::of(2.0, 3.0).augmented(), Vector3::of(2.0, 3.0, 1.0));
        assert_eq!(
            Vector3::of(2.0, 3.0, 4.0).augmented().truncated(),
            Vector3::of(2.0, 3.0, 4.0)
        );
    }

    #[test]
    fn from_slice_checks_length() {
        assert!(Vector3::from_slice(&[1.0, 2.0]).is_err());
        assert_eq!(
            Vector3::from_slice(&[1.0, 2.0, 3.0]).unwrap(),
            Vector3::of(1.0, 2.0, 3.0)
        );
        assert_eq!(Vector3::of(1.0, 2.5, 3.0).to_string(), "{1, 2.5, 3}");
    }
}
