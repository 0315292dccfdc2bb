//! Double-precision 3D vector used for world positions, orbital state
//! vectors and frame velocities.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// Represents a 3D vector with double-precision components.
///
/// Double precision is required: positions are expressed relative to a
/// celestial body and routinely reach millions of meters.
///
/// # Examples
///
/// ```rust
/// use vessel_sync::math::Vector3d;
///
/// let a = Vector3d::new(1.0, 0.0, 0.0);
/// let b = Vector3d::new(3.0, 0.0, 0.0);
/// assert_eq!(Vector3d::lerp(a, b, 0.5), Vector3d::new(2.0, 0.0, 0.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector3d {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3d {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Creates a zero vector (0, 0, 0).
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn dot(self, other: Vector3d) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vector3d) -> Vector3d {
        Vector3d::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn magnitude(self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn sqr_magnitude(self) -> f64 {
        self.dot(self)
    }

    /// Calculates the distance to another vector.
    pub fn distance(self, other: Vector3d) -> f64 {
        (self - other).magnitude()
    }

    /// Linear interpolation. `t` is not clamped.
    pub fn lerp(a: Vector3d, b: Vector3d, t: f64) -> Vector3d {
        a + (b - a) * t
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Default for Vector3d {
    fn default() -> Self {
        Self::zero()
    }
}

impl Add for Vector3d {
    type Output = Vector3d;

    fn add(self, rhs: Vector3d) -> Vector3d {
        Vector3d::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vector3d {
    fn add_assign(&mut self, rhs: Vector3d) {
        *self = *self + rhs;
    }
}

impl Sub for Vector3d {
    type Output = Vector3d;

    fn sub(self, rhs: Vector3d) -> Vector3d {
        Vector3d::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vector3d {
    type Output = Vector3d;

    fn mul(self, rhs: f64) -> Vector3d {
        Vector3d::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vector3d {
    type Output = Vector3d;

    fn neg(self) -> Vector3d {
        Vector3d::new(-self.x, -self.y, -self.z)
    }
}

/// Scalar linear interpolation. `t` is not clamped.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_product_follows_right_hand_rule() {
        let x = Vector3d::new(1.0, 0.0, 0.0);
        let y = Vector3d::new(0.0, 1.0, 0.0);
        assert_eq!(x.cross(y), Vector3d::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_lerp_endpoints() {
        let a = Vector3d::new(-5.0, 2.0, 9.0);
        let b = Vector3d::new(5.0, 4.0, -1.0);
        assert_eq!(Vector3d::lerp(a, b, 0.0), a);
        assert_eq!(Vector3d::lerp(a, b, 1.0), b);
        assert_eq!(lerp(10.0, 20.0, 0.25), 12.5);
    }

    #[test]
    fn test_distance() {
        let a = Vector3d::new(0.0, 3.0, 0.0);
        let b = Vector3d::new(4.0, 0.0, 0.0);
        assert_eq!(a.distance(b), 5.0);
    }
}
