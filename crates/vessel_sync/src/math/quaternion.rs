//! Unit quaternion for vessel and body rotations.

use super::Vector3d;
use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// Rotation quaternion with double-precision components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuaternionD {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl QuaternionD {
    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    pub const fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    /// Rotation of `angle` radians around `axis` (need not be normalized).
    pub fn from_axis_angle(axis: Vector3d, angle: f64) -> Self {
        let len = axis.magnitude();
        if len == 0.0 {
            return Self::identity();
        }
        let half = angle * 0.5;
        let s = half.sin() / len;
        Self::new(axis.x * s, axis.y * s, axis.z * s, half.cos())
    }

    pub fn dot(self, other: QuaternionD) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    pub fn normalized(self) -> Self {
        let len = self.dot(self).sqrt();
        if len == 0.0 {
            return Self::identity();
        }
        Self::new(self.x / len, self.y / len, self.z / len, self.w / len)
    }

    /// Rotates a vector by this quaternion.
    pub fn rotate(self, v: Vector3d) -> Vector3d {
        let u = Vector3d::new(self.x, self.y, self.z);
        let t = u.cross(v) * 2.0;
        v + t * self.w + u.cross(t)
    }

    /// Spherical interpolation along the shortest arc. `t` is clamped to [0, 1].
    pub fn slerp(a: QuaternionD, b: QuaternionD, t: f64) -> QuaternionD {
        let t = t.clamp(0.0, 1.0);
        let mut b = b;
        let mut cos_theta = a.dot(b);
        if cos_theta < 0.0 {
            b = QuaternionD::new(-b.x, -b.y, -b.z, -b.w);
            cos_theta = -cos_theta;
        }

        // Nearly parallel: sin(theta) vanishes, fall back to normalized lerp.
        if cos_theta > 0.9995 {
            return QuaternionD::new(
                a.x + (b.x - a.x) * t,
                a.y + (b.y - a.y) * t,
                a.z + (b.z - a.z) * t,
                a.w + (b.w - a.w) * t,
            )
            .normalized();
        }

        let theta = cos_theta.clamp(-1.0, 1.0).acos();
        let sin_theta = theta.sin();
        let wa = ((1.0 - t) * theta).sin() / sin_theta;
        let wb = (t * theta).sin() / sin_theta;
        QuaternionD::new(
            a.x * wa + b.x * wb,
            a.y * wa + b.y * wb,
            a.z * wa + b.z * wb,
            a.w * wa + b.w * wb,
        )
    }

    /// Angle in radians between two rotations.
    pub fn angle_to(self, other: QuaternionD) -> f64 {
        let d = self.normalized().dot(other.normalized()).abs().min(1.0);
        2.0 * d.acos()
    }
}

impl Default for QuaternionD {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for QuaternionD {
    type Output = QuaternionD;

    /// Hamilton product: `self * rhs` applies `rhs` first, then `self`.
    fn mul(self, rhs: QuaternionD) -> QuaternionD {
        QuaternionD::new(
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_rotate_quarter_turn_about_z() {
        let q = QuaternionD::from_axis_angle(Vector3d::new(0.0, 0.0, 1.0), FRAC_PI_2);
        let v = q.rotate(Vector3d::new(1.0, 0.0, 0.0));
        assert!((v.x).abs() < EPS);
        assert!((v.y - 1.0).abs() < EPS);
    }

    #[test]
    fn test_slerp_midpoint_is_half_angle() {
        let axis = Vector3d::new(0.0, 1.0, 0.0);
        let a = QuaternionD::identity();
        let b = QuaternionD::from_axis_angle(axis, FRAC_PI_2);
        let mid = QuaternionD::slerp(a, b, 0.5);
        let expected = QuaternionD::from_axis_angle(axis, FRAC_PI_2 / 2.0);
        assert!(mid.angle_to(expected) < 1e-6);
    }

    #[test]
    fn test_slerp_with_itself_is_identity() {
        let q = QuaternionD::from_axis_angle(Vector3d::new(1.0, 2.0, 3.0), 0.7);
        let r = QuaternionD::slerp(q, q, 0.3);
        assert!(q.angle_to(r) < 1e-6);
    }

    #[test]
    fn test_composition_order() {
        let z90 = QuaternionD::from_axis_angle(Vector3d::new(0.0, 0.0, 1.0), FRAC_PI_2);
        let x90 = QuaternionD::from_axis_angle(Vector3d::new(1.0, 0.0, 0.0), FRAC_PI_2);
        // x90 first maps +Y to +Z, then z90 leaves +Z alone
        let v = (z90 * x90).rotate(Vector3d::new(0.0, 1.0, 0.0));
        assert!((v.z - 1.0).abs() < EPS);
    }
}
