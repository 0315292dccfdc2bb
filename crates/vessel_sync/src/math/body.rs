//! Celestial bodies: the reference frames vessels are positioned in.

use super::{QuaternionD, Vector3d};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Exponential atmosphere model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atmosphere {
    /// Static pressure at sea level (kPa)
    pub surface_pressure_kpa: f64,
    /// Altitude over which pressure falls by a factor of e (m)
    pub scale_height: f64,
    /// Altitude where the atmosphere ends (m)
    pub depth: f64,
}

/// A celestial body acting as a reference frame.
///
/// The body's world position and frame velocity are held constant; its
/// rotation advances uniformly around the +Z axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CelestialBody {
    pub name: String,
    /// Gravitational parameter GM (m^3/s^2)
    pub gravitational_parameter: f64,
    /// Mean radius (m)
    pub radius: f64,
    /// Sidereal rotation period (s); zero for a non-rotating body
    pub rotation_period: f64,
    /// Rotation angle at universal time zero (radians)
    pub initial_rotation: f64,
    /// Position of the body in world space
    pub position: Vector3d,
    /// Velocity of the body's frame relative to world space
    pub frame_velocity: Vector3d,
    pub atmosphere: Option<Atmosphere>,
}

impl CelestialBody {
    /// Creates a non-rotating, airless body at the world origin.
    pub fn new(name: impl Into<String>, gravitational_parameter: f64, radius: f64) -> Self {
        Self {
            name: name.into(),
            gravitational_parameter,
            radius,
            rotation_period: 0.0,
            initial_rotation: 0.0,
            position: Vector3d::zero(),
            frame_velocity: Vector3d::zero(),
            atmosphere: None,
        }
    }

    /// A Kerbin-like home world: rotating, with an atmosphere.
    pub fn kerbin() -> Self {
        Self {
            rotation_period: 21_549.425,
            atmosphere: Some(Atmosphere {
                surface_pressure_kpa: 101.325,
                scale_height: 5_600.0,
                depth: 70_000.0,
            }),
            ..Self::new("Kerbin", 3.5316e12, 600_000.0)
        }
    }

    /// Frame velocity at the given universal time.
    pub fn frame_vel_at_ut(&self, _universal_time: f64) -> Vector3d {
        self.frame_velocity
    }

    pub fn rotation_angle_at_ut(&self, universal_time: f64) -> f64 {
        if self.rotation_period == 0.0 {
            return self.initial_rotation;
        }
        (self.initial_rotation + TAU * universal_time / self.rotation_period).rem_euclid(TAU)
    }

    /// Orientation of the body-fixed frame at the given universal time.
    pub fn rotation_at_ut(&self, universal_time: f64) -> QuaternionD {
        QuaternionD::from_axis_angle(
            Vector3d::new(0.0, 0.0, 1.0),
            self.rotation_angle_at_ut(universal_time),
        )
    }

    /// World position of a point given in geodetic coordinates (degrees, meters).
    pub fn world_surface_position(
        &self,
        latitude: f64,
        longitude: f64,
        altitude: f64,
        universal_time: f64,
    ) -> Vector3d {
        let lat = latitude.to_radians();
        let lon = longitude.to_radians();
        let r = self.radius + altitude;
        let body_fixed = Vector3d::new(r * lat.cos() * lon.cos(), r * lat.cos() * lon.sin(), r * lat.sin());
        self.position + self.rotation_at_ut(universal_time).rotate(body_fixed)
    }

    /// Geodetic coordinates `[lat, lon, alt]` of a world position.
    pub fn lat_lon_alt(&self, world_position: Vector3d, universal_time: f64) -> [f64; 3] {
        let rel = world_position - self.position;
        let r = rel.magnitude();
        if r == 0.0 {
            return [0.0, 0.0, -self.radius];
        }
        let angle = self.rotation_angle_at_ut(universal_time);
        let body_fixed = QuaternionD::from_axis_angle(Vector3d::new(0.0, 0.0, 1.0), -angle).rotate(rel);
        let latitude = (body_fixed.z / r).clamp(-1.0, 1.0).asin().to_degrees();
        let longitude = body_fixed.y.atan2(body_fixed.x).to_degrees();
        [latitude, longitude, r - self.radius]
    }

    /// Static atmospheric pressure at the given altitude (kPa).
    pub fn static_pressure_kpa(&self, altitude: f64) -> f64 {
        match &self.atmosphere {
            None => 0.0,
            Some(atm) if altitude >= atm.depth => 0.0,
            Some(atm) if altitude <= 0.0 => atm.surface_pressure_kpa,
            Some(atm) => atm.surface_pressure_kpa * (-altitude / atm.scale_height).exp(),
        }
    }
}
