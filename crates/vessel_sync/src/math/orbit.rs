//! Two-body orbits.
//!
//! An [`Orbit`] is stored as a Cartesian state (position and velocity relative
//! to the reference body) at its epoch and propagated with the universal
//! variable formulation of Kepler's problem. Working in state-vector space
//! keeps near-circular and near-equatorial orbits well defined, where angular
//! elements such as the argument of periapsis are not.

use super::{CelestialBody, Vector3d};
use crate::error::OrbitError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const KEPLER_TOLERANCE: f64 = 1e-10;
const KEPLER_MAX_ITERATIONS: usize = 200;

/// Classical Keplerian elements as carried by position snapshots.
///
/// Angles are in degrees except the mean anomaly, which is in radians.
/// Hyperbolic orbits use a negative semi-major axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitalElements {
    pub inclination: f64,
    pub eccentricity: f64,
    pub semi_major_axis: f64,
    pub longitude_of_ascending_node: f64,
    pub argument_of_periapsis: f64,
    pub mean_anomaly_at_epoch: f64,
    pub epoch: f64,
}

/// Orbit around a reference body.
#[derive(Debug, Clone)]
pub struct Orbit {
    reference_body: Arc<CelestialBody>,
    epoch: f64,
    position: Vector3d,
    velocity: Vector3d,
}

impl Orbit {
    /// Builds an orbit from classical elements.
    pub fn from_elements(elements: OrbitalElements, body: Arc<CelestialBody>) -> Result<Self, OrbitError> {
        let OrbitalElements {
            inclination,
            eccentricity: e,
            semi_major_axis: a,
            longitude_of_ascending_node,
            argument_of_periapsis,
            mean_anomaly_at_epoch: m,
            epoch,
        } = elements;

        let inputs = [inclination, e, a, longitude_of_ascending_node, argument_of_periapsis, m, epoch];
        if inputs.iter().any(|v| !v.is_finite()) {
            return Err(OrbitError::NonFinite);
        }
        let mu = body.gravitational_parameter;
        if mu <= 0.0 {
            return Err(OrbitError::NoGravity(body.name.clone()));
        }
        if e < 0.0 || (e - 1.0).abs() < 1e-12 || a == 0.0 {
            return Err(OrbitError::Degenerate(format!("e={e}, a={a}")));
        }

        let true_anomaly = if e < 1.0 {
            let ecc_anomaly = solve_elliptic_anomaly(m, e);
            2.0 * ((1.0 + e).sqrt() * (ecc_anomaly / 2.0).sin())
                .atan2((1.0 - e).sqrt() * (ecc_anomaly / 2.0).cos())
        } else {
            let hyp_anomaly = solve_hyperbolic_anomaly(m, e);
            2.0 * (((e + 1.0) / (e - 1.0)).sqrt() * (hyp_anomaly / 2.0).tanh()).atan()
        };

        let p = a * (1.0 - e * e);
        if p <= 0.0 {
            return Err(OrbitError::Degenerate(format!("semi-latus rectum {p}")));
        }
        let r = p / (1.0 + e * true_anomaly.cos());
        let speed_factor = (mu / p).sqrt();

        let pos_pf = Vector3d::new(r * true_anomaly.cos(), r * true_anomaly.sin(), 0.0);
        let vel_pf = Vector3d::new(-speed_factor * true_anomaly.sin(), speed_factor * (e + true_anomaly.cos()), 0.0);

        let rotate = |v: Vector3d| {
            perifocal_to_body(
                v,
                longitude_of_ascending_node.to_radians(),
                inclination.to_radians(),
                argument_of_periapsis.to_radians(),
            )
        };

        Self::from_state_vectors(rotate(pos_pf), rotate(vel_pf), body, epoch)
    }

    /// Builds an orbit from a body-relative position and velocity at `epoch`.
    pub fn from_state_vectors(
        position: Vector3d,
        velocity: Vector3d,
        body: Arc<CelestialBody>,
        epoch: f64,
    ) -> Result<Self, OrbitError> {
        if !position.is_finite() || !velocity.is_finite() || !epoch.is_finite() {
            return Err(OrbitError::NonFinite);
        }
        if position.magnitude() == 0.0 {
            return Err(OrbitError::ZeroRadius);
        }
        if body.gravitational_parameter <= 0.0 {
            return Err(OrbitError::NoGravity(body.name.clone()));
        }
        Ok(Self {
            reference_body: body,
            epoch,
            position,
            velocity,
        })
    }

    pub fn reference_body(&self) -> &Arc<CelestialBody> {
        &self.reference_body
    }

    pub fn epoch(&self) -> f64 {
        self.epoch
    }

    /// Body-relative position and velocity at the epoch.
    pub fn state_at_epoch(&self) -> (Vector3d, Vector3d) {
        (self.position, self.velocity)
    }

    /// Position relative to the reference body at `universal_time`.
    pub fn relative_position_at_ut(&self, universal_time: f64) -> Vector3d {
        self.state_at_ut(universal_time).0
    }

    /// Velocity relative to the reference body at `universal_time`.
    pub fn orbital_velocity_at_ut(&self, universal_time: f64) -> Vector3d {
        self.state_at_ut(universal_time).1
    }

    /// World position at `universal_time`.
    pub fn position_at_ut(&self, universal_time: f64) -> Vector3d {
        self.reference_body.position + self.relative_position_at_ut(universal_time)
    }

    /// Specific orbital energy; negative for bound orbits.
    pub fn specific_energy(&self) -> f64 {
        let mu = self.reference_body.gravitational_parameter;
        self.velocity.sqr_magnitude() / 2.0 - mu / self.position.magnitude()
    }

    /// Propagates the epoch state to `universal_time` (universal variables,
    /// Lagrange f and g coefficients).
    pub fn state_at_ut(&self, universal_time: f64) -> (Vector3d, Vector3d) {
        let dt = universal_time - self.epoch;
        if dt == 0.0 || !dt.is_finite() {
            return (self.position, self.velocity);
        }

        let mu = self.reference_body.gravitational_parameter;
        let sqrt_mu = mu.sqrt();
        let r0_vec = self.position;
        let v0_vec = self.velocity;
        let r0 = r0_vec.magnitude();
        let vr0 = r0_vec.dot(v0_vec) / r0;
        let alpha = 2.0 / r0 - v0_vec.sqr_magnitude() / mu;

        let chi = solve_universal_anomaly(dt, r0, vr0, alpha, sqrt_mu);
        let z = alpha * chi * chi;
        let (c, s) = stumpff(z);

        let f = 1.0 - chi * chi / r0 * c;
        let g = dt - chi.powi(3) / sqrt_mu * s;
        let r_vec = r0_vec * f + v0_vec * g;
        let r = r_vec.magnitude();

        let f_dot = sqrt_mu / (r * r0) * (alpha * chi.powi(3) * s - chi);
        let g_dot = 1.0 - chi * chi / r * c;
        let v_vec = r0_vec * f_dot + v0_vec * g_dot;

        (r_vec, v_vec)
    }
}

/// Rotation 3-1-3 (Ω, i, ω) from the perifocal frame to the body frame.
fn perifocal_to_body(v: Vector3d, lan: f64, inc: f64, argp: f64) -> Vector3d {
    let (so, co) = lan.sin_cos();
    let (si, ci) = inc.sin_cos();
    let (sw, cw) = argp.sin_cos();

    let x = (co * cw - so * sw * ci) * v.x + (-co * sw - so * cw * ci) * v.y;
    let y = (so * cw + co * sw * ci) * v.x + (-so * sw + co * cw * ci) * v.y;
    let z = (sw * si) * v.x + (cw * si) * v.y;
    Vector3d::new(x, y, z)
}

fn solve_elliptic_anomaly(mean_anomaly: f64, e: f64) -> f64 {
    let mut ecc = if e > 0.8 { std::f64::consts::PI } else { mean_anomaly };
    for _ in 0..KEPLER_MAX_ITERATIONS {
        let delta = (ecc - e * ecc.sin() - mean_anomaly) / (1.0 - e * ecc.cos());
        ecc -= delta;
        if delta.abs() < KEPLER_TOLERANCE {
            break;
        }
    }
    ecc
}

fn solve_hyperbolic_anomaly(mean_anomaly: f64, e: f64) -> f64 {
    let mut hyp = (2.0 * mean_anomaly / e).asinh();
    for _ in 0..KEPLER_MAX_ITERATIONS {
        let delta = (e * hyp.sinh() - hyp - mean_anomaly) / (e * hyp.cosh() - 1.0);
        hyp -= delta;
        if delta.abs() < KEPLER_TOLERANCE {
            break;
        }
    }
    hyp
}

fn solve_universal_anomaly(dt: f64, r0: f64, vr0: f64, alpha: f64, sqrt_mu: f64) -> f64 {
    let mut chi = sqrt_mu * alpha.abs() * dt;
    if chi == 0.0 {
        chi = sqrt_mu * dt / r0;
    }
    for _ in 0..KEPLER_MAX_ITERATIONS {
        let z = alpha * chi * chi;
        let (c, s) = stumpff(z);
        let f = r0 * vr0 / sqrt_mu * chi * chi * c + (1.0 - alpha * r0) * chi.powi(3) * s + r0 * chi
            - sqrt_mu * dt;
        let df = r0 * vr0 / sqrt_mu * chi * (1.0 - alpha * chi * chi * s)
            + (1.0 - alpha * r0) * chi * chi * c
            + r0;
        let ratio = f / df;
        chi -= ratio;
        if ratio.abs() < KEPLER_TOLERANCE || !chi.is_finite() {
            break;
        }
    }
    chi
}

/// Stumpff functions C(z) and S(z).
fn stumpff(z: f64) -> (f64, f64) {
    if z.abs() < 1e-8 {
        (0.5 - z / 24.0, 1.0 / 6.0 - z / 120.0)
    } else if z > 0.0 {
        let sz = z.sqrt();
        ((1.0 - sz.cos()) / z, (sz - sz.sin()) / sz.powi(3))
    } else {
        let sz = (-z).sqrt();
        ((sz.cosh() - 1.0) / -z, (sz.sinh() - sz) / sz.powi(3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kerbin() -> Arc<CelestialBody> {
        Arc::new(CelestialBody::kerbin())
    }

    fn circular_elements(epoch: f64) -> OrbitalElements {
        OrbitalElements {
            inclination: 0.0,
            eccentricity: 0.0,
            semi_major_axis: 700_000.0,
            longitude_of_ascending_node: 0.0,
            argument_of_periapsis: 0.0,
            mean_anomaly_at_epoch: 0.0,
            epoch,
        }
    }

    #[test]
    fn test_circular_orbit_keeps_radius() {
        let orbit = Orbit::from_elements(circular_elements(100.0), kerbin()).unwrap();
        for dt in [0.0, 60.0, 600.0, 1800.0] {
            let r = orbit.relative_position_at_ut(100.0 + dt).magnitude();
            assert!((r - 700_000.0).abs() < 1e-3, "radius drifted to {r}");
        }
    }

    #[test]
    fn test_full_period_returns_to_start() {
        let body = kerbin();
        let a: f64 = 700_000.0;
        let period = std::f64::consts::TAU * (a.powi(3) / body.gravitational_parameter).sqrt();
        let elements = OrbitalElements {
            eccentricity: 0.2,
            inclination: 28.0,
            longitude_of_ascending_node: 40.0,
            argument_of_periapsis: 15.0,
            mean_anomaly_at_epoch: 1.0,
            ..circular_elements(0.0)
        };
        let orbit = Orbit::from_elements(elements, body).unwrap();
        let start = orbit.relative_position_at_ut(0.0);
        let end = orbit.relative_position_at_ut(period);
        assert!(start.distance(end) < 1e-2, "drift {}", start.distance(end));
    }

    #[test]
    fn test_state_vector_roundtrip_at_epoch() {
        let orbit = Orbit::from_elements(circular_elements(50.0), kerbin()).unwrap();
        let (r, v) = orbit.state_at_epoch();
        let rebuilt = Orbit::from_state_vectors(r, v, kerbin(), 50.0).unwrap();
        let later_a = orbit.relative_position_at_ut(350.0);
        let later_b = rebuilt.relative_position_at_ut(350.0);
        assert!(later_a.distance(later_b) < 1e-6);
    }

    #[test]
    fn test_hyperbolic_orbit_escapes() {
        let elements = OrbitalElements {
            eccentricity: 1.5,
            semi_major_axis: -1_000_000.0,
            ..circular_elements(0.0)
        };
        let orbit = Orbit::from_elements(elements, kerbin()).unwrap();
        assert!(orbit.specific_energy() > 0.0);
        let r0 = orbit.relative_position_at_ut(0.0).magnitude();
        let r1 = orbit.relative_position_at_ut(3600.0).magnitude();
        assert!(r1 > r0);
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        assert_eq!(
            Orbit::from_state_vectors(Vector3d::zero(), Vector3d::zero(), kerbin(), 0.0).unwrap_err(),
            OrbitError::ZeroRadius
        );
        let nan = Vector3d::new(f64::NAN, 0.0, 0.0);
        assert_eq!(
            Orbit::from_state_vectors(nan, Vector3d::zero(), kerbin(), 0.0).unwrap_err(),
            OrbitError::NonFinite
        );
        let parabolic = OrbitalElements { eccentricity: 1.0, ..circular_elements(0.0) };
        assert!(matches!(
            Orbit::from_elements(parabolic, kerbin()),
            Err(OrbitError::Degenerate(_))
        ));
    }
}
