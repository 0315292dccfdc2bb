//! Vector, rotation and orbit primitives.
//!
//! This is the minimal stand-in for the simulation's own math library: just
//! enough to convert orbits to and from Cartesian state, evaluate them at a
//! given time, and place points on a rotating body.

pub mod body;
pub mod orbit;
pub mod quaternion;
pub mod vector;

pub use body::{Atmosphere, CelestialBody};
pub use orbit::{Orbit, OrbitalElements};
pub use quaternion::QuaternionD;
pub use vector::{lerp, Vector3d};
