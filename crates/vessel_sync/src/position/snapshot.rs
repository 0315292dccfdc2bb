//! Time-stamped position snapshots received from the Update lock holder.

use crate::math::{CelestialBody, Orbit, QuaternionD, Vector3d};
use crate::types::VesselId;
use crate::vessel::Vessel;
use std::sync::Arc;

/// Immutable physical state of one vessel at `game_time`.
#[derive(Debug, Clone)]
pub struct VesselPositionUpdate {
    pub vessel_id: VesselId,
    /// Simulation time the snapshot was taken at
    pub game_time: f64,
    /// Reference frame the snapshot was taken in
    pub body: Arc<CelestialBody>,
    pub orbit: Orbit,
    /// Raw `[latitude, longitude, altitude]`
    pub lat_lon_alt: [f64; 3],
    /// World position of `lat_lon_alt` at `game_time`
    pub lat_lon_alt_pos: Vector3d,
    pub surface_rel_rotation: QuaternionD,
    pub landed: bool,
    pub splashed: bool,
    pub height_from_terrain: f64,
}

impl VesselPositionUpdate {
    /// Snapshot of an orbiting vessel at its orbit's epoch, with surface
    /// coordinates derived from the orbit.
    pub fn new(vessel_id: VesselId, orbit: Orbit, surface_rel_rotation: QuaternionD) -> Self {
        let game_time = orbit.epoch();
        let body = orbit.reference_body().clone();
        let lat_lon_alt_pos = orbit.position_at_ut(game_time);
        let lat_lon_alt = body.lat_lon_alt(lat_lon_alt_pos, game_time);
        Self {
            vessel_id,
            game_time,
            body,
            orbit,
            lat_lon_alt,
            lat_lon_alt_pos,
            surface_rel_rotation,
            landed: false,
            splashed: false,
            height_from_terrain: lat_lon_alt[2],
        }
    }

    pub fn with_surface_flags(mut self, landed: bool, splashed: bool) -> Self {
        self.landed = landed;
        self.splashed = splashed;
        self
    }

    pub fn with_height_from_terrain(mut self, height: f64) -> Self {
        self.height_from_terrain = height;
        self
    }

    /// Captures the current state of `vessel` at `game_time`.
    pub fn from_vessel(vessel: &Vessel, game_time: f64) -> Self {
        let body = vessel.main_body().clone();
        let lat_lon_alt = [vessel.latitude, vessel.longitude, vessel.altitude];
        let lat_lon_alt_pos = body.world_surface_position(vessel.latitude, vessel.longitude, vessel.altitude, game_time);
        Self {
            vessel_id: vessel.id,
            game_time,
            body,
            orbit: vessel.orbit.clone(),
            lat_lon_alt,
            lat_lon_alt_pos,
            surface_rel_rotation: vessel.srf_rel_rotation,
            landed: vessel.landed,
            splashed: vessel.splashed,
            height_from_terrain: vessel.height_from_terrain,
        }
    }
}
