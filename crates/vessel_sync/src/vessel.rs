//! # Vessel Model
//!
//! The slice of the simulation's entity model the synchronization core reads
//! and writes, plus [`FlightScene`], the set of vessels in the current flight
//! scene with the active (piloted) one marked.

use crate::math::{CelestialBody, Orbit, QuaternionD, Vector3d};
use crate::proto::{ProtoOrbit, ProtoPart, ProtoVessel};
use crate::types::{Situation, VesselId, VesselState, VesselType};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A part of a vessel, as far as synchronization cares.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub flight_id: u32,
    pub name: String,
    pub fairing_deployed: bool,
}

impl Part {
    pub fn new(flight_id: u32, name: impl Into<String>) -> Self {
        Self {
            flight_id,
            name: name.into(),
            fairing_deployed: false,
        }
    }
}

/// Simulated vessel.
#[derive(Debug, Clone)]
pub struct Vessel {
    pub id: VesselId,
    /// `None` for producer artifacts that never got a name
    pub name: Option<String>,
    pub vessel_type: VesselType,
    pub state: VesselState,
    /// Within physics range of the local participant
    pub loaded: bool,
    pub situation: Situation,
    pub landed: bool,
    pub splashed: bool,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub orbit: Orbit,
    /// Rotation relative to the body's rotating surface frame
    pub srf_rel_rotation: QuaternionD,
    /// World rotation
    pub rotation: QuaternionD,
    /// World position
    pub position: Vector3d,
    pub static_pressure_kpa: f64,
    pub height_from_terrain: f64,
    pub parts: Vec<Part>,
}

impl Vessel {
    /// Creates a loaded, active vessel following `orbit`, placed at the orbit's
    /// epoch position.
    pub fn new(id: VesselId, name: impl Into<String>, vessel_type: VesselType, orbit: Orbit) -> Self {
        let epoch = orbit.epoch();
        let position = orbit.position_at_ut(epoch);
        let [latitude, longitude, altitude] = orbit.reference_body().lat_lon_alt(position, epoch);
        Self {
            id,
            name: Some(name.into()),
            vessel_type,
            state: VesselState::Active,
            loaded: true,
            situation: Situation::Orbiting,
            landed: false,
            splashed: false,
            latitude,
            longitude,
            altitude,
            orbit,
            srf_rel_rotation: QuaternionD::identity(),
            rotation: QuaternionD::identity(),
            position,
            static_pressure_kpa: 0.0,
            height_from_terrain: altitude,
            parts: Vec::new(),
        }
    }

    pub fn is_eva(&self) -> bool {
        self.vessel_type == VesselType::Eva
    }

    pub fn is_dead(&self) -> bool {
        self.state == VesselState::Dead
    }

    pub fn landed_or_splashed(&self) -> bool {
        self.landed || self.splashed
    }

    pub fn main_body(&self) -> &Arc<CelestialBody> {
        self.orbit.reference_body()
    }

    pub fn part(&self, flight_id: u32) -> Option<&Part> {
        self.parts.iter().find(|p| p.flight_id == flight_id)
    }

    /// Captures a full-fidelity snapshot of the vessel for transmission.
    pub fn backup(&self) -> ProtoVessel {
        let (position, velocity) = self.orbit.state_at_epoch();
        ProtoVessel {
            vessel_id: self.id,
            vessel_name: self.name.clone(),
            vessel_type: self.vessel_type,
            situation: self.situation,
            landed: self.landed,
            splashed: self.splashed,
            latitude: self.latitude,
            longitude: self.longitude,
            altitude: self.altitude,
            height_from_terrain: self.height_from_terrain,
            orbit: ProtoOrbit {
                reference_body: self.main_body().name.clone(),
                epoch: self.orbit.epoch(),
                position,
                velocity,
            },
            rotation: self.rotation,
            srf_rel_rotation: self.srf_rel_rotation,
            parts: self
                .parts
                .iter()
                .map(|p| ProtoPart {
                    flight_id: p.flight_id,
                    name: p.name.clone(),
                    fairing_deployed: p.fairing_deployed,
                })
                .collect(),
        }
    }
}

/// Vessels of the current flight scene.
///
/// Iteration order is stable (sorted by id) so arbitration ticks are
/// deterministic.
#[derive(Debug)]
pub struct FlightScene {
    vessels: BTreeMap<VesselId, Vessel>,
    active_vessel: Option<VesselId>,
    ready: bool,
    loaded_at: Instant,
}

impl FlightScene {
    /// Creates an empty, not yet ready scene that finished loading at `loaded_at`.
    pub fn new(loaded_at: Instant) -> Self {
        Self {
            vessels: BTreeMap::new(),
            active_vessel: None,
            ready: false,
            loaded_at,
        }
    }

    pub fn insert(&mut self, vessel: Vessel) {
        self.vessels.insert(vessel.id, vessel);
    }

    pub fn remove(&mut self, vessel_id: VesselId) -> Option<Vessel> {
        if self.active_vessel == Some(vessel_id) {
            self.active_vessel = None;
        }
        self.vessels.remove(&vessel_id)
    }

    pub fn get(&self, vessel_id: VesselId) -> Option<&Vessel> {
        self.vessels.get(&vessel_id)
    }

    pub fn get_mut(&mut self, vessel_id: VesselId) -> Option<&mut Vessel> {
        self.vessels.get_mut(&vessel_id)
    }

    pub fn contains(&self, vessel_id: VesselId) -> bool {
        self.vessels.contains_key(&vessel_id)
    }

    pub fn vessels(&self) -> impl Iterator<Item = &Vessel> {
        self.vessels.values()
    }

    pub fn vessels_mut(&mut self) -> impl Iterator<Item = &mut Vessel> {
        self.vessels.values_mut()
    }

    pub fn loaded_vessels(&self) -> impl Iterator<Item = &Vessel> {
        self.vessels.values().filter(|v| v.loaded)
    }

    pub fn active_vessel_id(&self) -> Option<VesselId> {
        self.active_vessel
    }

    pub fn active_vessel(&self) -> Option<&Vessel> {
        self.active_vessel.and_then(|id| self.vessels.get(&id))
    }

    /// Switches the active vessel. Returns true if it changed.
    pub fn set_active_vessel(&mut self, vessel_id: VesselId) -> bool {
        if !self.vessels.contains_key(&vessel_id) || self.active_vessel == Some(vessel_id) {
            return false;
        }
        self.active_vessel = Some(vessel_id);
        true
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    pub fn time_since_load(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.loaded_at)
    }

    pub fn len(&self) -> usize {
        self.vessels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vessels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_vessel;

    #[test]
    fn test_backup_carries_identity_and_parts() {
        let mut vessel = sample_vessel("Probe");
        vessel.parts.push(Part::new(7, "fairing"));
        let proto = vessel.backup();

        assert_eq!(proto.vessel_id, vessel.id);
        assert_eq!(proto.vessel_name.as_deref(), Some("Probe"));
        assert_eq!(proto.orbit.reference_body, "Kerbin");
        assert_eq!(proto.parts.len(), 1);
        assert_eq!(vessel.part(7).map(|p| p.name.as_str()), Some("fairing"));
    }

    #[test]
    fn test_removing_active_vessel_clears_it() {
        let vessel = sample_vessel("Active");
        let id = vessel.id;
        let mut scene = FlightScene::new(Instant::now());
        scene.insert(vessel);

        assert!(scene.set_active_vessel(id));
        assert!(!scene.set_active_vessel(id));
        assert!(!scene.set_active_vessel(VesselId::new()));
        assert!(scene.remove(id).is_some());
        assert!(scene.active_vessel().is_none());
        assert!(scene.is_empty());
    }
}
