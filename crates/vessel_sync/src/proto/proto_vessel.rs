//! Full-fidelity vessel snapshot as transmitted to other participants.

use crate::math::{QuaternionD, Vector3d};
use crate::types::{Situation, VesselId, VesselType};
use serde::{Deserialize, Serialize};

/// Orbit as Cartesian state at its epoch, relative to the named body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtoOrbit {
    pub reference_body: String,
    pub epoch: f64,
    pub position: Vector3d,
    pub velocity: Vector3d,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtoPart {
    pub flight_id: u32,
    pub name: String,
    pub fairing_deployed: bool,
}

/// Backup of a vessel, produced by [`crate::vessel::Vessel::backup`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtoVessel {
    pub vessel_id: VesselId,
    pub vessel_name: Option<String>,
    pub vessel_type: VesselType,
    pub situation: Situation,
    pub landed: bool,
    pub splashed: bool,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub height_from_terrain: f64,
    pub orbit: ProtoOrbit,
    pub rotation: QuaternionD,
    pub srf_rel_rotation: QuaternionD,
    pub parts: Vec<ProtoPart>,
}

impl ProtoVessel {
    pub fn is_debris(&self) -> bool {
        self.vessel_type == VesselType::Debris
    }
}
