//! Shared fixtures and recording collaborators for unit tests.

use crate::context::{InputLockManager, MessageSink, SafetyBubble, ScreenMessageHandle, ScreenMessages, SimulationClock, VesselRemoval};
use crate::math::{CelestialBody, Orbit, Vector3d};
use crate::messages::{LockMsgData, VesselCliMsg, VesselProtoMsgData};
use crate::types::{VesselId, VesselType};
use crate::vessel::Vessel;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn home_body() -> Arc<CelestialBody> {
    Arc::new(CelestialBody::kerbin())
}

/// Prograde circular orbit in the equatorial plane, starting on +X.
pub fn circular_orbit(body: &Arc<CelestialBody>, radius: f64, epoch: f64) -> Orbit {
    let speed = (body.gravitational_parameter / radius).sqrt();
    Orbit::from_state_vectors(Vector3d::new(radius, 0.0, 0.0), Vector3d::new(0.0, speed, 0.0), body.clone(), epoch)
        .unwrap()
}

pub fn sample_vessel(name: &str) -> Vessel {
    Vessel::new(VesselId::new(), name, VesselType::Ship, circular_orbit(&home_body(), 700_000.0, 0.0))
}

pub fn debris(name: &str) -> Vessel {
    Vessel::new(VesselId::new(), name, VesselType::Debris, circular_orbit(&home_body(), 700_000.0, 0.0))
}

#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub sent: Arc<Mutex<Vec<VesselCliMsg>>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<VesselCliMsg> {
        self.sent.lock().unwrap().clone()
    }

    pub fn protos(&self) -> Vec<VesselProtoMsgData> {
        self.messages()
            .into_iter()
            .filter_map(|m| match m {
                VesselCliMsg::Proto(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn lock_updates(&self) -> Vec<LockMsgData> {
        self.messages()
            .into_iter()
            .filter_map(|m| match m {
                VesselCliMsg::Lock(l) => Some(l),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

impl MessageSink for RecordingSink {
    fn queue_outgoing(&self, message: VesselCliMsg) {
        self.sent.lock().unwrap().push(message);
    }
}

#[derive(Debug, Default, Clone)]
pub struct RecordingRemoval {
    pub entries: Arc<Mutex<Vec<(VesselId, String)>>>,
}

impl RecordingRemoval {
    pub fn killed(&self) -> Vec<(VesselId, String)> {
        self.entries.lock().unwrap().clone()
    }
}

impl VesselRemoval for RecordingRemoval {
    fn add_to_kill_list(&self, vessel_id: VesselId, reason: &str) {
        self.entries.lock().unwrap().push((vessel_id, reason.to_string()));
    }

    fn will_be_killed(&self, vessel_id: VesselId) -> bool {
        self.entries.lock().unwrap().iter().any(|(id, _)| *id == vessel_id)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub f64);

impl SimulationClock for FixedClock {
    fn universal_time(&self) -> f64 {
        self.0
    }
}

#[derive(Debug, Default, Clone)]
pub struct RecordingScreen {
    pub posted: Arc<Mutex<Vec<String>>>,
    pub expired: Arc<Mutex<Vec<ScreenMessageHandle>>>,
}

impl RecordingScreen {
    pub fn posted(&self) -> Vec<String> {
        self.posted.lock().unwrap().clone()
    }

    pub fn expired(&self) -> Vec<ScreenMessageHandle> {
        self.expired.lock().unwrap().clone()
    }
}

impl ScreenMessages for RecordingScreen {
    fn post(&self, text: &str, _duration: Duration) -> ScreenMessageHandle {
        let mut posted = self.posted.lock().unwrap();
        posted.push(text.to_string());
        ScreenMessageHandle(posted.len() as u64)
    }

    fn expire(&self, handle: ScreenMessageHandle) {
        self.expired.lock().unwrap().push(handle);
    }
}

#[derive(Debug, Default, Clone)]
pub struct RecordingInputLocks {
    pub active: Arc<Mutex<HashSet<String>>>,
}

impl RecordingInputLocks {
    pub fn is_locked(&self, name: &str) -> bool {
        self.active.lock().unwrap().contains(name)
    }
}

impl InputLockManager for RecordingInputLocks {
    fn set_control_lock(&self, lock_name: &str) {
        self.active.lock().unwrap().insert(lock_name.to_string());
    }

    fn remove_control_lock(&self, lock_name: &str) {
        self.active.lock().unwrap().remove(lock_name);
    }
}

/// Safety bubble containing an explicit set of vessels.
#[derive(Debug, Default, Clone)]
pub struct ListedBubble {
    pub inside: Arc<Mutex<HashSet<VesselId>>>,
}

impl ListedBubble {
    pub fn enter(&self, vessel_id: VesselId) {
        self.inside.lock().unwrap().insert(vessel_id);
    }
}

impl SafetyBubble for ListedBubble {
    fn is_in_safety_bubble(&self, vessel: &Vessel) -> bool {
        self.inside.lock().unwrap().contains(&vessel.id)
    }
}
