//! # Host Collaborator Interfaces
//!
//! The synchronization core does not own the simulation, the transport or the
//! UI. Everything it needs from the host is expressed here as a small trait,
//! injected as `Arc<dyn Trait>`.
//!
//! | Trait | Provides |
//! |-------|----------|
//! | [`IdentityProvider`] | local participant's display name |
//! | [`SafetyBubble`] | no-interference zone predicate |
//! | [`VesselRemoval`] | kill-list for vessels that must be removed |
//! | [`SimulationClock`] | shared universal time used to stamp messages |
//! | [`MessageSink`] | outgoing message queue of the transport |
//! | [`ScreenMessages`] | single on-screen status line |
//! | [`InputLockManager`] | blocks/unblocks local flight input |
//!
//! A few plain implementations used by the host and the tests live here too.

use crate::math::Vector3d;
use crate::messages::VesselCliMsg;
use crate::types::{PlayerName, VesselId};
use crate::vessel::Vessel;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};

/// Supplies the local participant's name from settings.
pub trait IdentityProvider: Send + Sync {
    fn player_name(&self) -> PlayerName;
}

/// No-interference zone predicate. Automatic lock acquisition is suppressed
/// for vessels inside the zone.
pub trait SafetyBubble: Send + Sync {
    fn is_in_safety_bubble(&self, vessel: &Vessel) -> bool;
}

/// Vessel removal collaborator.
pub trait VesselRemoval: Send + Sync {
    fn add_to_kill_list(&self, vessel_id: VesselId, reason: &str);
    fn will_be_killed(&self, vessel_id: VesselId) -> bool;
}

/// Shared monotonic simulation clock.
pub trait SimulationClock: Send + Sync {
    fn universal_time(&self) -> f64;
}

/// Outgoing side of the transport. Queuing never blocks.
pub trait MessageSink: Send + Sync {
    fn queue_outgoing(&self, message: VesselCliMsg);
}

/// Handle of a posted screen message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScreenMessageHandle(pub u64);

/// The single on-screen status line.
pub trait ScreenMessages: Send + Sync {
    fn post(&self, text: &str, duration: Duration) -> ScreenMessageHandle;
    /// Expires a previously posted message immediately.
    fn expire(&self, handle: ScreenMessageHandle);
}

/// Local input blocking, keyed by a lock name.
pub trait InputLockManager: Send + Sync {
    fn set_control_lock(&self, lock_name: &str);
    fn remove_control_lock(&self, lock_name: &str);
}

/// Fixed participant name.
#[derive(Debug, Clone)]
pub struct StaticIdentity(pub PlayerName);

impl IdentityProvider for StaticIdentity {
    fn player_name(&self) -> PlayerName {
        self.0.clone()
    }
}

/// Predicate that never matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSafetyBubble;

impl SafetyBubble for NoSafetyBubble {
    fn is_in_safety_bubble(&self, _vessel: &Vessel) -> bool {
        false
    }
}

/// Spherical bubble around a fixed world point (typically the launch site).
#[derive(Debug, Clone)]
pub struct SphericalSafetyBubble {
    pub center: Vector3d,
    pub radius: f64,
}

impl SphericalSafetyBubble {
    pub fn new(center: Vector3d, radius: f64) -> Self {
        Self { center, radius }
    }

    pub fn contains(&self, position: Vector3d) -> bool {
        self.center.distance(position) <= self.radius
    }
}

impl SafetyBubble for SphericalSafetyBubble {
    fn is_in_safety_bubble(&self, vessel: &Vessel) -> bool {
        self.contains(vessel.position)
    }
}

/// In-memory kill list.
#[derive(Debug, Default)]
pub struct KillList {
    entries: Mutex<HashMap<VesselId, String>>,
}

impl KillList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns every pending entry.
    pub fn drain(&self) -> Vec<(VesselId, String)> {
        match self.entries.lock() {
            Ok(mut entries) => entries.drain().collect(),
            Err(poisoned) => poisoned.into_inner().drain().collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self.entries.lock() {
            Ok(entries) => entries.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl VesselRemoval for KillList {
    fn add_to_kill_list(&self, vessel_id: VesselId, reason: &str) {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        debug!(vessel_id = %vessel_id, reason, "Vessel added to kill list");
        entries.insert(vessel_id, reason.to_string());
    }

    fn will_be_killed(&self, vessel_id: VesselId) -> bool {
        match self.entries.lock() {
            Ok(entries) => entries.contains_key(&vessel_id),
            Err(poisoned) => poisoned.into_inner().contains_key(&vessel_id),
        }
    }
}

/// Screen message sink that writes the status line to the log.
#[derive(Debug, Default)]
pub struct LogScreenMessages {
    next_handle: Mutex<u64>,
}

impl ScreenMessages for LogScreenMessages {
    fn post(&self, text: &str, duration: Duration) -> ScreenMessageHandle {
        let mut next = match self.next_handle.lock() {
            Ok(next) => next,
            Err(poisoned) => poisoned.into_inner(),
        };
        *next += 1;
        info!("📺 {} ({}s)", text, duration.as_secs_f32());
        ScreenMessageHandle(*next)
    }

    fn expire(&self, _handle: ScreenMessageHandle) {}
}

/// Input lock manager that only tracks which locks are active.
#[derive(Debug, Default)]
pub struct TrackingInputLocks {
    active: Mutex<Vec<String>>,
}

impl TrackingInputLocks {
    pub fn is_locked(&self, lock_name: &str) -> bool {
        self.active
            .lock()
            .map(|active| active.iter().any(|l| l == lock_name))
            .unwrap_or(false)
    }
}

impl InputLockManager for TrackingInputLocks {
    fn set_control_lock(&self, lock_name: &str) {
        if let Ok(mut active) = self.active.lock() {
            if !active.iter().any(|l| l == lock_name) {
                active.push(lock_name.to_string());
            }
        }
    }

    fn remove_control_lock(&self, lock_name: &str) {
        if let Ok(mut active) = self.active.lock() {
            active.retain(|l| l != lock_name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_kill_list_survives_poisoned_lock() {
        let kill_list = Arc::new(KillList::new());
        let first = VesselId::new();
        kill_list.add_to_kill_list(first, "before");

        let poisoner = kill_list.clone();
        let result = std::thread::spawn(move || {
            let _guard = poisoner.entries.lock().unwrap();
            panic!("panicked while holding the kill list");
        })
        .join();
        assert!(result.is_err());
        assert!(kill_list.entries.is_poisoned());

        let debris = VesselId::new();
        kill_list.add_to_kill_list(debris, "Serialization of debris failed");
        assert!(kill_list.will_be_killed(debris));
        assert_eq!(kill_list.len(), 2);

        let mut drained = kill_list.drain();
        drained.sort();
        let mut expected = vec![(first, "before".to_string()), (debris, "Serialization of debris failed".to_string())];
        expected.sort();
        assert_eq!(drained, expected);
    }

    #[test]
    fn test_spherical_bubble_contains() {
        let bubble = SphericalSafetyBubble::new(Vector3d::new(10.0, 0.0, 0.0), 5.0);
        assert!(bubble.contains(Vector3d::new(14.0, 0.0, 0.0)));
        assert!(!bubble.contains(Vector3d::new(16.0, 0.0, 0.0)));
    }
}
