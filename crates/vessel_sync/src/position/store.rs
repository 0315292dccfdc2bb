//! Per-vessel snapshot queues feeding the interpolation engine.

use super::positioner::set_vessel_position;
use super::snapshot::VesselPositionUpdate;
use crate::locks::{LockSystem, LockType};
use crate::types::VesselId;
use crate::vessel::FlightScene;
use std::collections::{HashMap, VecDeque};
use tracing::trace;

#[derive(Debug, Clone)]
struct PositionEntry {
    update: VesselPositionUpdate,
    target: VesselPositionUpdate,
    /// Newer snapshots waiting their turn, ordered by game time
    pending: VecDeque<VesselPositionUpdate>,
}

impl PositionEntry {
    fn new(snapshot: VesselPositionUpdate) -> Self {
        Self {
            update: snapshot.clone(),
            target: snapshot,
            pending: VecDeque::new(),
        }
    }

    fn is_single(&self) -> bool {
        self.update.game_time == self.target.game_time && self.pending.is_empty()
    }

    fn advance(&mut self, universal_time: f64) {
        while universal_time >= self.target.game_time {
            let Some(next) = self.pending.pop_front() else {
                break;
            };
            self.update = std::mem::replace(&mut self.target, next);
        }
    }

    fn percentage(&self, universal_time: f64) -> f64 {
        let span = self.target.game_time - self.update.game_time;
        if span <= 0.0 {
            return 1.0;
        }
        let t = (universal_time - self.update.game_time) / span;
        if t.is_nan() {
            0.0
        } else {
            t.clamp(0.0, 1.0)
        }
    }
}

/// Snapshot store of every remotely-updated vessel.
#[derive(Debug, Clone, Default)]
pub struct VesselPositionStore {
    entries: HashMap<VesselId, PositionEntry>,
}

impl VesselPositionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a received snapshot. Returns false if it was older than the
    /// current target and dropped.
    pub fn push(&mut self, snapshot: VesselPositionUpdate) -> bool {
        let vessel_id = snapshot.vessel_id;
        let Some(entry) = self.entries.get_mut(&vessel_id) else {
            self.entries.insert(vessel_id, PositionEntry::new(snapshot));
            return true;
        };

        if snapshot.game_time <= entry.target.game_time {
            trace!(vessel_id = %vessel_id, game_time = snapshot.game_time, "Dropping stale position snapshot");
            return false;
        }

        if entry.is_single() {
            entry.update = std::mem::replace(&mut entry.target, snapshot);
            return true;
        }

        let index = entry
            .pending
            .iter()
            .position(|p| p.game_time >= snapshot.game_time)
            .unwrap_or(entry.pending.len());
        if entry.pending.get(index).is_some_and(|p| p.game_time == snapshot.game_time) {
            entry.pending[index] = snapshot;
        } else {
            entry.pending.insert(index, snapshot);
        }
        true
    }

    /// Fraction of the current interval of `vessel_id` reached at
    /// `universal_time`, advancing to the next interval once the target is
    /// reached.
    pub fn percentage(&mut self, vessel_id: VesselId, universal_time: f64) -> Option<f64> {
        let entry = self.entries.get_mut(&vessel_id)?;
        entry.advance(universal_time);
        Some(entry.percentage(universal_time))
    }

    /// Current `(update, target)` pair of a vessel.
    pub fn interval(&self, vessel_id: VesselId) -> Option<(&VesselPositionUpdate, &VesselPositionUpdate)> {
        self.entries.get(&vessel_id).map(|e| (&e.update, &e.target))
    }

    /// Interpolates every tracked vessel present in `scene`, except the ones
    /// the local player broadcasts. Entries of vessels gone from `scene` are
    /// dropped. Returns how many were positioned.
    pub fn apply_all(&mut self, scene: &mut FlightScene, locks: &LockSystem, universal_time: f64) -> usize {
        let mut ids: Vec<VesselId> = self.entries.keys().copied().collect();
        ids.sort();

        let mut applied = 0;
        for vessel_id in ids {
            if !scene.contains(vessel_id) {
                trace!(vessel_id = %vessel_id, "Vessel left the scene, dropping its snapshots");
                self.entries.remove(&vessel_id);
                continue;
            }
            if locks.holds(vessel_id, LockType::Update) {
                continue;
            }
            let Some(percentage) = self.percentage(vessel_id, universal_time) else {
                continue;
            };
            let Some(entry) = self.entries.get(&vessel_id) else {
                continue;
            };
            set_vessel_position(scene.get_mut(vessel_id), &entry.update, &entry.target, percentage, universal_time);
            applied += 1;
        }
        applied
    }

    pub fn remove(&mut self, vessel_id: VesselId) -> bool {
        self.entries.remove(&vessel_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
