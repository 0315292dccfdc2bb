//! # Ownership Ledger
//!
//! In-memory map of vessel id to lock holders per lock category.
//!
//! The ledger is advisory: there is no central authority enforcing it. Each
//! participant keeps a replica, applies its own operations locally and merges
//! the updates it receives from others. Per key the rule is first-writer-wins
//! for plain acquisitions and last-writer-wins for forced ones, so replicas
//! converge once they have seen the same updates in the same arrival order.
//! Until then they may disagree; that window (network latency plus at most
//! one arbitration tick) is an accepted property of the design.
//!
//! No operation blocks. A failed acquisition is retried by the caller on a
//! later tick.
//!
//! The ledger is not synchronized: all local access happens on the simulation
//! thread.

use crate::types::{PlayerName, VesselId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::trace;

/// Lock categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LockType {
    /// Piloting/commanding the vessel
    Control,
    /// Broadcasting the vessel's physical state
    Update,
    /// Passively observing the vessel; one per participant, not per vessel
    Spectator,
}

#[derive(Debug, Clone, Default)]
struct VesselLocks {
    control: Option<PlayerName>,
    update: Option<PlayerName>,
}

impl VesselLocks {
    fn slot(&self, lock_type: LockType) -> Option<&PlayerName> {
        match lock_type {
            LockType::Control => self.control.as_ref(),
            LockType::Update => self.update.as_ref(),
            LockType::Spectator => None,
        }
    }

    fn slot_mut(&mut self, lock_type: LockType) -> Option<&mut Option<PlayerName>> {
        match lock_type {
            LockType::Control => Some(&mut self.control),
            LockType::Update => Some(&mut self.update),
            LockType::Spectator => None,
        }
    }

    fn is_empty(&self) -> bool {
        self.control.is_none() && self.update.is_none()
    }
}

/// Lock holders per vessel and category.
///
/// Control and Update locks have at most one holder per vessel. Spectator locks
/// are stored per participant: acquiring one for a new vessel supersedes the
/// previous one.
#[derive(Debug, Clone, Default)]
pub struct OwnershipLedger {
    vessels: HashMap<VesselId, VesselLocks>,
    spectators: HashMap<PlayerName, VesselId>,
}

impl OwnershipLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to make `player` the holder of `lock_type` on `vessel_id`.
    ///
    /// Without `force` the attempt fails, leaving the ledger untouched, when
    /// another participant already holds the lock. With `force` the requester
    /// always becomes the holder. Re-acquiring a lock one already holds
    /// succeeds without change.
    pub fn acquire(&mut self, vessel_id: VesselId, lock_type: LockType, player: &PlayerName, force: bool) -> bool {
        if lock_type == LockType::Spectator {
            self.spectators.insert(player.clone(), vessel_id);
            return true;
        }

        let locks = self.vessels.entry(vessel_id).or_default();
        let Some(slot) = locks.slot_mut(lock_type) else {
            return false;
        };
        match slot {
            Some(holder) if holder == player => true,
            Some(holder) if !force => {
                trace!(vessel_id = %vessel_id, ?lock_type, holder = %holder, requester = %player, "Lock held by another player");
                false
            }
            _ => {
                *slot = Some(player.clone());
                true
            }
        }
    }

    /// Releases `lock_type` on `vessel_id` if `player` holds it.
    ///
    /// Returns true if the ledger changed; releasing a lock held by someone
    /// else, or by no one, is a no-op.
    pub fn release(&mut self, vessel_id: VesselId, lock_type: LockType, player: &PlayerName) -> bool {
        if lock_type == LockType::Spectator {
            if self.spectators.get(player) == Some(&vessel_id) {
                self.spectators.remove(player);
                return true;
            }
            return false;
        }

        let Some(locks) = self.vessels.get_mut(&vessel_id) else {
            return false;
        };
        let released = match locks.slot_mut(lock_type) {
            Some(slot) if slot.as_ref() == Some(player) => {
                *slot = None;
                true
            }
            _ => false,
        };
        if locks.is_empty() {
            self.vessels.remove(&vessel_id);
        }
        released
    }

    /// Current holder of `lock_type` on `vessel_id`.
    ///
    /// For spectator locks this returns one of the spectators (the smallest
    /// name); use [`OwnershipLedger::spectators_of`] to get all of them.
    pub fn query(&self, vessel_id: VesselId, lock_type: LockType) -> Option<&PlayerName> {
        match lock_type {
            LockType::Spectator => self
                .spectators
                .iter()
                .filter(|(_, v)| **v == vessel_id)
                .map(|(p, _)| p)
                .min(),
            _ => self.vessels.get(&vessel_id).and_then(|l| l.slot(lock_type)),
        }
    }

    pub fn belongs_to(&self, vessel_id: VesselId, lock_type: LockType, player: &PlayerName) -> bool {
        match lock_type {
            LockType::Spectator => self.spectators.get(player) == Some(&vessel_id),
            _ => self.query(vessel_id, lock_type) == Some(player),
        }
    }

    pub fn exists(&self, vessel_id: VesselId, lock_type: LockType) -> bool {
        self.query(vessel_id, lock_type).is_some()
    }

    /// Every participant spectating `vessel_id`, sorted by name.
    pub fn spectators_of(&self, vessel_id: VesselId) -> Vec<&PlayerName> {
        let mut players: Vec<_> = self
            .spectators
            .iter()
            .filter(|(_, v)| **v == vessel_id)
            .map(|(p, _)| p)
            .collect();
        players.sort();
        players
    }

    /// Vessel the player is spectating, if any.
    pub fn spectating(&self, player: &PlayerName) -> Option<VesselId> {
        self.spectators.get(player).copied()
    }

    /// Every `(vessel, category)` the player holds, sorted.
    pub fn locks_held_by(&self, player: &PlayerName) -> Vec<(VesselId, LockType)> {
        let mut held = Vec::new();
        for (id, locks) in &self.vessels {
            if locks.control.as_ref() == Some(player) {
                held.push((*id, LockType::Control));
            }
            if locks.update.as_ref() == Some(player) {
                held.push((*id, LockType::Update));
            }
        }
        if let Some(id) = self.spectators.get(player) {
            held.push((*id, LockType::Spectator));
        }
        held.sort();
        held
    }

    /// Drops every lock on a destroyed or removed vessel.
    pub fn remove_vessel(&mut self, vessel_id: VesselId) -> bool {
        let had_locks = self.vessels.remove(&vessel_id).is_some();
        let before = self.spectators.len();
        self.spectators.retain(|_, v| *v != vessel_id);
        had_locks || before != self.spectators.len()
    }

    /// Drops every lock held by `player`, returning what was released.
    pub fn remove_player(&mut self, player: &PlayerName) -> Vec<(VesselId, LockType)> {
        let held = self.locks_held_by(player);
        for (vessel_id, lock_type) in &held {
            self.release(*vessel_id, *lock_type, player);
        }
        held
    }

    /// Number of vessels with at least one Control or Update holder.
    pub fn len(&self) -> usize {
        self.vessels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vessels.is_empty() && self.spectators.is_empty()
    }
}
