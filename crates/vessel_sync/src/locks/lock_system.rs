//! Local participant's view of the ownership ledger.
//!
//! [`LockSystem`] binds the ledger to the local player name and to the
//! outgoing message sink. Every local operation that changes the ledger is
//! broadcast as a [`LockMsgData`] so remote replicas converge; updates received
//! from other participants are merged with [`LockSystem::apply_remote`] and are
//! never re-broadcast.

use super::ledger::{LockType, OwnershipLedger};
use crate::context::MessageSink;
use crate::messages::{LockAction, LockMsgData, VesselCliMsg};
use crate::types::{PlayerName, VesselId};
use std::sync::Arc;
use tracing::{debug, trace};

pub struct LockSystem {
    ledger: OwnershipLedger,
    player: PlayerName,
    sink: Arc<dyn MessageSink>,
}

impl std::fmt::Debug for LockSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockSystem")
            .field("player", &self.player)
            .field("ledger", &self.ledger)
            .finish()
    }
}

impl LockSystem {
    pub fn new(player: PlayerName, sink: Arc<dyn MessageSink>) -> Self {
        Self {
            ledger: OwnershipLedger::new(),
            player,
            sink,
        }
    }

    pub fn player(&self) -> &PlayerName {
        &self.player
    }

    pub fn ledger(&self) -> &OwnershipLedger {
        &self.ledger
    }

    // --- acquisition ---

    pub fn acquire_control_lock(&mut self, vessel_id: VesselId, force: bool) -> bool {
        self.acquire(vessel_id, LockType::Control, force)
    }

    pub fn acquire_update_lock(&mut self, vessel_id: VesselId, force: bool) -> bool {
        self.acquire(vessel_id, LockType::Update, force)
    }

    /// Marks the local player as spectating `vessel_id`, superseding any
    /// previous spectator lock.
    pub fn acquire_spectator_lock(&mut self, vessel_id: VesselId) -> bool {
        self.acquire(vessel_id, LockType::Spectator, false)
    }

    fn acquire(&mut self, vessel_id: VesselId, lock_type: LockType, force: bool) -> bool {
        if self.ledger.belongs_to(vessel_id, lock_type, &self.player) {
            return true;
        }
        let acquired = self.ledger.acquire(vessel_id, lock_type, &self.player, force);
        if acquired {
            debug!(vessel_id = %vessel_id, ?lock_type, force, "Lock acquired");
            self.broadcast(vessel_id, lock_type, LockAction::Acquire { force });
        }
        acquired
    }

    // --- release ---

    pub fn release_control_lock(&mut self, vessel_id: VesselId) -> bool {
        self.release(vessel_id, LockType::Control)
    }

    pub fn release_update_lock(&mut self, vessel_id: VesselId) -> bool {
        self.release(vessel_id, LockType::Update)
    }

    pub fn release_spectator_lock(&mut self) -> bool {
        match self.ledger.spectating(&self.player) {
            Some(vessel_id) => self.release(vessel_id, LockType::Spectator),
            None => false,
        }
    }

    fn release(&mut self, vessel_id: VesselId, lock_type: LockType) -> bool {
        let released = self.ledger.release(vessel_id, lock_type, &self.player);
        if released {
            debug!(vessel_id = %vessel_id, ?lock_type, "Lock released");
            self.broadcast(vessel_id, lock_type, LockAction::Release);
        }
        released
    }

    /// Releases every control lock the local player holds except the one on
    /// `keep`. Returns the vessels released.
    pub fn release_control_locks_except(&mut self, keep: VesselId) -> Vec<VesselId> {
        let held: Vec<VesselId> = self
            .ledger
            .locks_held_by(&self.player)
            .into_iter()
            .filter(|(id, lock_type)| *lock_type == LockType::Control && *id != keep)
            .map(|(id, _)| id)
            .collect();
        for vessel_id in &held {
            self.release_control_lock(*vessel_id);
        }
        held
    }

    /// Releases every lock the local player holds.
    pub fn release_all_player_locks(&mut self) -> usize {
        let held = self.ledger.locks_held_by(&self.player);
        for (vessel_id, lock_type) in &held {
            self.release(*vessel_id, *lock_type);
        }
        held.len()
    }

    // --- queries ---

    pub fn control_lock_exists(&self, vessel_id: VesselId) -> bool {
        self.ledger.exists(vessel_id, LockType::Control)
    }

    pub fn update_lock_exists(&self, vessel_id: VesselId) -> bool {
        self.ledger.exists(vessel_id, LockType::Update)
    }

    pub fn control_lock_owner(&self, vessel_id: VesselId) -> Option<&PlayerName> {
        self.ledger.query(vessel_id, LockType::Control)
    }

    pub fn update_lock_owner(&self, vessel_id: VesselId) -> Option<&PlayerName> {
        self.ledger.query(vessel_id, LockType::Update)
    }

    pub fn control_lock_belongs_to_player(&self, vessel_id: VesselId, player: &PlayerName) -> bool {
        self.ledger.belongs_to(vessel_id, LockType::Control, player)
    }

    pub fn update_lock_belongs_to_player(&self, vessel_id: VesselId, player: &PlayerName) -> bool {
        self.ledger.belongs_to(vessel_id, LockType::Update, player)
    }

    /// Whether the local player holds `lock_type` on `vessel_id`.
    pub fn holds(&self, vessel_id: VesselId, lock_type: LockType) -> bool {
        self.ledger.belongs_to(vessel_id, lock_type, &self.player)
    }

    pub fn spectators_of(&self, vessel_id: VesselId) -> Vec<&PlayerName> {
        self.ledger.spectators_of(vessel_id)
    }

    /// Vessels whose Update lock the local player holds, sorted.
    pub fn update_locked_vessels(&self) -> Vec<VesselId> {
        self.ledger
            .locks_held_by(&self.player)
            .into_iter()
            .filter(|(_, lock_type)| *lock_type == LockType::Update)
            .map(|(id, _)| id)
            .collect()
    }

    // --- replication ---

    /// Merges a ledger update received from another participant.
    ///
    /// Returns true if the local replica changed.
    pub fn apply_remote(&mut self, msg: &LockMsgData) -> bool {
        let changed = match msg.action {
            LockAction::Acquire { force } => {
                let already_held = self.ledger.belongs_to(msg.vessel_id, msg.lock_type, &msg.player);
                let acquired = self.ledger.acquire(msg.vessel_id, msg.lock_type, &msg.player, force);
                acquired && !already_held
            }
            LockAction::Release => self.ledger.release(msg.vessel_id, msg.lock_type, &msg.player),
        };
        trace!(vessel_id = %msg.vessel_id, lock_type = ?msg.lock_type, player = %msg.player, action = ?msg.action, changed, "Applied remote lock update");
        changed
    }

    /// Drops every lock on a vessel that no longer exists. Not broadcast:
    /// every participant observes the removal on its own.
    pub fn remove_vessel(&mut self, vessel_id: VesselId) -> bool {
        self.ledger.remove_vessel(vessel_id)
    }

    /// Drops every lock held by a participant that left the session.
    pub fn remove_player(&mut self, player: &PlayerName) -> usize {
        let released = self.ledger.remove_player(player);
        if !released.is_empty() {
            debug!(player = %player, count = released.len(), "Dropped locks of departed player");
        }
        released.len()
    }

    fn broadcast(&self, vessel_id: VesselId, lock_type: LockType, action: LockAction) {
        self.sink.queue_outgoing(VesselCliMsg::Lock(LockMsgData {
            vessel_id,
            lock_type,
            player: self.player.clone(),
            action,
        }));
    }
}
