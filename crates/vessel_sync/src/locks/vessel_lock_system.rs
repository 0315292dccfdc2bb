//! # Lock Arbitration Loop
//!
//! Per-participant state machine deciding which vessels the local player
//! should own. Three routines run on fixed intervals, always in this order
//! within a tick:
//!
//! 1. **Reclaim control** (3 s): while spectating, if nobody holds the Control
//!    lock of the active vessel any more, try (without force) to take it.
//! 2. **Secondary vessel locks** (1 s): take the Update lock of nearby vessels
//!    nobody is broadcasting, and give up the Update locks of vessels we can no
//!    longer observe.
//! 3. **Spectate message** (1 s): keep the "being controlled by" status line
//!    on screen while spectating, and clear it otherwise.
//!
//! Conflicts are never retried inside a tick. A failed acquisition simply
//! waits for the next run of its routine, which bounds staleness to one
//! interval.
//!
//! Spectating mode, the status-line handle and the subscription flag live in
//! [`SessionState`], owned by [`VesselLockSystem`].

use super::lock_system::LockSystem;
use super::LockType;
use crate::config::LockSystemConfig;
use crate::context::{InputLockManager, SafetyBubble, ScreenMessageHandle, ScreenMessages};
use crate::scheduler::{RoutineDefinition, RoutineScheduler};
use crate::types::VesselId;
use crate::vessel::FlightScene;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Input lock name used to block flight controls while spectating.
pub const SPECTATE_INPUT_LOCK: &str = "VesselSync_Spectating";

/// The periodic routines of the arbitration loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockRoutine {
    ReclaimControl,
    SecondaryVesselLocks,
    SpectateMessage,
}

/// Mutable session flags of the local participant.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub enabled: bool,
    pub spectating: bool,
    /// Receiving active-vessel change notifications
    pub subscribed: bool,
    pub spectate_message: Option<ScreenMessageHandle>,
    /// Active vessel seen by the last change notification
    pub observed_active_vessel: Option<VesselId>,
}

pub struct VesselLockSystem {
    config: LockSystemConfig,
    lock_system: LockSystem,
    safety_bubble: Arc<dyn SafetyBubble>,
    screen: Arc<dyn ScreenMessages>,
    input_locks: Arc<dyn InputLockManager>,
    scheduler: RoutineScheduler<LockRoutine>,
    state: SessionState,
}

impl VesselLockSystem {
    pub fn new(
        config: LockSystemConfig,
        lock_system: LockSystem,
        safety_bubble: Arc<dyn SafetyBubble>,
        screen: Arc<dyn ScreenMessages>,
        input_locks: Arc<dyn InputLockManager>,
    ) -> Self {
        Self {
            config,
            lock_system,
            safety_bubble,
            screen,
            input_locks,
            scheduler: RoutineScheduler::new(),
            state: SessionState::default(),
        }
    }

    pub fn lock_system(&self) -> &LockSystem {
        &self.lock_system
    }

    pub fn lock_system_mut(&mut self) -> &mut LockSystem {
        &mut self.lock_system
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_spectating(&self) -> bool {
        self.state.spectating
    }

    pub fn is_enabled(&self) -> bool {
        self.state.enabled
    }

    // --- lifecycle ---

    /// Registers the routines and subscribes to active-vessel changes.
    pub fn enable(&mut self, now: Instant) {
        if self.state.enabled {
            return;
        }
        self.state.enabled = true;
        self.state.subscribed = true;
        self.state.observed_active_vessel = None;

        let routines = [
            (self.config.reclaim_interval(), LockRoutine::ReclaimControl),
            (self.config.secondary_locks_interval(), LockRoutine::SecondaryVesselLocks),
            (self.config.spectate_message_interval(), LockRoutine::SpectateMessage),
        ];
        for (interval, routine) in routines {
            self.scheduler.setup_routine(RoutineDefinition::new(interval, routine), now);
        }
        info!("🔒 Vessel lock system enabled");
    }

    /// Stops every routine, unsubscribes, leaves spectating mode and releases
    /// every lock the local player holds. Nothing fires after this returns.
    pub fn disable(&mut self) {
        if !self.state.enabled {
            return;
        }
        self.scheduler.clear();
        self.state.subscribed = false;
        if self.state.spectating {
            self.stop_spectating();
        }
        if let Some(handle) = self.state.spectate_message.take() {
            self.screen.expire(handle);
        }
        let released = self.lock_system.release_all_player_locks();
        self.state.enabled = false;
        self.state.observed_active_vessel = None;
        info!("🔓 Vessel lock system disabled, released {} locks", released);
    }

    /// Whether routines may act on the scene at `now`.
    pub fn is_ready(&self, scene: &FlightScene, now: Instant) -> bool {
        self.state.enabled
            && scene.is_ready()
            && scene.time_since_load(now) > self.config.scene_settle()
            && scene.active_vessel().is_some()
    }

    /// Runs one frame: delivers a pending active-vessel change, then every
    /// routine due at `now` in order. Returns the routines that were due.
    pub fn tick(&mut self, scene: &FlightScene, now: Instant) -> Vec<LockRoutine> {
        if self.state.subscribed {
            if let Some(active) = scene.active_vessel_id() {
                if self.state.observed_active_vessel != Some(active) {
                    self.on_vessel_change(scene);
                }
            }
        }

        let due = self.scheduler.due(now);
        for routine in &due {
            match routine {
                LockRoutine::ReclaimControl => self.try_get_control_lock(scene, now),
                LockRoutine::SecondaryVesselLocks => self.update_secondary_vessels_locks(scene, now),
                LockRoutine::SpectateMessage => self.update_on_screen_spectate_message(scene, now),
            }
        }
        due
    }

    // --- routines ---

    /// If the controller of the vessel we are spectating let go, try to take
    /// over. Not forced: other spectators may race for it and the first one
    /// wins.
    pub fn try_get_control_lock(&mut self, scene: &FlightScene, now: Instant) {
        if !self.is_ready(scene, now) || !self.state.spectating {
            return;
        }
        let Some(active) = scene.active_vessel_id() else {
            return;
        };
        if !self.lock_system.control_lock_exists(active) {
            debug!(vessel_id = %active, "Controller left, trying to reclaim control");
            self.stop_spectating_and_get_control(active, false);
        }
    }

    /// Takes Update locks of nearby unowned vessels and drops the ones we
    /// should no longer broadcast. Not forced.
    pub fn update_secondary_vessels_locks(&mut self, scene: &FlightScene, now: Instant) {
        if !self.is_ready(scene, now) {
            return;
        }
        for vessel_id in self.valid_secondary_vessel_ids(scene) {
            self.lock_system.acquire_update_lock(vessel_id, false);
        }
        for vessel_id in self.secondary_vessel_ids_to_release(scene) {
            self.lock_system.release_update_lock(vessel_id);
        }
    }

    /// Refreshes the spectating status line, or clears it when not spectating.
    pub fn update_on_screen_spectate_message(&mut self, scene: &FlightScene, now: Instant) {
        if !self.is_ready(scene, now) {
            return;
        }
        if let Some(handle) = self.state.spectate_message.take() {
            self.screen.expire(handle);
        }
        if self.state.spectating {
            let text = self.spectating_message(scene);
            let handle = self.screen.post(&text, self.config.spectate_message_duration());
            self.state.spectate_message = Some(handle);
        }
    }

    // --- transitions ---

    /// Blocks local input and marks the player as spectating the active vessel.
    pub fn start_spectating(&mut self, scene: &FlightScene) {
        self.input_locks.set_control_lock(SPECTATE_INPUT_LOCK);
        if let Some(active) = scene.active_vessel_id() {
            self.lock_system.acquire_spectator_lock(active);
        }
        let was_spectating = std::mem::replace(&mut self.state.spectating, true);
        if !was_spectating {
            info!("👀 {}", self.spectating_message(scene));
        }
    }

    pub fn stop_spectating(&mut self) {
        self.input_locks.remove_control_lock(SPECTATE_INPUT_LOCK);
        self.lock_system.release_spectator_lock();
        if let Some(handle) = self.state.spectate_message.take() {
            self.screen.expire(handle);
        }
        if self.state.spectating {
            info!("🎮 Stopped spectating");
        }
        self.state.spectating = false;
    }

    /// Takes the Update lock and, unless already ours, the Control lock of
    /// `vessel_id`; leaves spectating mode once control is ours.
    ///
    /// Returns whether the local player holds Control afterwards.
    pub fn stop_spectating_and_get_control(&mut self, vessel_id: VesselId, force: bool) -> bool {
        self.lock_system.acquire_update_lock(vessel_id, force);
        if !self.lock_system.holds(vessel_id, LockType::Control) {
            self.lock_system.acquire_control_lock(vessel_id, force);
        }

        let has_control = self.lock_system.holds(vessel_id, LockType::Control);
        if has_control && self.state.spectating {
            self.stop_spectating();
        }
        has_control
    }

    /// Releases our Control locks on every vessel but the active one.
    pub fn drop_all_other_vessel_control_locks(&mut self, scene: &FlightScene) {
        if let Some(active) = scene.active_vessel_id() {
            let released = self.lock_system.release_control_locks_except(active);
            if !released.is_empty() {
                debug!(count = released.len(), "Dropped control of other vessels");
            }
        }
    }

    /// Handles a switch of the active vessel: spectate it if someone else is
    /// flying it, otherwise take control and drop control of everything else.
    pub fn on_vessel_change(&mut self, scene: &FlightScene) {
        if !self.state.subscribed {
            return;
        }
        let Some(active) = scene.active_vessel_id() else {
            return;
        };
        self.state.observed_active_vessel = Some(active);

        let me = self.lock_system.player().clone();
        let controlled_by_other = self
            .lock_system
            .control_lock_owner(active)
            .is_some_and(|owner| *owner != me);

        if controlled_by_other {
            self.start_spectating(scene);
        } else {
            self.stop_spectating_and_get_control(active, true);
            self.drop_all_other_vessel_control_locks(scene);
        }
    }

    // --- selection ---

    /// Loaded, live vessels other than the active one, outside the safety
    /// bubble, that nobody is broadcasting.
    pub fn valid_secondary_vessel_ids(&self, scene: &FlightScene) -> Vec<VesselId> {
        let active = scene.active_vessel_id();
        scene
            .loaded_vessels()
            .filter(|v| {
                !v.is_dead()
                    && Some(v.id) != active
                    && !self.safety_bubble.is_in_safety_bubble(v)
                    && !self.lock_system.update_lock_exists(v.id)
            })
            .map(|v| v.id)
            .collect()
    }

    /// Vessels other than the active one whose Update lock we hold but which
    /// are unloaded, dead, inside the safety bubble or gone from the scene.
    pub fn secondary_vessel_ids_to_release(&self, scene: &FlightScene) -> Vec<VesselId> {
        let active = scene.active_vessel_id();
        self.lock_system
            .update_locked_vessels()
            .into_iter()
            .filter(|id| Some(*id) != active)
            .filter(|id| match scene.get(*id) {
                Some(v) => !v.loaded || v.is_dead() || self.safety_bubble.is_in_safety_bubble(v),
                None => true,
            })
            .collect()
    }

    /// Status line shown while spectating; empty otherwise.
    pub fn spectating_message(&self, scene: &FlightScene) -> String {
        if !self.state.spectating {
            return String::new();
        }
        let owner = scene
            .active_vessel_id()
            .and_then(|id| self.lock_system.control_lock_owner(id))
            .map(|p| p.to_string())
            .unwrap_or_default();
        format!("This vessel is being controlled by {}.", owner)
    }
}

impl std::fmt::Debug for VesselLockSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VesselLockSystem")
            .field("config", &self.config)
            .field("lock_system", &self.lock_system)
            .field("state", &self.state)
            .finish()
    }
}
