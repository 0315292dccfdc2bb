//! # Vessel Sync
//!
//! Vessel synchronization core for multiplayer sessions layered on top of a
//! single-player flight simulation. Every participant runs the same
//! simulation locally; this crate decides who is authoritative for which
//! vessel and moves vessel state between participants.
//!
//! ## Core Features
//!
//! - **Ownership Ledger**: advisory Control / Update / Spectator locks per
//!   vessel, replicated by broadcasting every local change
//! - **Lock Arbitration Loop**: periodic routines that reclaim abandoned
//!   vessels, follow physical proximity for update authority and keep the
//!   spectating status line up to date
//! - **Position Interpolation**: pure blending of two time-stamped snapshots in
//!   Cartesian state-vector space
//! - **Proto Transmission**: full-state serialization through a single shared,
//!   size-bounded buffer with debris clean-up on failure
//!
//! ## Architecture Overview
//!
//! The core is synchronous and runs on the simulation thread. Everything it
//! needs from the host (identity, clock, transport, UI, input blocking,
//! removal) comes in through the traits in [`context`].
//!
//! ### Locks
//! - [`OwnershipLedger`]: the replicated map, no dependencies
//! - [`LockSystem`]: the ledger bound to the local player and the transport
//! - [`VesselLockSystem`]: the arbitration state machine and its routines
//!
//! ### Positions
//! - [`VesselPositionUpdate`]: one snapshot
//! - [`interpolate`]: the blending function
//! - [`VesselPositionStore`]: per-vessel snapshot queues
//!
//! ### Proto vessels
//! - [`SerializationBuffer`]: the shared buffer, leased without blocking
//! - [`VesselProtoMessageSender`]: backup, serialize, queue
//! - [`VesselFairingsMessageSender`]: fairing events
//!
//! ## Quick Start Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::{Duration, Instant};
//! use vessel_sync::*;
//!
//! struct NullSink;
//! impl MessageSink for NullSink {
//!     fn queue_outgoing(&self, _message: VesselCliMsg) {}
//! }
//!
//! let sink: Arc<dyn MessageSink> = Arc::new(NullSink);
//! let locks = LockSystem::new(PlayerName::from("alice"), sink);
//! let mut arbitration = VesselLockSystem::new(
//!     LockSystemConfig::default(),
//!     locks,
//!     Arc::new(NoSafetyBubble),
//!     Arc::new(LogScreenMessages::default()),
//!     Arc::new(TrackingInputLocks::default()),
//! );
//!
//! let loaded_at = Instant::now();
//! let body = Arc::new(CelestialBody::kerbin());
//! let orbit = Orbit::from_state_vectors(
//!     Vector3d::new(700_000.0, 0.0, 0.0),
//!     Vector3d::new(0.0, 2_246.0, 0.0),
//!     body,
//!     0.0,
//! )?;
//! let vessel = Vessel::new(VesselId::new(), "Probe", VesselType::Probe, orbit);
//! let id = vessel.id;
//!
//! let mut scene = FlightScene::new(loaded_at);
//! scene.insert(vessel);
//! scene.set_active_vessel(id);
//! scene.set_ready(true);
//!
//! arbitration.enable(loaded_at);
//! arbitration.tick(&scene, loaded_at + Duration::from_secs(2));
//! assert!(arbitration.lock_system().holds(id, LockType::Control));
//! # Ok::<(), OrbitError>(())
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod locks;
pub mod math;
pub mod messages;
pub mod position;
pub mod proto;
pub mod scheduler;
pub mod types;
pub mod vessel;

#[cfg(test)]
pub(crate) mod testing;


pub use config::{LockSystemConfig, ProtoConfig};
pub use context::{
    IdentityProvider, InputLockManager, KillList, LogScreenMessages, MessageSink, NoSafetyBubble, SafetyBubble,
    ScreenMessageHandle, ScreenMessages, SimulationClock, SphericalSafetyBubble, StaticIdentity, TrackingInputLocks,
    VesselRemoval,
};
pub use error::{OrbitError, ProtoSendError};
pub use locks::{LockRoutine, LockSystem, LockType, OwnershipLedger, SessionState, VesselLockSystem, SPECTATE_INPUT_LOCK};
pub use math::{Atmosphere, CelestialBody, Orbit, OrbitalElements, QuaternionD, Vector3d};
pub use messages::{LockAction, LockMsgData, VesselCliMsg, VesselFairingMsgData, VesselProtoMsgData};
pub use position::{interpolate, set_vessel_position, VesselDisplayState, VesselPositionStore, VesselPositionUpdate};
pub use proto::{
    JsonVesselSerializer, ProtoVessel, SerializationBuffer, VesselFairingsMessageSender, VesselProtoMessageSender,
    VesselSerializer, MAX_PROTO_BYTES,
};
pub use scheduler::{RoutineDefinition, RoutineScheduler};
pub use types::{PlayerName, Situation, VesselId, VesselState, VesselType};
pub use vessel::{FlightScene, Part, Vessel};
