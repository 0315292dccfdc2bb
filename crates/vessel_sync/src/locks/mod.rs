//! Vessel ownership: the advisory lock ledger, the local participant's lock
//! facade and the arbitration loop driving it.

pub mod ledger;
pub mod lock_system;
pub mod vessel_lock_system;

pub use ledger::{LockType, OwnershipLedger};
pub use lock_system::LockSystem;
pub use vessel_lock_system::{LockRoutine, SessionState, VesselLockSystem, SPECTATE_INPUT_LOCK};
