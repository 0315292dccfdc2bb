//! Position interpolation of vessels updated by other participants.

pub mod positioner;
pub mod snapshot;
pub mod store;

pub use positioner::{effective_percentage, interpolate, set_vessel_position, VesselDisplayState};
pub use snapshot::VesselPositionUpdate;
pub use store::VesselPositionStore;
