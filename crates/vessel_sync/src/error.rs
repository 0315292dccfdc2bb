//! Error types for the synchronization core.
//!
//! None of these are fatal: every failure degrades to "this vessel is not
//! synchronized this cycle". Public entry points log and swallow them.

use crate::types::VesselId;

/// Failures building or propagating an orbit.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrbitError {
    /// A state vector or element contained NaN or infinity
    #[error("orbit input is not finite")]
    NonFinite,

    /// Position coincides with the body center
    #[error("orbit position is at the body center")]
    ZeroRadius,

    /// The reference body has no gravity
    #[error("reference body '{0}' has a non-positive gravitational parameter")]
    NoGravity(String),

    /// Parabolic or otherwise degenerate conic
    #[error("degenerate orbit: {0}")]
    Degenerate(String),
}

/// Reasons a proto vessel was not transmitted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProtoSendError {
    /// Producer artifact (flags emit vessels without an id)
    #[error("proto vessel has an empty id")]
    EmptyId,

    /// Producer artifact, not a transmission error
    #[error("proto vessel {0} has no name")]
    MissingName(VesselId),

    /// Serializer produced zero bytes
    #[error("serialization of vessel {0} produced no data")]
    EmptySerialization(VesselId),

    /// Serialized form does not fit the shared buffer
    #[error("vessel {vessel_id} does not fit the {capacity} byte serialization buffer")]
    Oversized { vessel_id: VesselId, capacity: usize },

    /// Serializer failed for a reason other than size
    #[error("failed to serialize vessel {vessel_id}: {reason}")]
    Serialization { vessel_id: VesselId, reason: String },

    /// Another caller holds the shared serialization buffer
    #[error("serialization buffer is in use")]
    BufferBusy,

    /// A previous holder panicked inside the critical section
    #[error("serialization buffer is poisoned")]
    BufferPoisoned,
}
