//! # Core Type Definitions
//!
//! This module contains the identifier and classification types shared by the
//! lock, position and proto subsystems.
//!
//! ## Key Types
//!
//! - [`VesselId`] - Unique identifier for a vessel, stable for its lifetime
//! - [`PlayerName`] - Display name identifying a participant in the session
//! - [`VesselType`] - Kind of vessel (ship, debris, EVA kerbal, ...)
//! - [`VesselState`] - Lifecycle state of a vessel
//! - [`Situation`] - Flight situation, ordered from surface to escape
//!
//! ## Design Principles
//!
//! - **Type Safety**: Wrapper types prevent ID confusion (VesselId vs raw Uuid)
//! - **Serialization**: All types support serde for network transmission

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a vessel in the simulation.
///
/// This is a wrapper around UUID. The nil UUID is treated as "empty": some
/// producers (flags, for example) emit vessels without an identifier and those
/// are never transmitted.
///
/// # Examples
///
/// ```rust
/// use vessel_sync::VesselId;
///
/// let id = VesselId::new();
/// assert!(!id.is_empty());
/// assert!(VesselId::empty().is_empty());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VesselId(pub Uuid);

impl VesselId {
    /// Creates a new random vessel ID using UUID v4.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the empty (nil) vessel ID.
    pub fn empty() -> Self {
        Self(Uuid::nil())
    }

    /// Returns true when this is the nil identifier.
    pub fn is_empty(&self) -> bool {
        self.0.is_nil()
    }

    /// Parses a vessel ID from a string representation.
    ///
    /// # Returns
    ///
    /// Returns `Ok(VesselId)` if the string is a valid UUID, otherwise returns
    /// `Err(uuid::Error)` with details about the parsing failure.
    pub fn from_str(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl std::str::FromStr for VesselId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str(s)
    }
}

impl Default for VesselId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for VesselId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display name of a participant.
///
/// Participants are identified by the name supplied by the settings/identity
/// collaborator; lock holders are recorded by this name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerName(pub String);

impl PlayerName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlayerName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl std::fmt::Display for PlayerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Classification of a vessel.
///
/// Only `Debris` changes pipeline behavior: a debris vessel that cannot be
/// serialized is escalated to the removal collaborator instead of being left
/// unsynchronized forever.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VesselType {
    Debris,
    SpaceObject,
    Probe,
    Relay,
    Rover,
    Lander,
    #[default]
    Ship,
    Plane,
    Station,
    Base,
    Eva,
    Flag,
}


/// Lifecycle state of a vessel as reported by the simulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VesselState {
    Inactive,
    #[default]
    Active,
    Dead,
}


/// Flight situation of a vessel.
///
/// The variants are declared in ascending order so that comparisons such as
/// `situation <= Situation::Flying` select every surface or atmospheric state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Situation {
    Landed,
    Splashed,
    Prelaunch,
    Flying,
    SubOrbital,
    #[default]
    Orbiting,
    Escaping,
    Docked,
}

impl Situation {
    /// Landed, splashed, prelaunch or flying: below the flight threshold where
    /// surface coordinates describe motion better than an orbit does.
    pub fn is_below_flight_threshold(self) -> bool {
        self <= Situation::Flying
    }
}
