//! Outgoing message shapes produced by the core.
//!
//! Framing, type registration and delivery belong to the transport; these are
//! payloads only.

use crate::locks::LockType;
use crate::proto::MAX_PROTO_BYTES;
use crate::types::{PlayerName, VesselId};
use serde::{Deserialize, Serialize};

/// Full serialized vessel state.
///
/// `data.len()` equals `num_bytes` for every message built with
/// [`set_payload`](Self::set_payload). Received messages are checked by
/// [`payload`](Self::payload).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselProtoMsgData {
    pub game_time: f64,
    pub force_reload: bool,
    pub vessel_id: VesselId,
    pub num_bytes: usize,
    pub data: Vec<u8>,
}

impl VesselProtoMsgData {
    pub fn new(game_time: f64, force_reload: bool, vessel_id: VesselId) -> Self {
        Self {
            game_time,
            force_reload,
            vessel_id,
            num_bytes: 0,
            data: Vec::new(),
        }
    }

    /// Copies `bytes` into the payload, growing the message buffer if needed.
    pub fn set_payload(&mut self, bytes: &[u8]) {
        self.data.clear();
        self.data.extend_from_slice(bytes);
        self.num_bytes = bytes.len();
    }

    /// The payload, or `None` if the declared length disagrees with the data
    /// or exceeds the size ceiling.
    pub fn payload(&self) -> Option<&[u8]> {
        if self.num_bytes != self.data.len() || self.num_bytes > MAX_PROTO_BYTES {
            return None;
        }
        Some(&self.data)
    }
}

/// A fairing on one of the vessel's parts was deployed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselFairingMsgData {
    pub game_time: f64,
    pub vessel_id: VesselId,
    pub part_flight_id: u32,
}

/// Acquire or release of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockAction {
    Acquire { force: bool },
    Release,
}

/// Ledger update broadcast whenever local lock state changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockMsgData {
    pub vessel_id: VesselId,
    pub lock_type: LockType,
    pub player: PlayerName,
    pub action: LockAction,
}

/// Every message the core hands to the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VesselCliMsg {
    Proto(VesselProtoMsgData),
    Fairing(VesselFairingMsgData),
    Lock(LockMsgData),
}

impl VesselCliMsg {
    pub fn vessel_id(&self) -> VesselId {
        match self {
            VesselCliMsg::Proto(m) => m.vessel_id,
            VesselCliMsg::Fairing(m) => m.vessel_id,
            VesselCliMsg::Lock(m) => m.vessel_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            VesselCliMsg::Proto(_) => "proto",
            VesselCliMsg::Fairing(_) => "fairing",
            VesselCliMsg::Lock(_) => "lock",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_payload_reuses_and_trims() {
        let mut msg = VesselProtoMsgData::new(0.0, false, VesselId::new());
        msg.set_payload(&[1, 2, 3, 4, 5]);
        assert_eq!(msg.num_bytes, 5);
        msg.set_payload(&[9, 9]);
        assert_eq!(msg.num_bytes, 2);
        assert_eq!(msg.data, vec![9, 9]);
        assert_eq!(msg.payload(), Some(&[9u8, 9][..]));
    }

    #[test]
    fn test_inconsistent_received_payload_is_rejected() {
        let id = VesselId::new();
        let json = format!(
            r#"{{"game_time":1.0,"force_reload":false,"vessel_id":"{}","num_bytes":10,"data":[1,2,3]}}"#,
            id
        );
        let msg: VesselProtoMsgData = serde_json::from_str(&json).unwrap();
        assert_eq!(msg.payload(), None);

        let short = VesselProtoMsgData {
            num_bytes: 1,
            ..msg.clone()
        };
        assert_eq!(short.payload(), None);

        let matching = VesselProtoMsgData { num_bytes: 3, ..msg };
        assert_eq!(matching.payload(), Some(&[1u8, 2, 3][..]));
    }
}
