//! Byte-level serialization of proto vessels.

use super::proto_vessel::ProtoVessel;
use crate::error::ProtoSendError;
use std::io::Cursor;

/// Writes a proto vessel into a caller-provided region.
///
/// Implementations are not required to be thread-safe; the sender only calls
/// them from the thread that owns it.
pub trait VesselSerializer {
    /// Serializes `proto` into the front of `buffer` and returns the number
    /// of bytes written. Zero means the serializer produced nothing.
    fn serialize_into(&self, proto: &ProtoVessel, buffer: &mut [u8]) -> Result<usize, ProtoSendError>;
}

/// JSON encoding through `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonVesselSerializer;

impl VesselSerializer for JsonVesselSerializer {
    fn serialize_into(&self, proto: &ProtoVessel, buffer: &mut [u8]) -> Result<usize, ProtoSendError> {
        let capacity = buffer.len();
        let mut cursor = Cursor::new(buffer);
        match serde_json::to_writer(&mut cursor, proto) {
            Ok(()) => Ok(cursor.position() as usize),
            Err(e) if e.is_io() => Err(ProtoSendError::Oversized {
                vessel_id: proto.vessel_id,
                capacity,
            }),
            Err(e) => Err(ProtoSendError::Serialization {
                vessel_id: proto.vessel_id,
                reason: e.to_string(),
            }),
        }
    }
}
