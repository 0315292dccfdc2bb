//! # Proto Vessel Sender
//!
//! Serializes full vessel snapshots through the shared
//! [`SerializationBuffer`] and queues them as [`VesselProtoMsgData`].
//!
//! The serializer is not thread-safe, so the sender is deliberately `!Send`:
//! it lives on the simulation thread and is never handed to a worker pool,
//! even though serialization is the most expensive step here.
//!
//! Failures never propagate to the tick loop. Dead vessels, vessels pending
//! removal, empty ids and missing names are dropped quietly; a debris vessel
//! that cannot be serialized is put on the kill list instead of staying
//! undeliverable forever.

use super::buffer::SerializationBuffer;
use super::proto_vessel::ProtoVessel;
use super::serializer::VesselSerializer;
use crate::context::{MessageSink, SimulationClock, VesselRemoval};
use crate::error::ProtoSendError;
use crate::messages::{VesselCliMsg, VesselProtoMsgData};
use crate::vessel::Vessel;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Kill-list reason for debris that failed to serialize.
pub const DEBRIS_SERIALIZATION_FAILED: &str = "Serialization of debris failed";

pub struct VesselProtoMessageSender {
    buffer: Arc<SerializationBuffer>,
    serializer: Box<dyn VesselSerializer>,
    sink: Arc<dyn MessageSink>,
    removal: Arc<dyn VesselRemoval>,
    clock: Arc<dyn SimulationClock>,
    _single_thread: PhantomData<Rc<()>>,
}

impl VesselProtoMessageSender {
    pub fn new(
        buffer: Arc<SerializationBuffer>,
        serializer: Box<dyn VesselSerializer>,
        sink: Arc<dyn MessageSink>,
        removal: Arc<dyn VesselRemoval>,
        clock: Arc<dyn SimulationClock>,
    ) -> Self {
        Self {
            buffer,
            serializer,
            sink,
            removal,
            clock,
            _single_thread: PhantomData,
        }
    }

    /// Sends every vessel without asking receivers to reload.
    pub fn send_vessel_messages<'a>(&self, vessels: impl IntoIterator<Item = &'a Vessel>) {
        for vessel in vessels {
            self.send_vessel_message(Some(vessel), false);
        }
    }

    /// Backs up and sends one vessel. Absent, dead and doomed vessels are
    /// skipped.
    pub fn send_vessel_message(&self, vessel: Option<&Vessel>, force_reload: bool) {
        let Some(vessel) = vessel else {
            return;
        };
        if vessel.is_dead() || self.removal.will_be_killed(vessel.id) {
            trace!(vessel_id = %vessel.id, "Skipping proto of dead or doomed vessel");
            return;
        }

        let proto = vessel.backup();
        match self.send_proto_vessel(&proto, force_reload) {
            Ok(num_bytes) => trace!(vessel_id = %proto.vessel_id, num_bytes, "Queued proto vessel"),
            Err(e @ (ProtoSendError::EmptyId | ProtoSendError::MissingName(_))) => {
                debug!("Dropped proto vessel: {}", e)
            }
            Err(e) => warn!("Proto vessel not sent: {}", e),
        }
    }

    /// Serializes `proto` and queues it. Returns the payload size.
    ///
    /// The shared buffer is held only while serializing and copying; the
    /// queued message owns an exactly-sized copy of the output.
    pub fn send_proto_vessel(&self, proto: &ProtoVessel, force_reload: bool) -> Result<usize, ProtoSendError> {
        if proto.vessel_id.is_empty() {
            return Err(ProtoSendError::EmptyId);
        }
        if proto.vessel_name.is_none() {
            return Err(ProtoSendError::MissingName(proto.vessel_id));
        }

        let mut msg = VesselProtoMsgData::new(self.clock.universal_time(), force_reload, proto.vessel_id);
        {
            let mut lease = self.buffer.lease()?;
            let written = self
                .serializer
                .serialize_into(proto, lease.writable())
                .and_then(|n| match n {
                    0 => Err(ProtoSendError::EmptySerialization(proto.vessel_id)),
                    n => Ok(n),
                });

            match written {
                Ok(n) => msg.set_payload(lease.commit(n)),
                Err(e) => {
                    if proto.is_debris() {
                        warn!(
                            vessel_id = %proto.vessel_id,
                            name = proto.vessel_name.as_deref().unwrap_or_default(),
                            "Serialization of debris failed, adding to kill list"
                        );
                        self.removal.add_to_kill_list(proto.vessel_id, DEBRIS_SERIALIZATION_FAILED);
                    }
                    return Err(e);
                }
            }
        }

        let num_bytes = msg.num_bytes;
        self.sink.queue_outgoing(VesselCliMsg::Proto(msg));
        Ok(num_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::JsonVesselSerializer;
    use crate::testing::{debris, sample_vessel, RecordingRemoval, RecordingSink, FixedClock};
    use crate::types::VesselId;

    fn sender(capacity: usize) -> (VesselProtoMessageSender, Arc<RecordingSink>, Arc<RecordingRemoval>) {
        let sink = Arc::new(RecordingSink::default());
        let removal = Arc::new(RecordingRemoval::default());
        let sender = VesselProtoMessageSender::new(
            Arc::new(SerializationBuffer::new(capacity)),
            Box::new(JsonVesselSerializer),
            sink.clone(),
            removal.clone(),
            Arc::new(FixedClock(42.0)),
        );
        (sender, sink, removal)
    }

    #[test]
    fn test_payload_matches_declared_length() {
        let (sender, sink, _) = sender(64 * 1024);
        let vessel = sample_vessel("Probe");

        sender.send_vessel_message(Some(&vessel), true);

        let sent = sink.protos();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].num_bytes, sent[0].data.len());
        assert_eq!(sent[0].game_time, 42.0);
        assert!(sent[0].force_reload);
        let decoded: ProtoVessel = serde_json::from_slice(&sent[0].data).unwrap();
        assert_eq!(decoded.vessel_id, vessel.id);
    }

    #[test]
    fn test_missing_name_is_rejected() {
        let (sender, sink, _) = sender(64 * 1024);
        let mut proto = sample_vessel("Flag").backup();
        proto.vessel_name = None;

        assert_eq!(
            sender.send_proto_vessel(&proto, false),
            Err(ProtoSendError::MissingName(proto.vessel_id))
        );
        proto.vessel_id = VesselId::empty();
        assert_eq!(sender.send_proto_vessel(&proto, false), Err(ProtoSendError::EmptyId));
        assert!(sink.messages().is_empty());
    }

    #[test]
    fn test_oversized_non_debris_is_dropped_without_kill() {
        let (sender, sink, removal) = sender(16);
        let vessel = sample_vessel("Big ship");

        sender.send_vessel_message(Some(&vessel), false);
        assert!(sink.messages().is_empty());
        assert!(removal.killed().is_empty());
    }

    #[test]
    fn test_oversized_debris_is_killed() {
        let (sender, sink, removal) = sender(16);
        let vessel = debris("Fragment");

        sender.send_vessel_message(Some(&vessel), false);
        assert!(sink.messages().is_empty());
        assert_eq!(removal.killed(), vec![(vessel.id, DEBRIS_SERIALIZATION_FAILED.to_string())]);
    }

    #[test]
    fn test_dead_and_doomed_vessels_are_skipped() {
        let (sender, sink, removal) = sender(64 * 1024);
        let mut dead = sample_vessel("Dead");
        dead.state = crate::types::VesselState::Dead;
        let doomed = sample_vessel("Doomed");
        removal.add_to_kill_list(doomed.id, "test");

        sender.send_vessel_message(None, false);
        sender.send_vessel_messages([&dead, &doomed]);
        assert!(sink.messages().is_empty());
    }

    #[test]
    fn test_busy_buffer_is_reported() {
        let buffer = Arc::new(SerializationBuffer::new(1024));
        let sink = Arc::new(RecordingSink::default());
        let sender = VesselProtoMessageSender::new(
            buffer.clone(),
            Box::new(JsonVesselSerializer),
            sink.clone(),
            Arc::new(RecordingRemoval::default()),
            Arc::new(FixedClock(0.0)),
        );
        let _held = buffer.lease().unwrap();

        let proto = sample_vessel("Probe").backup();
        assert_eq!(sender.send_proto_vessel(&proto, false), Err(ProtoSendError::BufferBusy));
        assert!(sink.messages().is_empty());
    }
}
