//! Fairing deployment events.

use crate::context::{MessageSink, SimulationClock};
use crate::messages::{VesselCliMsg, VesselFairingMsgData};
use crate::vessel::Vessel;
use std::sync::Arc;
use tracing::trace;

pub struct VesselFairingsMessageSender {
    sink: Arc<dyn MessageSink>,
    clock: Arc<dyn SimulationClock>,
}

impl VesselFairingsMessageSender {
    pub fn new(sink: Arc<dyn MessageSink>, clock: Arc<dyn SimulationClock>) -> Self {
        Self { sink, clock }
    }

    /// Announces that the fairing of part `part_flight_id` was deployed.
    /// An absent vessel is a no-op.
    pub fn send_fairing_deployed(&self, vessel: Option<&Vessel>, part_flight_id: u32) {
        let Some(vessel) = vessel else {
            return;
        };
        trace!(vessel_id = %vessel.id, part_flight_id, "Sending fairing deployed");
        self.sink.queue_outgoing(VesselCliMsg::Fairing(VesselFairingMsgData {
            game_time: self.clock.universal_time(),
            vessel_id: vessel.id,
            part_flight_id,
        }));
    }
}
