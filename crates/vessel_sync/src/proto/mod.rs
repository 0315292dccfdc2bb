//! Full-state transmission: proto vessel snapshots, the shared serialization
//! buffer, serializers and the message senders.

pub mod buffer;
pub mod fairings;
pub mod proto_vessel;
pub mod sender;
pub mod serializer;

pub use buffer::{BufferLease, SerializationBuffer, MAX_PROTO_BYTES};
pub use fairings::VesselFairingsMessageSender;
pub use proto_vessel::{ProtoOrbit, ProtoPart, ProtoVessel};
pub use sender::{VesselProtoMessageSender, DEBRIS_SERIALIZATION_FAILED};
pub use serializer::{JsonVesselSerializer, VesselSerializer};
