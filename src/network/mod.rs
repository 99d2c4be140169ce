//! Peer-to-peer message layer: envelopes, typed queues, TCP transport.

pub mod message;
pub mod router;
pub mod transport;

pub use message::{ContentType, ControlAction, ControlMessage, Envelope};
pub use router::{MessageQueues, MessageRouter};
pub use transport::PeerTransport;
