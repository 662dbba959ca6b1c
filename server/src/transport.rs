//! The capability the session layer needs from whatever moves bytes around

use bytes::Bytes;
use std::fmt;

/// Opaque handle for a transport-level connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(pub u64);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer#{}", self.0)
    }
}

/// Connection lifecycle and data events delivered by a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Connect(PeerId),
    Receive(PeerId, Bytes),
    Disconnect(PeerId),
    DisconnectTimeout(PeerId),
}

/// Outbound half of a transport
///
/// Both calls are fire-and-forget: ownership of `packet` moves to the
/// transport and nothing waits for delivery.
pub trait Transport {
    fn send(&mut self, peer: PeerId, packet: Bytes, reliable: bool);

    fn disconnect(&mut self, peer: PeerId);
}
