//! Datagram framing used by the UDP transport
//!
//! Each datagram carries a one-byte frame kind. Only `Data` frames have a body,
//! which is a single protocol message.

use bytes::{Bytes, BytesMut};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameKind {
    Connect = 0,
    Data = 1,
    Disconnect = 2,
    Keepalive = 3,
}

impl FrameKind {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(FrameKind::Connect),
            1 => Some(FrameKind::Data),
            2 => Some(FrameKind::Disconnect),
            3 => Some(FrameKind::Keepalive),
            _ => None,
        }
    }
}

/// A parsed datagram
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Connect,
    Data(Bytes),
    Disconnect,
    Keepalive,
}

impl Frame {
    pub fn kind(&self) -> FrameKind {
        match self {
            Frame::Connect => FrameKind::Connect,
            Frame::Data(_) => FrameKind::Data,
            Frame::Disconnect => FrameKind::Disconnect,
            Frame::Keepalive => FrameKind::Keepalive,
        }
    }

    pub fn encode(&self) -> Bytes {
        let body = match self {
            Frame::Data(payload) => &payload[..],
            _ => &[][..],
        };

        let mut buffer = BytesMut::with_capacity(1 + body.len());
        buffer.extend_from_slice(&[self.kind() as u8]);
        buffer.extend_from_slice(body);
        buffer.freeze()
    }

    /// Parses a datagram, returning `None` for an empty datagram or an
    /// unknown frame kind.
    pub fn decode(datagram: &[u8]) -> Option<Self> {
        let (&kind, body) = datagram.split_first()?;

        let frame = match FrameKind::from_byte(kind)? {
            FrameKind::Connect => Frame::Connect,
            FrameKind::Data => Frame::Data(Bytes::copy_from_slice(body)),
            FrameKind::Disconnect => Frame::Disconnect,
            FrameKind::Keepalive => Frame::Keepalive,
        };

        Some(frame)
    }
}
