pub mod codec;
pub mod frame;
pub mod protocol;

pub use codec::{PacketReader, PacketWriter, WireValue};
pub use frame::{Frame, FrameKind};
pub use protocol::{Command, DecodeError, Message};

pub const MAX_PLAYERS: usize = 8;
/// Slot indices travel as a single byte, so no roster can exceed this
pub const MAX_SLOTS: usize = u8::MAX as usize + 1;
pub const DEFAULT_PORT: u16 = 4545;

pub const FIELD_WIDTH: f32 = 1280.0;
pub const FIELD_HEIGHT: f32 = 800.0;
pub const PLAYER_SIZE: f32 = 10.0;

/// Largest datagram either side expects to receive
pub const MAX_DATAGRAM_SIZE: usize = 64;
