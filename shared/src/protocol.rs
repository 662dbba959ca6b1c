//! Wire messages exchanged between the server and its clients
//!
//! Every message starts with a one-byte command and has a fixed length
//! implied by that command. There is no length prefix, version field or
//! checksum.

use crate::codec::{PacketReader, PacketWriter};
use bytes::Bytes;
use thiserror::Error;

/// Command byte at the start of every message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    /// Server -> client: you are bound to this slot
    AcceptPlayer = 1,
    /// Server -> client: a player is present at this position
    AddPlayer = 2,
    /// Server -> client: a player left
    RemovePlayer = 3,
    /// Server -> client: an existing player moved
    UpdatePlayer = 4,
    /// Client -> server: my new position
    UpdateInput = 5,
}

impl Command {
    /// Total length of a message carrying this command, command byte included
    pub const fn wire_len(self) -> usize {
        match self {
            Command::AcceptPlayer | Command::RemovePlayer => 2,
            Command::AddPlayer | Command::UpdatePlayer => 6,
            Command::UpdateInput => 5,
        }
    }
}

impl TryFrom<u8> for Command {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Command::AcceptPlayer),
            2 => Ok(Command::AddPlayer),
            3 => Ok(Command::RemovePlayer),
            4 => Ok(Command::UpdatePlayer),
            5 => Ok(Command::UpdateInput),
            other => Err(DecodeError::UnknownCommand(other)),
        }
    }
}

/// Why an inbound payload could not be turned into a [`Message`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("empty payload")]
    Empty,
    #[error("unknown command byte {0}")]
    UnknownCommand(u8),
    #[error("{command:?} needs {expected} bytes, got {actual}")]
    Truncated {
        command: Command,
        expected: usize,
        actual: usize,
    },
}

/// A decoded protocol message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    AcceptPlayer { slot: u8 },
    AddPlayer { slot: u8, x: i16, y: i16 },
    RemovePlayer { slot: u8 },
    UpdatePlayer { slot: u8, x: i16, y: i16 },
    UpdateInput { x: i16, y: i16 },
}

impl Message {
    pub fn command(&self) -> Command {
        match self {
            Message::AcceptPlayer { .. } => Command::AcceptPlayer,
            Message::AddPlayer { .. } => Command::AddPlayer,
            Message::RemovePlayer { .. } => Command::RemovePlayer,
            Message::UpdatePlayer { .. } => Command::UpdatePlayer,
            Message::UpdateInput { .. } => Command::UpdateInput,
        }
    }

    pub fn wire_len(&self) -> usize {
        self.command().wire_len()
    }

    /// Encodes into a freshly allocated buffer of exactly `wire_len` bytes.
    ///
    /// Every write is checked; `None` means the length table and the field
    /// layout disagree.
    pub fn encode(&self) -> Option<Bytes> {
        let mut buffer = vec![0u8; self.wire_len()];
        let mut writer = PacketWriter::new(&mut buffer);

        let complete = writer.write(self.command() as u8)
            && match *self {
                Message::AcceptPlayer { slot } | Message::RemovePlayer { slot } => {
                    writer.write(slot)
                }
                Message::AddPlayer { slot, x, y } | Message::UpdatePlayer { slot, x, y } => {
                    writer.write(slot) && writer.write(x) && writer.write(y)
                }
                Message::UpdateInput { x, y } => writer.write(x) && writer.write(y),
            };

        if !complete || writer.remaining() != 0 {
            return None;
        }

        Some(Bytes::from(buffer))
    }

    /// Decodes one message. Bytes past the fixed length are ignored.
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = PacketReader::new(data);
        let command = Command::try_from(reader.try_read::<u8>().ok_or(DecodeError::Empty)?)?;

        if data.len() < command.wire_len() {
            return Err(DecodeError::Truncated {
                command,
                expected: command.wire_len(),
                actual: data.len(),
            });
        }

        // Length is checked above, so the soft reads below cannot fall short.
        let message = match command {
            Command::AcceptPlayer => Message::AcceptPlayer {
                slot: reader.read(),
            },
            Command::RemovePlayer => Message::RemovePlayer {
                slot: reader.read(),
            },
            Command::AddPlayer => Message::AddPlayer {
                slot: reader.read(),
                x: reader.read(),
                y: reader.read(),
            },
            Command::UpdatePlayer => Message::UpdatePlayer {
                slot: reader.read(),
                x: reader.read(),
                y: reader.read(),
            },
            Command::UpdateInput => Message::UpdateInput {
                x: reader.read(),
                y: reader.read(),
            },
        };

        Ok(message)
    }
}
