//! Session registry: connection lifecycle, input handling and broadcast fan-out
//!
//! The registry owns the [`Roster`] and is driven one transport event at a
//! time. A player's slot is always resolved from the connection that delivered
//! an event, never from anything inside the payload.
//!
//! Per connection the lifecycle is:
//! - connect: bind the lowest free slot (or disconnect if full), send the new
//!   player its slot and every already-visible player. A repeated connect
//!   gets the same welcome again without a second slot
//! - receive `UpdateInput`: store the position and tell everyone else, as
//!   `AddPlayer` the first time and `UpdatePlayer` afterwards
//! - disconnect/timeout: free the slot and tell everyone left

use crate::roster::{PlayerSlot, Roster};
use crate::transport::{PeerId, Transport, TransportEvent};
use log::{debug, error, info, warn};
use shared::Message;

/// Slot indices travel as a single byte
pub const MAX_ROSTER_CAPACITY: usize = shared::MAX_SLOTS;

pub struct SessionRegistry {
    roster: Roster,
}

impl SessionRegistry {
    /// Creates a registry with `capacity` inactive slots.
    ///
    /// Capacity is capped at [`MAX_ROSTER_CAPACITY`] so every slot index fits
    /// the wire format.
    pub fn new(capacity: usize) -> Self {
        if capacity > MAX_ROSTER_CAPACITY {
            warn!(
                "Roster capacity {} exceeds wire limit, using {}",
                capacity, MAX_ROSTER_CAPACITY
            );
        }

        Self {
            roster: Roster::new(capacity.min(MAX_ROSTER_CAPACITY)),
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn slot(&self, index: usize) -> Option<&PlayerSlot> {
        self.roster.get(index)
    }

    pub fn active_count(&self) -> usize {
        self.roster.active_count()
    }

    pub fn find_slot(&self, peer: PeerId) -> Option<usize> {
        self.roster.find_by_peer(peer)
    }

    /// Processes one transport event to completion
    pub fn handle_event<T: Transport>(&mut self, event: TransportEvent, transport: &mut T) {
        match event {
            TransportEvent::Connect(peer) => {
                self.handle_connect(peer, transport);
            }
            TransportEvent::Receive(peer, payload) => {
                self.handle_receive(peer, &payload, transport);
                // payload is released here
            }
            TransportEvent::Disconnect(peer) | TransportEvent::DisconnectTimeout(peer) => {
                self.handle_disconnect(peer, transport);
            }
        }
    }

    /// Binds a new connection to a slot and catches it up on the world.
    ///
    /// A connection that already holds a slot keeps it and is sent the same
    /// welcome again, which recovers a client whose `AcceptPlayer` was lost.
    ///
    /// Returns the assigned slot, or `None` if the roster was full and the
    /// connection was refused.
    pub fn handle_connect<T: Transport>(
        &mut self,
        peer: PeerId,
        transport: &mut T,
    ) -> Option<usize> {
        if let Some(index) = self.roster.find_by_peer(peer) {
            debug!("Repeated connect from {}, resending slot {}", peer, index);
            self.welcome(index, peer, transport);
            return Some(index);
        }

        let index = match self.roster.bind(peer) {
            Some(index) => index,
            None => {
                warn!("Roster full, refusing {}", peer);
                transport.disconnect(peer);
                return None;
            }
        };

        info!("Player {} connected from {}", index, peer);
        self.welcome(index, peer, transport);

        Some(index)
    }

    /// Applies one inbound payload from `peer`.
    ///
    /// Data from a connection with no slot is a protocol violation and the
    /// connection is dropped. Anything other than a well-formed `UpdateInput`
    /// is discarded without touching state.
    pub fn handle_receive<T: Transport>(
        &mut self,
        peer: PeerId,
        payload: &[u8],
        transport: &mut T,
    ) {
        let index = match self.roster.find_by_peer(peer) {
            Some(index) => index,
            None => {
                warn!("Data from unbound {}, disconnecting", peer);
                transport.disconnect(peer);
                return;
            }
        };

        match Message::decode(payload) {
            Ok(Message::UpdateInput { x, y }) => self.apply_position(index, x, y, transport),
            Ok(other) => debug!("Ignoring {:?} from player {}", other.command(), index),
            Err(e) => debug!("Dropping message from player {}: {}", index, e),
        }
    }

    /// Frees the slot bound to `peer` and announces the departure. Unknown
    /// connections are ignored.
    pub fn handle_disconnect<T: Transport>(
        &mut self,
        peer: PeerId,
        transport: &mut T,
    ) -> Option<usize> {
        let index = match self.roster.unbind(peer) {
            Some(index) => index,
            None => {
                debug!("Disconnect from unbound {}", peer);
                return None;
            }
        };

        info!("Player {} disconnected", index);
        let message = Message::RemovePlayer {
            slot: slot_byte(index),
        };
        self.broadcast_except(&message, None, transport);

        Some(index)
    }

    /// Encodes `message` once and sends the same buffer to every active slot
    /// in ascending order, skipping `except`. Returns the number of recipients.
    pub fn broadcast_except<T: Transport>(
        &self,
        message: &Message,
        except: Option<usize>,
        transport: &mut T,
    ) -> usize {
        let packet = match message.encode() {
            Some(packet) => packet,
            None => {
                error!("Failed to encode {:?}", message);
                return 0;
            }
        };

        let mut recipients = 0;
        for (_, slot) in self.roster.active_except(except) {
            if let Some(peer) = slot.connection {
                transport.send(peer, packet.clone(), true);
                recipients += 1;
            }
        }

        recipients
    }

    /// `AcceptPlayer` followed by every other visible player, in slot order
    fn welcome<T: Transport>(&self, index: usize, peer: PeerId, transport: &mut T) {
        let accept = Message::AcceptPlayer {
            slot: slot_byte(index),
        };
        send_to(transport, peer, &accept);

        for (other, slot) in self.roster.iter() {
            if other == index || !slot.is_visible() {
                continue;
            }

            send_to(
                transport,
                peer,
                &Message::AddPlayer {
                    slot: slot_byte(other),
                    x: slot.x,
                    y: slot.y,
                },
            );
        }
    }

    fn apply_position<T: Transport>(&mut self, index: usize, x: i16, y: i16, transport: &mut T) {
        let slot = match self.roster.get_mut(index) {
            Some(slot) => slot,
            None => return,
        };

        slot.x = x;
        slot.y = y;

        let message = if slot.has_valid_position {
            Message::UpdatePlayer {
                slot: slot_byte(index),
                x,
                y,
            }
        } else {
            slot.has_valid_position = true;
            debug!("Player {} has a position, announcing", index);
            Message::AddPlayer {
                slot: slot_byte(index),
                x,
                y,
            }
        };

        self.broadcast_except(&message, Some(index), transport);
    }
}

fn slot_byte(index: usize) -> u8 {
    // Capacity is capped in SessionRegistry::new
    index as u8
}

fn send_to<T: Transport>(transport: &mut T, peer: PeerId, message: &Message) {
    match message.encode() {
        Some(packet) => transport.send(peer, packet, true),
        None => error!("Failed to encode {:?}", message),
    }
}
