//! Authoritative record of who is connected and where they are
//!
//! The roster is a fixed number of slots created once at startup. A slot's
//! index is the player's identity for as long as its connection lives.

use crate::transport::PeerId;

/// One roster position
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerSlot {
    /// Bound to a live connection
    pub active: bool,
    /// At least one position update has been accepted from this player
    pub has_valid_position: bool,
    /// Connection bound to this slot; `None` whenever the slot is inactive
    pub connection: Option<PeerId>,
    pub x: i16,
    pub y: i16,
}

impl PlayerSlot {
    /// Eligible to be announced to other players
    pub fn is_visible(&self) -> bool {
        self.active && self.has_valid_position
    }

    fn bind(&mut self, peer: PeerId) {
        *self = PlayerSlot {
            active: true,
            has_valid_position: false,
            connection: Some(peer),
            x: 0,
            y: 0,
        };
    }

    fn clear(&mut self) {
        *self = PlayerSlot::default();
    }
}

/// Fixed-capacity, ordered collection of player slots
#[derive(Debug, Clone)]
pub struct Roster {
    slots: Vec<PlayerSlot>,
}

impl Roster {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![PlayerSlot::default(); capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.active).count()
    }

    pub fn get(&self, index: usize) -> Option<&PlayerSlot> {
        self.slots.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut PlayerSlot> {
        self.slots.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &PlayerSlot)> {
        self.slots.iter().enumerate()
    }

    /// Slot bound to `peer`, found by linear scan over active slots
    pub fn find_by_peer(&self, peer: PeerId) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.active && slot.connection == Some(peer))
    }

    /// Binds `peer` to the lowest inactive slot. Returns `None` when full.
    pub fn bind(&mut self, peer: PeerId) -> Option<usize> {
        let index = self.slots.iter().position(|slot| !slot.active)?;
        self.slots[index].bind(peer);
        Some(index)
    }

    /// Releases the slot bound to `peer`, returning its index
    pub fn unbind(&mut self, peer: PeerId) -> Option<usize> {
        let index = self.find_by_peer(peer)?;
        self.slots[index].clear();
        Some(index)
    }

    /// Active slots in ascending order, skipping `except`
    pub fn active_except(
        &self,
        except: Option<usize>,
    ) -> impl Iterator<Item = (usize, &PlayerSlot)> {
        self.iter()
            .filter(move |(index, slot)| slot.active && Some(*index) != except)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_creation() {
        let roster = Roster::new(4);
        assert_eq!(roster.capacity(), 4);
        assert_eq!(roster.active_count(), 0);
        assert!(roster.iter().all(|(_, slot)| *slot == PlayerSlot::default()));
    }

    #[test]
    fn test_bind_takes_lowest_free_slot() {
        let mut roster = Roster::new(3);
        assert_eq!(roster.bind(PeerId(10)), Some(0));
        assert_eq!(roster.bind(PeerId(11)), Some(1));

        roster.unbind(PeerId(10));
        assert_eq!(roster.bind(PeerId(12)), Some(0));
        assert_eq!(roster.bind(PeerId(13)), Some(2));
    }

    #[test]
    fn test_bind_when_full() {
        let mut roster = Roster::new(1);
        assert_eq!(roster.bind(PeerId(1)), Some(0));
        assert_eq!(roster.bind(PeerId(2)), None);
        assert_eq!(roster.get(0).unwrap().connection, Some(PeerId(1)));
    }

    #[test]
    fn test_bound_slot_has_no_valid_position() {
        let mut roster = Roster::new(2);
        let index = roster.bind(PeerId(5)).unwrap();
        let slot = roster.get(index).unwrap();

        assert!(slot.active);
        assert!(!slot.has_valid_position);
        assert!(!slot.is_visible());
        assert_eq!(slot.connection, Some(PeerId(5)));
    }

    #[test]
    fn test_unbind_clears_slot() {
        let mut roster = Roster::new(2);
        let index = roster.bind(PeerId(5)).unwrap();
        {
            let slot = roster.get_mut(index).unwrap();
            slot.has_valid_position = true;
            slot.x = 40;
            slot.y = -3;
        }

        assert_eq!(roster.unbind(PeerId(5)), Some(index));
        assert_eq!(*roster.get(index).unwrap(), PlayerSlot::default());
        assert_eq!(roster.find_by_peer(PeerId(5)), None);
    }

    #[test]
    fn test_unbind_unknown_peer() {
        let mut roster = Roster::new(2);
        roster.bind(PeerId(1));
        assert_eq!(roster.unbind(PeerId(99)), None);
        assert_eq!(roster.active_count(), 1);
    }

    #[test]
    fn test_find_by_peer_ignores_inactive_slots() {
        let mut roster = Roster::new(2);
        roster.get_mut(1).unwrap().connection = Some(PeerId(3));
        assert_eq!(roster.find_by_peer(PeerId(3)), None);
    }

    #[test]
    fn test_active_except_order() {
        let mut roster = Roster::new(4);
        for id in 0..4 {
            roster.bind(PeerId(id));
        }
        roster.unbind(PeerId(2));

        let all: Vec<usize> = roster.active_except(None).map(|(i, _)| i).collect();
        assert_eq!(all, vec![0, 1, 3]);

        let skipped: Vec<usize> = roster.active_except(Some(1)).map(|(i, _)| i).collect();
        assert_eq!(skipped, vec![0, 3]);
    }
}
