//! Client-side world state: our slot, our position and everybody else

use log::{debug, info};
use shared::{Message, FIELD_HEIGHT, FIELD_WIDTH, MAX_SLOTS, PLAYER_SIZE};
use std::time::{Duration, Instant};

/// Minimum spacing between two `UpdateInput` messages
pub const INPUT_UPDATE_INTERVAL: Duration = Duration::from_millis(50);

/// Remote players are never projected further than this past their last update
pub const MAX_EXTRAPOLATION: Duration = Duration::from_millis(250);

/// Another player as last reported by the server
#[derive(Debug, Clone, PartialEq)]
pub struct RemotePlayer {
    pub position: (f32, f32),
    pub velocity: (f32, f32),
    pub updated_at: Instant,
}

impl RemotePlayer {
    pub fn new(x: i16, y: i16, now: Instant) -> Self {
        Self {
            position: (x as f32, y as f32),
            velocity: (0.0, 0.0),
            updated_at: now,
        }
    }

    /// Records a new authoritative position and derives a velocity from the
    /// previous one
    pub fn observe(&mut self, x: i16, y: i16, now: Instant) {
        let (x, y) = (x as f32, y as f32);
        let dt = now.saturating_duration_since(self.updated_at).as_secs_f32();

        self.velocity = if dt > 0.0 {
            ((x - self.position.0) / dt, (y - self.position.1) / dt)
        } else {
            (0.0, 0.0)
        };
        self.position = (x, y);
        self.updated_at = now;
    }

    /// Position projected forward along the last known velocity
    pub fn extrapolated(&self, now: Instant) -> (f32, f32) {
        let dt = now
            .saturating_duration_since(self.updated_at)
            .min(MAX_EXTRAPOLATION)
            .as_secs_f32();

        (
            self.position.0 + self.velocity.0 * dt,
            self.position.1 + self.velocity.1 * dt,
        )
    }
}

/// Everything the client knows about the world
#[derive(Debug, Clone)]
pub struct ClientGameState {
    local_id: Option<u8>,
    local_position: (f32, f32),
    players: Vec<Option<RemotePlayer>>,
    last_input_sent: Option<Instant>,
    last_sent_position: Option<(i16, i16)>,
}

impl ClientGameState {
    pub fn new() -> Self {
        Self {
            local_id: None,
            local_position: (
                (FIELD_WIDTH - PLAYER_SIZE) / 2.0,
                (FIELD_HEIGHT - PLAYER_SIZE) / 2.0,
            ),
            players: vec![None; MAX_SLOTS],
            last_input_sent: None,
            last_sent_position: None,
        }
    }

    /// Applies one message from the server
    pub fn apply(&mut self, message: Message, now: Instant) {
        match message {
            Message::AcceptPlayer { slot } => {
                info!("Accepted as player {}", slot);
                self.local_id = Some(slot);
                self.players.iter_mut().for_each(|player| *player = None);
                self.last_input_sent = None;
                self.last_sent_position = None;
            }
            Message::AddPlayer { slot, x, y } => {
                if let Some(entry) = self.remote_slot(slot) {
                    *entry = Some(RemotePlayer::new(x, y, now));
                }
            }
            Message::UpdatePlayer { slot, x, y } => {
                if let Some(entry) = self.remote_slot(slot) {
                    match entry {
                        Some(player) => player.observe(x, y, now),
                        None => *entry = Some(RemotePlayer::new(x, y, now)),
                    }
                }
            }
            Message::RemovePlayer { slot } => {
                if let Some(entry) = self.remote_slot(slot) {
                    *entry = None;
                }
            }
            Message::UpdateInput { .. } => debug!("Ignoring client-bound UpdateInput"),
        }
    }

    /// Forgets the session, e.g. after the server dropped us
    pub fn reset(&mut self) {
        self.local_id = None;
        self.players.iter_mut().for_each(|player| *player = None);
        self.last_input_sent = None;
        self.last_sent_position = None;
    }

    pub fn is_connected(&self) -> bool {
        self.local_id.is_some()
    }

    pub fn local_player_id(&self) -> Option<u8> {
        self.local_id
    }

    pub fn local_position(&self) -> (f32, f32) {
        self.local_position
    }

    /// Moves the local player, keeping it inside the field
    pub fn move_local_player(&mut self, dx: f32, dy: f32) {
        let (x, y) = self.local_position;
        self.local_position = (
            (x + dx).clamp(0.0, FIELD_WIDTH - PLAYER_SIZE),
            (y + dy).clamp(0.0, FIELD_HEIGHT - PLAYER_SIZE),
        );
    }

    /// Where player `id` should be drawn right now, or `None` if unknown
    pub fn player_position(&self, id: u8, now: Instant) -> Option<(f32, f32)> {
        if Some(id) == self.local_id {
            return Some(self.local_position);
        }

        self.players
            .get(id as usize)?
            .as_ref()
            .map(|player| player.extrapolated(now))
    }

    /// All known remote players with their extrapolated positions
    pub fn remote_players(&self, now: Instant) -> Vec<(u8, (f32, f32))> {
        self.players
            .iter()
            .enumerate()
            .filter_map(|(id, player)| {
                player
                    .as_ref()
                    .map(|player| (id as u8, player.extrapolated(now)))
            })
            .collect()
    }

    /// Returns an `UpdateInput` if one is due: we have a slot, the send
    /// interval has passed, and the position changed since the last send.
    pub fn take_input(&mut self, now: Instant) -> Option<Message> {
        self.local_id?;

        if let Some(last) = self.last_input_sent {
            if now.saturating_duration_since(last) < INPUT_UPDATE_INTERVAL {
                return None;
            }
        }

        let position = (
            self.local_position.0.round() as i16,
            self.local_position.1.round() as i16,
        );
        if self.last_sent_position == Some(position) {
            return None;
        }

        self.last_input_sent = Some(now);
        self.last_sent_position = Some(position);

        Some(Message::UpdateInput {
            x: position.0,
            y: position.1,
        })
    }

    /// The table covers every one-byte slot, so only our own slot is refused
    fn remote_slot(&mut self, slot: u8) -> Option<&mut Option<RemotePlayer>> {
        if Some(slot) == self.local_id {
            return None;
        }

        self.players.get_mut(slot as usize)
    }
}

impl Default for ClientGameState {
    fn default() -> Self {
        Self::new()
    }
}
