//! Server settings

use shared::{DEFAULT_PORT, MAX_PLAYERS};
use std::time::Duration;

/// How long one `poll_event` call waits before returning empty-handed
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(1000);

/// Silence after which a peer is considered gone
pub const DEFAULT_PEER_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_players: usize,
    pub poll_timeout: Duration,
    pub peer_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            max_players: MAX_PLAYERS,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            peer_timeout: DEFAULT_PEER_TIMEOUT,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}
