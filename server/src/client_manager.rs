//! Transport-level peer tracking for the UDP host
//!
//! This module handles the address side of connections:
//! - Peer handle assignment when a new address says hello
//! - Address lookup in both directions for inbound and outbound datagrams
//! - Liveness tracking and timeout detection
//! - The connection cap given when the host was created
//!
//! It knows nothing about player slots; the session registry binds peers to
//! slots on top of the events this table produces.

use crate::transport::PeerId;
use log::info;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// A remote address the host has accepted a connection from
#[derive(Debug)]
pub struct Client {
    /// Handle handed to the session layer
    pub id: PeerId,
    /// Where datagrams for this peer go
    pub addr: SocketAddr,
    /// Last time any datagram arrived from this address
    pub last_seen: Instant,
}

impl Client {
    pub fn new(id: PeerId, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            last_seen: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    /// True if nothing has been heard from this peer within `timeout`
    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// All peers currently connected to the host
pub struct ClientManager {
    clients: HashMap<PeerId, Client>,
    next_peer_id: u64,
    max_clients: usize,
    timeout: Duration,
}

impl ClientManager {
    /// Peer handles start at 1 and are never reused, so a stale handle can
    /// not alias a newer connection.
    pub fn new(max_clients: usize, timeout: Duration) -> Self {
        Self {
            clients: HashMap::new(),
            next_peer_id: 1,
            max_clients,
            timeout,
        }
    }

    /// Registers a new address. Returns `None` at capacity.
    pub fn add_client(&mut self, addr: SocketAddr) -> Option<PeerId> {
        if self.clients.len() >= self.max_clients {
            return None;
        }

        let id = PeerId(self.next_peer_id);
        self.next_peer_id += 1;

        info!("{} connected from {}", id, addr);
        self.clients.insert(id, Client::new(id, addr));

        Some(id)
    }

    pub fn remove_client(&mut self, id: &PeerId) -> Option<Client> {
        let client = self.clients.remove(id)?;
        info!("{} at {} removed", client.id, client.addr);
        Some(client)
    }

    pub fn client_addr(&self, id: PeerId) -> Option<SocketAddr> {
        self.clients.get(&id).map(|client| client.addr)
    }

    /// Marks the peer at `addr` as alive and returns its handle
    pub fn touch_addr(&mut self, addr: SocketAddr) -> Option<PeerId> {
        let client = self.clients.values_mut().find(|client| client.addr == addr)?;
        client.touch();
        Some(client.id)
    }

    /// Removes peers that have been silent too long and returns their handles
    pub fn check_timeouts(&mut self) -> Vec<PeerId> {
        let timeout = self.timeout;
        let mut timed_out: Vec<PeerId> = self
            .clients
            .values()
            .filter(|client| client.is_timed_out(timeout))
            .map(|client| client.id)
            .collect();
        timed_out.sort();

        for id in &timed_out {
            self.remove_client(id);
        }

        timed_out
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:8080".parse().unwrap()
    }

    fn test_addr2() -> SocketAddr {
        "127.0.0.1:8081".parse().unwrap()
    }

    #[test]
    fn test_client_timeout() {
        let mut client = Client::new(PeerId(1), test_addr());
        assert!(!client.is_timed_out(Duration::from_secs(1)));

        client.last_seen = Instant::now() - Duration::from_secs(2);
        assert!(client.is_timed_out(Duration::from_secs(1)));

        client.touch();
        assert!(!client.is_timed_out(Duration::from_secs(1)));
    }

    #[test]
    fn test_add_clients_assigns_fresh_ids() {
        let mut manager = ClientManager::new(3, Duration::from_secs(5));

        let first = manager.add_client(test_addr()).unwrap();
        let second = manager.add_client(test_addr2()).unwrap();
        assert_eq!(first, PeerId(1));
        assert_eq!(second, PeerId(2));

        manager.remove_client(&first);
        let third = manager.add_client(test_addr()).unwrap();
        assert_eq!(third, PeerId(3));
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn test_add_client_max_capacity() {
        let mut manager = ClientManager::new(1, Duration::from_secs(5));

        assert!(manager.add_client(test_addr()).is_some());
        assert!(manager.add_client(test_addr2()).is_none());
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_remove_client() {
        let mut manager = ClientManager::new(2, Duration::from_secs(5));
        let id = manager.add_client(test_addr()).unwrap();

        let removed = manager.remove_client(&id).unwrap();
        assert_eq!(removed.addr, test_addr());
        assert!(manager.is_empty());
        assert!(manager.remove_client(&id).is_none());
    }

    #[test]
    fn test_lookup_both_directions() {
        let mut manager = ClientManager::new(2, Duration::from_secs(5));
        let id = manager.add_client(test_addr()).unwrap();

        assert_eq!(manager.touch_addr(test_addr()), Some(id));
        assert_eq!(manager.touch_addr(test_addr2()), None);
        assert_eq!(manager.client_addr(id), Some(test_addr()));
        assert_eq!(manager.client_addr(PeerId(99)), None);
    }

    #[test]
    fn test_check_timeouts_removes_silent_peers() {
        let mut manager = ClientManager::new(3, Duration::from_secs(1));
        let stale = manager.add_client(test_addr()).unwrap();
        let fresh = manager.add_client(test_addr2()).unwrap();

        manager.clients.get_mut(&stale).unwrap().last_seen =
            Instant::now() - Duration::from_secs(3);

        assert_eq!(manager.check_timeouts(), vec![stale]);
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.client_addr(fresh), Some(test_addr2()));
        assert_eq!(manager.client_addr(stale), None);
    }

    #[test]
    fn test_touch_addr_refreshes_liveness() {
        let mut manager = ClientManager::new(1, Duration::from_secs(1));
        let id = manager.add_client(test_addr()).unwrap();
        manager.clients.get_mut(&id).unwrap().last_seen =
            Instant::now() - Duration::from_secs(3);

        assert_eq!(manager.touch_addr(test_addr()), Some(id));
        assert!(manager.check_timeouts().is_empty());
        assert_eq!(manager.touch_addr(test_addr2()), None);
    }
}
