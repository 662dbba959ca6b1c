//! Server network layer: UDP host tasks and the single-threaded event loop

use crate::client_manager::ClientManager;
use crate::config::ServerConfig;
use crate::session::SessionRegistry;
use crate::transport::{PeerId, Transport, TransportEvent};
use bytes::Bytes;
use log::{debug, error, info, warn};
use shared::{Frame, MAX_DATAGRAM_SIZE};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;

/// Requests queued by the session layer for the sender task
#[derive(Debug)]
pub enum Outbound {
    /// `reliable` is carried for the session's benefit; this host delivers
    /// every datagram best-effort.
    Send {
        peer: PeerId,
        packet: Bytes,
        reliable: bool,
    },
    Disconnect {
        peer: PeerId,
    },
}

/// Cloneable handle the session registry sends through
#[derive(Clone)]
pub struct OutboundQueue {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl Transport for OutboundQueue {
    fn send(&mut self, peer: PeerId, packet: Bytes, reliable: bool) {
        if let Err(e) = self.tx.send(Outbound::Send {
            peer,
            packet,
            reliable,
        }) {
            error!("Failed to queue packet for {}: {}", peer, e);
        }
    }

    fn disconnect(&mut self, peer: PeerId) {
        if let Err(e) = self.tx.send(Outbound::Disconnect { peer }) {
            error!("Failed to queue disconnect for {}: {}", peer, e);
        }
    }
}

/// A bound UDP socket plus the tasks that turn datagrams into transport events
pub struct UdpHost {
    socket: Arc<UdpSocket>,
    clients: Arc<RwLock<ClientManager>>,

    event_tx: mpsc::UnboundedSender<TransportEvent>,
    event_rx: mpsc::UnboundedReceiver<TransportEvent>,
    outbound_tx: mpsc::UnboundedSender<Outbound>,
    outbound_rx: Option<mpsc::UnboundedReceiver<Outbound>>,

    tasks: Vec<JoinHandle<()>>,
}

impl UdpHost {
    /// Binds the host socket. At most `max_connections` peers are accepted;
    /// peers silent for longer than `peer_timeout` are dropped.
    pub async fn bind(
        addr: &str,
        max_connections: usize,
        peer_timeout: Duration,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Host listening on {}", socket.local_addr()?);

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        Ok(UdpHost {
            socket,
            clients: Arc::new(RwLock::new(ClientManager::new(
                max_connections,
                peer_timeout,
            ))),
            event_tx,
            event_rx,
            outbound_tx,
            outbound_rx: Some(outbound_rx),
            tasks: Vec::new(),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn outbound(&self) -> OutboundQueue {
        OutboundQueue {
            tx: self.outbound_tx.clone(),
        }
    }

    /// Spawns the receiver, sender and timeout tasks. Calling it again is a
    /// no-op.
    pub fn start(&mut self) {
        let outbound_rx = match self.outbound_rx.take() {
            Some(rx) => rx,
            None => return,
        };

        self.tasks.push(self.spawn_network_receiver());
        self.tasks.push(self.spawn_network_sender(outbound_rx));
        self.tasks.push(self.spawn_timeout_checker());
    }

    /// Waits up to `timeout` for the next event
    pub async fn poll_event(&mut self, timeout: Duration) -> Option<TransportEvent> {
        tokio::time::timeout(timeout, self.event_rx.recv())
            .await
            .ok()
            .flatten()
    }

    /// Number of peers the host currently tracks
    pub async fn peer_count(&self) -> usize {
        self.clients.read().await.len()
    }

    fn spawn_network_receiver(&self) -> JoinHandle<()> {
        let socket = Arc::clone(&self.socket);
        let clients = Arc::clone(&self.clients);
        let event_tx = self.event_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; MAX_DATAGRAM_SIZE];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => match Frame::decode(&buffer[..len]) {
                        Some(frame) => {
                            let event = Self::handle_frame(&socket, &clients, frame, addr).await;
                            if let Some(event) = event {
                                if let Err(e) = event_tx.send(event) {
                                    error!("Failed to deliver event to main loop: {}", e);
                                    break;
                                }
                            }
                        }
                        None => warn!("Malformed datagram from {}", addr),
                    },
                    Err(e) => {
                        error!("Error receiving datagram: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        })
    }

    /// Maps one inbound frame to a transport event, updating the peer table
    async fn handle_frame(
        socket: &UdpSocket,
        clients: &RwLock<ClientManager>,
        frame: Frame,
        addr: SocketAddr,
    ) -> Option<TransportEvent> {
        let known = clients.write().await.touch_addr(addr);

        match (frame, known) {
            (Frame::Connect, None) => {
                let peer = clients.write().await.add_client(addr);
                match peer {
                    Some(peer) => Some(TransportEvent::Connect(peer)),
                    None => {
                        warn!("Connection limit reached, refusing {}", addr);
                        Self::send_frame(socket, &Frame::Disconnect, addr).await;
                        None
                    }
                }
            }
            // The accept may have been lost; let the session answer again
            (Frame::Connect, Some(peer)) => Some(TransportEvent::Connect(peer)),
            (Frame::Keepalive, Some(_)) => None,
            (Frame::Data(payload), Some(peer)) => Some(TransportEvent::Receive(peer, payload)),
            (Frame::Disconnect, Some(peer)) => {
                clients.write().await.remove_client(&peer);
                Some(TransportEvent::Disconnect(peer))
            }
            (frame, None) => {
                debug!("Ignoring {:?} frame from unknown {}", frame.kind(), addr);
                None
            }
        }
    }

    fn spawn_network_sender(
        &self,
        mut outbound_rx: mpsc::UnboundedReceiver<Outbound>,
    ) -> JoinHandle<()> {
        let socket = Arc::clone(&self.socket);
        let clients = Arc::clone(&self.clients);
        let event_tx = self.event_tx.clone();

        tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                match message {
                    Outbound::Send { peer, packet, .. } => {
                        let addr = clients.read().await.client_addr(peer);
                        match addr {
                            Some(addr) => {
                                Self::send_frame(&socket, &Frame::Data(packet), addr).await
                            }
                            None => debug!("Dropping packet for departed {}", peer),
                        }
                    }
                    Outbound::Disconnect { peer } => {
                        let removed = clients.write().await.remove_client(&peer);
                        if let Some(client) = removed {
                            Self::send_frame(&socket, &Frame::Disconnect, client.addr).await;
                            if event_tx.send(TransportEvent::Disconnect(peer)).is_err() {
                                break;
                            }
                        }
                    }
                }
            }
        })
    }

    fn spawn_timeout_checker(&self) -> JoinHandle<()> {
        let clients = Arc::clone(&self.clients);
        let event_tx = self.event_tx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let timed_out = clients.write().await.check_timeouts();

                for peer in timed_out {
                    info!("{} timed out", peer);
                    if let Err(e) = event_tx.send(TransportEvent::DisconnectTimeout(peer)) {
                        error!("Failed to send timeout event: {}", e);
                        return;
                    }
                }
            }
        })
    }

    async fn send_frame(socket: &UdpSocket, frame: &Frame, addr: SocketAddr) {
        if let Err(e) = socket.send_to(&frame.encode(), addr).await {
            error!("Failed to send {:?} frame to {}: {}", frame.kind(), addr, e);
        }
    }
}

impl Drop for UdpHost {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Authoritative server: one host, one registry, one event at a time
pub struct Server {
    host: UdpHost,
    registry: SessionRegistry,
    poll_timeout: Duration,
}

impl Server {
    /// Binds the host. Failure here is fatal; the loop never starts.
    pub async fn new(config: &ServerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let host = UdpHost::bind(
            &config.bind_address(),
            config.max_players,
            config.peer_timeout,
        )
        .await?;

        Ok(Server {
            host,
            registry: SessionRegistry::new(config.max_players),
            poll_timeout: config.poll_timeout,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.host.local_addr()
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Waits for at most one event and processes it to completion. Returns
    /// whether an event was handled.
    pub async fn poll_once(&mut self) -> bool {
        self.host.start();

        match self.host.poll_event(self.poll_timeout).await {
            Some(event) => {
                let mut outbound = self.host.outbound();
                self.registry.handle_event(event, &mut outbound);
                true
            }
            None => false,
        }
    }

    /// Main server loop; runs until the task is dropped
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.host.start();
        info!(
            "Server started with {} player slots",
            self.registry.roster().capacity()
        );

        let mut outbound = self.host.outbound();
        loop {
            if let Some(event) = self.host.poll_event(self.poll_timeout).await {
                self.registry.handle_event(event, &mut outbound);
            }
        }
    }
}
