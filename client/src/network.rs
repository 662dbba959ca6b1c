//! UDP connection to the relay server

use crate::game::ClientGameState;
use bytes::Bytes;
use log::{debug, info, warn};
use shared::{Frame, Message, MAX_DATAGRAM_SIZE};
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;

/// Silence on our side longer than this triggers a keepalive. Until a slot is
/// assigned, the connect request is repeated at the same pace instead.
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(1);

pub struct Client {
    socket: UdpSocket,
    server_addr: SocketAddr,
    /// False once the server refused or dropped us, or we said goodbye
    open: bool,
    game_state: ClientGameState,
    last_sent: Instant,
}

impl Client {
    /// Binds a local socket and asks the server for a slot. The answer arrives
    /// through `update` or `recv_message`.
    pub async fn connect(server_addr: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let server_addr: SocketAddr = server_addr.parse()?;
        let local = if server_addr.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };

        let socket = UdpSocket::bind(local).await?;
        socket.connect(server_addr).await?;

        info!("Connecting to {} from {}", server_addr, socket.local_addr()?);

        let mut client = Client {
            socket,
            server_addr,
            open: true,
            game_state: ClientGameState::new(),
            last_sent: Instant::now(),
        };
        client.send_frame(&Frame::Connect).await?;

        Ok(client)
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// True while the server holds a slot for us
    pub fn is_connected(&self) -> bool {
        self.open && self.game_state.is_connected()
    }

    /// False after a refusal, a server-side disconnect, or `disconnect`
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn local_player_id(&self) -> Option<u8> {
        self.game_state.local_player_id()
    }

    pub fn game_state(&self) -> &ClientGameState {
        &self.game_state
    }

    pub fn move_local_player(&mut self, dx: f32, dy: f32) {
        self.game_state.move_local_player(dx, dy);
    }

    pub fn player_position(&self, id: u8, now: Instant) -> Option<(f32, f32)> {
        self.game_state.player_position(id, now)
    }

    /// Applies every datagram already waiting, then sends input or a
    /// keepalive if one is due. Returns how many messages were applied.
    pub async fn update(&mut self, now: Instant) -> Result<usize, Box<dyn std::error::Error>> {
        let mut buffer = [0u8; MAX_DATAGRAM_SIZE];
        let mut applied = 0;

        loop {
            match self.socket.try_recv(&mut buffer) {
                Ok(len) => {
                    if self.handle_datagram(&buffer[..len], now).is_some() {
                        applied += 1;
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => return Err(e.into()),
            }
        }

        if !self.open {
            return Ok(applied);
        }

        if let Some(input) = self.game_state.take_input(now) {
            self.send_message(&input).await?;
        } else if now.saturating_duration_since(self.last_sent) >= KEEPALIVE_INTERVAL {
            let frame = if self.game_state.is_connected() {
                Frame::Keepalive
            } else {
                Frame::Connect
            };
            self.send_frame(&frame).await?;
        }

        Ok(applied)
    }

    /// Waits up to `timeout` for the next protocol message and applies it.
    /// Returns `None` on timeout or when the server closes the connection.
    pub async fn recv_message(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<Message>, Box<dyn std::error::Error>> {
        let deadline = tokio::time::Instant::now() + timeout;
        let mut buffer = [0u8; MAX_DATAGRAM_SIZE];

        while self.open {
            let received = tokio::time::timeout_at(deadline, self.socket.recv(&mut buffer)).await;
            let len = match received {
                Ok(result) => result?,
                Err(_) => return Ok(None),
            };

            if let Some(message) = self.handle_datagram(&buffer[..len], Instant::now()) {
                return Ok(Some(message));
            }
        }

        Ok(None)
    }

    /// Sends one protocol message to the server
    pub async fn send_message(
        &mut self,
        message: &Message,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match message.encode() {
            Some(payload) => self.send_data(payload).await,
            None => {
                warn!("Failed to encode {:?}", message.command());
                Ok(())
            }
        }
    }

    /// Raw payload, sent as-is inside a data frame
    pub async fn send_data(&mut self, payload: Bytes) -> Result<(), Box<dyn std::error::Error>> {
        self.send_frame(&Frame::Data(payload)).await
    }

    /// Tells the server we are leaving and forgets the session
    pub async fn disconnect(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if !self.open {
            return Ok(());
        }

        self.send_frame(&Frame::Disconnect).await?;
        self.open = false;
        self.game_state.reset();
        info!("Disconnected from {}", self.server_addr);

        Ok(())
    }

    fn handle_datagram(&mut self, datagram: &[u8], now: Instant) -> Option<Message> {
        match Frame::decode(datagram) {
            Some(Frame::Data(payload)) => match Message::decode(&payload) {
                Ok(message) => {
                    self.game_state.apply(message, now);
                    Some(message)
                }
                Err(e) => {
                    debug!("Dropping message from server: {}", e);
                    None
                }
            },
            Some(Frame::Disconnect) => {
                if self.game_state.is_connected() {
                    warn!("Server closed the connection");
                } else {
                    warn!("Server refused the connection");
                }
                self.open = false;
                self.game_state.reset();
                None
            }
            Some(frame) => {
                debug!("Ignoring {:?} frame from server", frame.kind());
                None
            }
            None => {
                debug!("Malformed datagram from server");
                None
            }
        }
    }

    async fn send_frame(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        self.socket.send(&frame.encode()).await?;
        self.last_sent = Instant::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    async fn fake_server() -> UdpSocket {
        UdpSocket::bind("127.0.0.1:0").await.unwrap()
    }

    async fn recv_frame(server: &UdpSocket) -> (Frame, SocketAddr) {
        let mut buffer = [0u8; MAX_DATAGRAM_SIZE];
        let (len, addr) =
            tokio::time::timeout(Duration::from_secs(2), server.recv_from(&mut buffer))
                .await
                .unwrap()
                .unwrap();
        (Frame::decode(&buffer[..len]).unwrap(), addr)
    }

    async fn send_message(server: &UdpSocket, message: Message, to: SocketAddr) {
        let frame = Frame::Data(message.encode().unwrap());
        server.send_to(&frame.encode(), to).await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_sends_connect_frame() {
        let server = fake_server().await;
        let client = Client::connect(&server.local_addr().unwrap().to_string())
            .await
            .unwrap();

        let (frame, from) = recv_frame(&server).await;
        assert_eq!(frame, Frame::Connect);
        assert_eq!(from.port(), client.local_addr().unwrap().port());
        assert!(client.is_open());
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_invalid_server_address() {
        assert!(Client::connect("not an address").await.is_err());
    }

    #[tokio::test]
    async fn test_accept_then_input() {
        let server = fake_server().await;
        let mut client = Client::connect(&server.local_addr().unwrap().to_string())
            .await
            .unwrap();
        let (_, client_addr) = recv_frame(&server).await;

        send_message(&server, Message::AcceptPlayer { slot: 4 }, client_addr).await;
        assert_eq!(
            client.recv_message(Duration::from_secs(2)).await.unwrap(),
            Some(Message::AcceptPlayer { slot: 4 })
        );
        assert!(client.is_connected());
        assert_eq!(client.local_player_id(), Some(4));

        client.update(Instant::now()).await.unwrap();
        let (frame, _) = recv_frame(&server).await;
        let (x, y) = client.game_state().local_position();
        let expected = Message::UpdateInput {
            x: x.round() as i16,
            y: y.round() as i16,
        };
        assert_eq!(frame, Frame::Data(expected.encode().unwrap()));
    }

    #[tokio::test]
    async fn test_update_applies_waiting_messages() {
        let server = fake_server().await;
        let mut client = Client::connect(&server.local_addr().unwrap().to_string())
            .await
            .unwrap();
        let (_, client_addr) = recv_frame(&server).await;

        send_message(&server, Message::AcceptPlayer { slot: 0 }, client_addr).await;
        send_message(&server, Message::AddPlayer { slot: 1, x: 7, y: 9 }, client_addr).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        let now = Instant::now();
        assert_eq!(client.update(now).await.unwrap(), 2);
        assert_eq!(client.player_position(1, now), Some((7.0, 9.0)));
    }

    #[tokio::test]
    async fn test_server_disconnect_closes_client() {
        let server = fake_server().await;
        let mut client = Client::connect(&server.local_addr().unwrap().to_string())
            .await
            .unwrap();
        let (_, client_addr) = recv_frame(&server).await;

        server
            .send_to(&Frame::Disconnect.encode(), client_addr)
            .await
            .unwrap();

        assert_eq!(client.recv_message(Duration::from_secs(2)).await.unwrap(), None);
        assert!(!client.is_open());
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_disconnect_sends_frame_once() {
        let server = fake_server().await;
        let mut client = Client::connect(&server.local_addr().unwrap().to_string())
            .await
            .unwrap();
        recv_frame(&server).await;

        assert_ok!(client.disconnect().await);
        assert_eq!(recv_frame(&server).await.0, Frame::Disconnect);

        assert_ok!(client.disconnect().await);
        let mut buffer = [0u8; MAX_DATAGRAM_SIZE];
        let second =
            tokio::time::timeout(Duration::from_millis(100), server.recv_from(&mut buffer)).await;
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn test_connect_is_repeated_until_accepted() {
        let server = fake_server().await;
        let mut client = Client::connect(&server.local_addr().unwrap().to_string())
            .await
            .unwrap();
        recv_frame(&server).await;

        client
            .update(Instant::now() + KEEPALIVE_INTERVAL)
            .await
            .unwrap();
        assert_eq!(recv_frame(&server).await.0, Frame::Connect);
    }
}
