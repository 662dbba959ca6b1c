//! # Position Relay Server Library
//!
//! This library provides the authoritative server for the position relay. It
//! assigns every connection a player slot, accepts position updates from that
//! connection only, and relays them to everyone else connected.
//!
//! ## Core Responsibilities
//!
//! ### Identity Binding
//! A player's identity is the roster slot bound to the connection that
//! delivered a message. Nothing in a client payload can name a slot, so a
//! client can never move somebody else's player.
//!
//! ### Session Lifecycle
//! Handles the complete lifecycle of a player:
//! - Slot assignment on connect, or refusal when the roster is full
//! - Catch-up for newcomers (every player that already has a position)
//! - Position updates, announced as `AddPlayer` the first time and
//!   `UpdatePlayer` afterwards
//! - Departure notification and immediate slot reuse
//!
//! ### Fail-Soft Input Handling
//! Malformed, truncated or unexpected messages are dropped without touching
//! state. One misbehaving client cannot stall the loop for the others.
//!
//! ## Architecture Design
//!
//! ### Single-Threaded Event Loop
//! The server blocks on one "next transport event, up to a timeout" call and
//! processes each event to completion before waiting again. The roster has a
//! single owner, so no locking is involved.
//!
//! ### UDP-Based Communication
//! The bundled host frames every datagram with a one-byte kind (connect, data,
//! disconnect, keepalive) and tracks peers by address with a liveness
//! timeout. Delivery is best-effort.
//!
//! ## Module Organization
//!
//! ### Roster Module (`roster`)
//! Fixed-capacity slot table: bind, unbind, lookup by peer.
//!
//! ### Session Module (`session`)
//! The connect/receive/disconnect state machine and broadcast fan-out.
//!
//! ### Transport Module (`transport`)
//! The `Transport` trait and event type the session layer consumes.
//!
//! ### Client Manager Module (`client_manager`)
//! Address-level peer table with connection cap and timeouts.
//!
//! ### Network Module (`network`)
//! UDP host tasks and the `Server` loop tying host and registry together.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig {
//!         host: "127.0.0.1".to_string(),
//!         port: 4545,
//!         ..Default::default()
//!     };
//!
//!     let mut server = Server::new(&config).await?;
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! Internally the host runs three tasks:
//! - **Network Receiver**: turns datagrams into transport events
//! - **Network Sender**: drains the outbound queue onto the socket
//! - **Timeout Checker**: drops peers that went silent

pub mod client_manager;
pub mod config;
pub mod network;
pub mod roster;
pub mod session;
pub mod transport;
