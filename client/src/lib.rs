//! # Position Relay Client Library
//!
//! This library provides a headless client for the position relay server. It
//! connects over UDP, learns its player slot, reports its own position and
//! tracks where everybody else is.
//!
//! ## Architecture Overview
//!
//! The server is authoritative for who is who; the client is authoritative
//! only for where its own player stands. Everything the client shows about
//! other players comes from the server's relayed updates.
//!
//! ### Local Movement
//! The local player moves immediately and is clamped to the playing field.
//! Its position is reported to the server at a fixed pace, and only when it
//! actually changed.
//!
//! ### Remote Extrapolation
//! Remote players are drawn at their last reported position, pushed forward
//! along the velocity derived from their two most recent updates. The
//! projection is capped so a silent player does not drift off forever.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! Client-side world state:
//! - Slot assignment from `AcceptPlayer`
//! - Remote player table driven by add/update/remove messages
//! - Input throttling
//!
//! ### Input Module (`input`)
//! A seeded or random walk that stands in for a human at the keyboard.
//!
//! ### Network Module (`network`)
//! UDP socket handling:
//! - Connect, keepalive and disconnect frames
//! - Draining and applying server messages
//! - Sending input when it is due
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::input::InputManager;
//! use client::network::Client;
//! use std::time::{Duration, Instant};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = Client::connect("127.0.0.1:4545").await?;
//!     let mut input = InputManager::default();
//!
//!     loop {
//!         tokio::time::sleep(Duration::from_millis(16)).await;
//!
//!         let (dx, dy) = input.update(Duration::from_millis(16));
//!         client.move_local_player(dx, dy);
//!         client.update(Instant::now()).await?;
//!     }
//! }
//! ```

pub mod game;
pub mod input;
pub mod network;
