//! Performance benchmarks for the hot paths of the relay

use bytes::Bytes;
use client::game::ClientGameState;
use server::session::SessionRegistry;
use server::transport::{PeerId, Transport, TransportEvent};
use shared::{Frame, Message, PacketReader, PacketWriter, MAX_PLAYERS};
use std::time::{Duration, Instant};

/// Transport that only counts what it is asked to do
#[derive(Default)]
struct CountingTransport {
    sends: usize,
    disconnects: usize,
}

impl Transport for CountingTransport {
    fn send(&mut self, _peer: PeerId, _packet: Bytes, _reliable: bool) {
        self.sends += 1;
    }

    fn disconnect(&mut self, _peer: PeerId) {
        self.disconnects += 1;
    }
}

fn full_registry(transport: &mut CountingTransport) -> SessionRegistry {
    let mut registry = SessionRegistry::new(MAX_PLAYERS);
    for peer in 0..MAX_PLAYERS as u64 {
        registry.handle_event(TransportEvent::Connect(PeerId(peer)), transport);
    }
    registry
}

/// Benchmarks raw cursor writes and reads
#[test]
fn benchmark_codec_cursor() {
    let iterations = 100_000;
    let mut buffer = [0u8; 15];
    let start = Instant::now();

    for i in 0..iterations {
        let mut writer = PacketWriter::new(&mut buffer);
        assert!(writer.write(i as u8));
        assert!(writer.write(i as i16));
        assert!(writer.write(i as u32));
        assert!(writer.write(i as f32));
        assert!(writer.write(i as i32));

        let mut reader = PacketReader::new(&buffer);
        assert_eq!(reader.read::<u8>(), i as u8);
        assert_eq!(reader.read::<i16>(), i as i16);
        assert_eq!(reader.read::<u32>(), i as u32);
    }

    let duration = start.elapsed();
    println!(
        "Codec cursor: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    // Should complete in under 1 second
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks message encoding and decoding
#[test]
fn benchmark_message_encoding() {
    let iterations = 100_000;
    let start = Instant::now();

    for i in 0..iterations {
        let message = Message::UpdatePlayer {
            slot: (i % MAX_PLAYERS) as u8,
            x: i as i16,
            y: (i as i16).wrapping_neg(),
        };

        let encoded = message.encode().unwrap();
        assert_eq!(Message::decode(&encoded).unwrap(), message);
    }

    let duration = start.elapsed();
    println!(
        "Message encode/decode: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 1000);
}

/// Benchmarks datagram framing on top of message encoding
#[test]
fn benchmark_frame_processing() {
    let iterations = 100_000;
    let payload = Message::UpdateInput { x: 320, y: 200 }.encode().unwrap();
    let start = Instant::now();

    for _ in 0..iterations {
        let datagram = Frame::Data(payload.clone()).encode();
        match Frame::decode(&datagram) {
            Some(Frame::Data(body)) => assert!(Message::decode(&body).is_ok()),
            other => panic!("Unexpected frame: {:?}", other),
        }
    }

    let duration = start.elapsed();
    println!(
        "Frame processing: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 1000);
}

/// Benchmarks position relay through a full roster
#[test]
fn benchmark_session_relay() {
    let mut transport = CountingTransport::default();
    let mut registry = full_registry(&mut transport);
    let sends_before = transport.sends;

    let iterations = 50_000;
    let start = Instant::now();

    for i in 0..iterations {
        let peer = PeerId((i % MAX_PLAYERS) as u64);
        let payload = Message::UpdateInput {
            x: (i % 1000) as i16,
            y: (i % 700) as i16,
        }
        .encode()
        .unwrap();

        registry.handle_event(TransportEvent::Receive(peer, payload), &mut transport);
    }

    let duration = start.elapsed();
    println!(
        "Session relay: {} updates in {:?} ({:.2} μs/update)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Every update fans out to everyone but the sender
    assert_eq!(
        transport.sends - sends_before,
        iterations * (MAX_PLAYERS - 1)
    );
    assert_eq!(transport.disconnects, 0);
    assert!(duration.as_millis() < 2000);
}

/// Stress test: players joining and leaving repeatedly
#[test]
fn stress_test_connection_churn() {
    let mut transport = CountingTransport::default();
    let mut registry = SessionRegistry::new(MAX_PLAYERS);

    let iterations = 20_000u64;
    let start = Instant::now();

    for peer in 0..iterations {
        registry.handle_event(TransportEvent::Connect(PeerId(peer)), &mut transport);

        if registry.active_count() == MAX_PLAYERS {
            let oldest = PeerId(peer + 1 - MAX_PLAYERS as u64);
            registry.handle_event(TransportEvent::Disconnect(oldest), &mut transport);
        }
    }

    let duration = start.elapsed();
    println!(
        "Connection churn: {} connects in {:?} ({:.2} μs/connect)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert_eq!(registry.active_count(), MAX_PLAYERS - 1);
    assert_eq!(transport.disconnects, 0);
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks client-side message application and extrapolation
#[test]
fn benchmark_client_state_updates() {
    let mut state = ClientGameState::new();
    let start_time = Instant::now();
    state.apply(Message::AcceptPlayer { slot: 0 }, start_time);

    let iterations = 100_000;
    let start = Instant::now();

    for i in 0..iterations {
        let now = start_time + Duration::from_millis(i as u64);
        let slot = (1 + i % (MAX_PLAYERS - 1)) as u8;
        state.apply(
            Message::UpdatePlayer {
                slot,
                x: (i % 1000) as i16,
                y: 100,
            },
            now,
        );
        let _ = state.remote_players(now);
    }

    let duration = start.elapsed();
    println!(
        "Client state updates: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert_eq!(
        state.remote_players(start_time).len(),
        MAX_PLAYERS - 1
    );
    assert!(duration.as_millis() < 2000);
}
