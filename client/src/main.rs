use clap::Parser;
use client::input::{InputManager, DEFAULT_SPEED};
use client::network::Client;
use log::info;
use shared::DEFAULT_PORT;
use std::time::{Duration, Instant};
use tokio::time::interval;

/// Frame pacing of the bot loop
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// How often the bot logs what it sees
const REPORT_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value_t = format!("127.0.0.1:{}", DEFAULT_PORT))]
    server: String,

    /// Stop after this many seconds; 0 runs until Ctrl+C
    #[arg(short = 'd', long, default_value = "0")]
    duration_secs: u64,

    /// Walking speed in pixels per second
    #[arg(long, default_value_t = DEFAULT_SPEED)]
    speed: f32,

    /// Seed for a reproducible walk
    #[arg(long)]
    seed: Option<u64>,
}

async fn run(client: &mut Client, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut input = match args.seed {
        Some(seed) => InputManager::seeded(seed, args.speed),
        None => InputManager::new(args.speed),
    };
    info!("Walking at {} px/s", input.speed());

    let started = Instant::now();
    let deadline = (args.duration_secs > 0)
        .then(|| started + Duration::from_secs(args.duration_secs));

    let mut frames = interval(FRAME_INTERVAL);
    let mut last_frame = started;
    let mut last_report = started;

    while client.is_open() {
        frames.tick().await;
        let now = Instant::now();

        if deadline.is_some_and(|deadline| now >= deadline) {
            info!("Run time elapsed");
            break;
        }

        if client.is_connected() {
            let (dx, dy) = input.update(now.saturating_duration_since(last_frame));
            client.move_local_player(dx, dy);
        }
        last_frame = now;

        client.update(now).await?;

        if now.saturating_duration_since(last_report) >= REPORT_INTERVAL {
            last_report = now;
            report(client, now);
        }
    }

    Ok(())
}

fn report(client: &Client, now: Instant) {
    let Some(id) = client.local_player_id() else {
        info!("Waiting for a slot...");
        return;
    };

    let (x, y) = client.game_state().local_position();
    info!("Player {} at ({:.0}, {:.0})", id, x, y);

    for (other, (x, y)) in client.game_state().remote_players(now) {
        info!("  sees player {} at ({:.0}, {:.0})", other, x, y);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Starting client...");
    info!("Connecting to: {}", args.server);

    let mut client = Client::connect(&args.server).await?;
    info!("Local address: {}", client.local_addr()?);

    tokio::select! {
        result = run(&mut client, &args) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    client.disconnect().await?;

    Ok(())
}
