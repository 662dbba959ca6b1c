use clap::Parser;
use log::info;
use server::config::{ServerConfig, DEFAULT_PEER_TIMEOUT, DEFAULT_POLL_TIMEOUT};
use server::network::Server;
use shared::{DEFAULT_PORT, MAX_PLAYERS};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Number of player slots
    #[arg(short, long, default_value_t = MAX_PLAYERS)]
    max_players: usize,

    /// How long one event wait may block, in milliseconds
    #[arg(long, default_value_t = DEFAULT_POLL_TIMEOUT.as_millis() as u64)]
    poll_timeout_ms: u64,

    /// Seconds of silence before a peer is dropped
    #[arg(long, default_value_t = DEFAULT_PEER_TIMEOUT.as_secs())]
    peer_timeout_secs: u64,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        ServerConfig {
            host: args.host,
            port: args.port,
            max_players: args.max_players,
            poll_timeout: Duration::from_millis(args.poll_timeout_ms),
            peer_timeout: Duration::from_secs(args.peer_timeout_secs),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let config = ServerConfig::from(Args::parse());

    info!("Starting server...");
    info!("Binding to: {}", config.bind_address());
    info!("Player slots: {}", config.max_players);

    let mut server = Server::new(&config).await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
