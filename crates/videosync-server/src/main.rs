//! Videosync server binary.
//!
//! # Usage
//!
//! ```bash
//! # API key from the environment or a .env file
//! YOUTUBE_API_KEY=... videosync-server --bind 0.0.0.0:8080
//!
//! # Explicit key, verbose logging
//! videosync-server --youtube-api-key ... --log-level debug
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use videosync_server::{RoomConfig, Server, ServerRuntimeConfig, YouTubeProvider};

/// Videosync watch-together server
#[derive(Parser, Debug)]
#[command(name = "videosync-server")]
#[command(about = "Synchronized video rooms over WebSockets")]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    bind: String,

    /// YouTube Data API key
    #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true)]
    youtube_api_key: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Upper bound on a single write to one member, in milliseconds
    #[arg(long, default_value = "5000")]
    send_timeout_ms: u64,

    /// Commands a room buffers before submitters wait
    #[arg(long, default_value = "10")]
    mailbox_capacity: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is normal; a broken one is worth failing on.
    match dotenvy::dotenv() {
        Ok(_) => {},
        Err(err) if err.not_found() => {},
        Err(err) => return Err(err.into()),
    }

    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("Videosync server starting");
    tracing::info!("Binding to {}", args.bind);

    let provider = YouTubeProvider::new(args.youtube_api_key)?;

    let config = ServerRuntimeConfig {
        bind_address: args.bind,
        room: RoomConfig {
            send_timeout: Duration::from_millis(args.send_timeout_ms),
            mailbox_capacity: args.mailbox_capacity,
            ..RoomConfig::default()
        },
    };

    let server = Server::bind(config, Arc::new(provider)).await?;

    tracing::info!("Server listening on {}", server.local_addr()?);

    server.run().await?;

    Ok(())
}
