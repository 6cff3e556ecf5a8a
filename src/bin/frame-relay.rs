//! Frame relay server
//!
//! Run with: frame-relay [-f CONFIG]
//!
//! Examples:
//!   frame-relay                          # reads ./application.yml
//!   frame-relay -f /etc/relay.yml        # custom config path
//!   RUST_LOG=frame_relay=debug frame-relay
//!
//! Viewers open `http://HOST:PORT/streams/<id>` in a browser; the list of
//! streams is at `/streams`.

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use frame_relay::{RelayConfig, RelayServer};

#[derive(Parser, Debug)]
#[command(name = "frame-relay")]
#[command(version, about = "Relay chunked UDP camera frames to HTTP viewers")]
struct Args {
    /// Path to the YAML configuration file
    #[arg(long, short = 'f', default_value = "application.yml")]
    file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("frame_relay=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let config = match RelayConfig::from_yaml_file(&args.file) {
        Ok(config) => {
            info!(path = ?args.file, "Loaded configuration");
            config
        }
        Err(e) => {
            error!(path = ?args.file, error = %e, "Failed to load configuration, using defaults");
            RelayConfig::default()
        }
    };

    info!("Configuration:");
    info!("  HTTP:       {}", config.http_addr());
    info!("  Chunk size: {} bytes", config.ingest.chunk_size);
    info!("  Max frame:  {} bytes", config.ingest.max_frame_size);
    info!("  Read timeout: {:?}", config.ingest.read_timeout);
    for (i, source) in config.source_streams.iter().enumerate() {
        info!(
            "  Source #{}: id={} port={} capacity={}",
            i + 1,
            source.id,
            source.port,
            source.capacity
        );
    }

    let server = RelayServer::new(config);

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    Ok(())
}
