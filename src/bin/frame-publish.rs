//! Frame publisher
//!
//! Pushes an encoded image to a relay stream at a fixed rate, standing in
//! for a camera.
//!
//! Run with: frame-publish --target 127.0.0.1:5000 --file frame.jpg [--fps 30]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use frame_relay::protocol::constants::DEFAULT_CHUNK_SIZE;
use frame_relay::FramePublisher;

#[derive(Parser, Debug)]
#[command(name = "frame-publish")]
#[command(version, about = "Send an encoded image to a frame relay stream")]
struct Args {
    /// Relay ingest address of the stream
    #[arg(long, short = 't')]
    target: SocketAddr,

    /// Encoded image to send
    #[arg(long, short = 'f')]
    file: PathBuf,

    /// Frames per second
    #[arg(long, default_value_t = 30.0)]
    fps: f64,

    /// Payload bytes per datagram
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Stop after this many frames
    #[arg(long)]
    count: Option<u64>,
}

/// Time between two frames at `fps`
fn frame_period(fps: f64) -> Result<Duration, String> {
    if !(fps > 0.0 && fps.is_finite()) {
        return Err(format!("--fps must be positive, got {}", fps));
    }

    let period = Duration::try_from_secs_f64(1.0 / fps)
        .map_err(|e| format!("--fps {} out of range: {}", fps, e))?;
    if period.is_zero() {
        return Err(format!("--fps {} out of range: period rounds to zero", fps));
    }

    Ok(period)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("frame_relay=info".parse()?)
                .add_directive("frame_publish=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let period = frame_period(args.fps)?;

    let frame = tokio::fs::read(&args.file).await?;
    let publisher = FramePublisher::connect_with_chunk_size(args.target, args.chunk_size).await?;

    info!(
        addr = %args.target,
        file = ?args.file,
        len = frame.len(),
        fps = args.fps,
        "Publishing"
    );

    let mut ticker = tokio::time::interval(period);
    let mut sent = 0u64;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {}
        }

        if let Err(e) = publisher.send_frame(&frame).await {
            warn!(error = %e, "Send failed");
            continue;
        }

        sent += 1;
        if args.count.is_some_and(|count| sent >= count) {
            break;
        }
    }

    info!(frames = sent, "Done");
    Ok(())
}
