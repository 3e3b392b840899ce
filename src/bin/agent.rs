//! Device agent: drives the transport client from the command line.
//!
//! Points a capture source (an image file standing in for the device screen)
//! at a collector and submits captures over the persistent channel.

use clap::Parser;
use log::{error, info};
use lucarne::transport::{DeviceCapabilities, FileCaptureSource, TransportClient};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "lucarne-agent")]
#[command(version = "0.0.1")]
#[command(about = "Device screenshot agent for the lucarne collector")]
struct Args {
    /// Collector channel address (e.g. 192.168.1.10:5001)
    server_addr: String,

    /// Image file the capture source replays
    #[arg(long)]
    image: PathBuf,

    /// Platform reported to the collector (e.g. iOS, Android)
    #[arg(long, default_value = "unknown")]
    platform: String,

    /// Device name (optional)
    #[arg(long, default_value = "unknown-device")]
    device_name: String,

    /// Device UDID (optional)
    #[arg(long)]
    udid: Option<String>,

    /// Number of captures to submit
    #[arg(long, default_value_t = 1)]
    count: u32,

    /// Seconds to wait between captures
    #[arg(long, default_value_t = 5)]
    interval: u64,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .init();

    let args = Args::parse();

    let mut capabilities =
        DeviceCapabilities::new(args.platform.as_str(), args.device_name.as_str());
    if let Some(udid) = &args.udid {
        capabilities = capabilities.with_udid(udid.as_str());
    }
    let source = FileCaptureSource::new(&args.image);
    let mut client = TransportClient::new(capabilities, Some(Box::new(source)));

    if let Err(e) = client.connect(&args.server_addr).await {
        error!("Unable to connect to collector: {}", e);
        std::process::exit(1);
    }

    for shot in 1..=args.count {
        let bytes = match client.acquire() {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Capture failed: {}", e);
                break;
            }
        };

        match client.send_capture(&bytes, Some(chrono::Utc::now())).await {
            Ok(ack) if ack.is_success() => {
                info!(
                    "Capture {}/{} stored as {}",
                    shot,
                    args.count,
                    ack.filename.unwrap_or_default()
                );
            }
            Ok(ack) => {
                error!(
                    "Collector rejected capture {}/{}: {}",
                    shot,
                    args.count,
                    ack.message.unwrap_or_else(|| "no reason given".to_string())
                );
            }
            Err(e) => {
                // The event is lost; there is no offline queue to replay it.
                error!("Capture {}/{} not delivered: {}", shot, args.count, e);
                break;
            }
        }

        if shot < args.count {
            tokio::time::sleep(Duration::from_secs(args.interval)).await;
        }
    }

    client.disconnect().await;
    info!("Agent stopped");
}
