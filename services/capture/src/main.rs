use anyhow::{Context, Result};
use clap::Parser;
use selfie_capture::{CaptureConfig, CaptureSession, HttpUploadClient, StillImageSource};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Capture a selfie from an image file and upload it with a name
#[derive(Debug, Parser)]
#[command(name = "selfie-capture", version)]
struct Args {
    /// Name stored alongside the selfie
    #[arg(long)]
    name: String,

    /// Image file standing in for the camera frame
    #[arg(long)]
    image: PathBuf,

    /// Upload endpoint (overrides configuration)
    #[arg(long)]
    endpoint: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = CaptureConfig::load().context("Failed to load configuration")?;

    init_tracing(&config.log_level);

    let client = HttpUploadClient::new(args.endpoint.unwrap_or(config.endpoint));
    let mut camera = StillImageSource::new(&args.image);
    let mut session = CaptureSession::new();

    session.start_capture()?;
    session
        .capture(&mut camera)
        .context("Failed to capture frame")?;
    session.set_name(args.name)?;

    info!(endpoint = %client.endpoint(), "Uploading selfie");

    let receipt = session.upload(&client).await?;

    println!("{} (id: {})", receipt.message, receipt.id);

    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
