//! flora: capture client CLI
//!
//! Captures a frame (or reads a photo), submits it to florad, and prints
//! the top match.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use flora::client::{
    Camera, CaptureSession, FrameSourceCamera, NoCamera, Phase, ServiceClient, TerminalDisplay,
};

/// Flora capture client
#[derive(Parser)]
#[command(name = "flora")]
#[command(version = flora::PKG_VERSION)]
#[command(about = "Identify a plant from a photo")]
struct Args {
    /// Service address
    #[arg(
        short,
        long,
        env = "FLORA_ADDRESS",
        default_value = "http://127.0.0.1:5000"
    )]
    address: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Identify a plant from the camera or a photo file
    Identify {
        /// Photo to upload (used when no camera is available)
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Frame source to capture from (an image file kept fresh by a capture tool)
        #[arg(short, long)]
        camera: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Command::Identify { file, camera } => {
            let use_camera = camera.is_some();
            let camera: Box<dyn Camera> = match camera {
                Some(device) => Box::new(FrameSourceCamera::new(device)),
                None => Box::new(NoCamera),
            };
            let mut session = CaptureSession::new(
                camera,
                Box::new(ServiceClient::new(&args.address)),
                Box::new(TerminalDisplay::stdout()),
            );

            session.acquire(use_camera, file.as_deref()).await?;

            if session.state().captured_image.is_none() {
                eprintln!("no image: pass --file, or --camera with a readable frame source");
                return Ok(ExitCode::from(2));
            }

            session.submit().await;

            Ok(match session.state().phase() {
                Phase::Success => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            })
        }
    }
}
