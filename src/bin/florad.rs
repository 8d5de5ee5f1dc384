//! florad: Flora identification daemon.
//!
//! Serves `POST /api/identify` over HTTP, brokering uploads to the
//! Plant.id API so clients never see the provider key.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use flora::providers::PlantIdClient;
use flora::server::config::{API_KEY_ENV, Config, Secrets};
use flora::server::{FloraService, ServiceOptions, serve};
use flora::FloraError;

/// Flora daemon: plant identification service.
#[derive(Parser)]
#[command(name = "florad")]
#[command(version = flora::PKG_VERSION)]
#[command(about = "Flora plant identification daemon")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config and PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // Load configuration
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    let secrets = Secrets::load()?;

    let provider = build_provider(&config, &secrets)?;
    let router = FloraService::new(Arc::new(provider), ServiceOptions::from_config(&config))
        .router()?;

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound = listener.local_addr()?;

    info!(
        version = flora::version_string(),
        port = bound.port(),
        allowed_origin = %config.server.allowed_origin,
        "server running"
    );

    serve(listener, router, shutdown_signal()).await?;

    info!("florad stopped");
    Ok(())
}

/// Build the Plant.id provider from configuration and secrets.
fn build_provider(config: &Config, secrets: &Secrets) -> Result<PlantIdClient, FloraError> {
    let key = secrets.plant_id_key().ok_or_else(|| {
        FloraError::Configuration(format!(
            "No Plant.id API key. Set {API_KEY_ENV} or add [plant_id] api_key to secrets.toml"
        ))
    })?;

    let client = PlantIdClient::with_base_url(
        key,
        &config.provider.base_url,
        Duration::from_secs(config.provider.timeout_secs),
    )?;
    Ok(client.with_invasive_species(config.invasive.build()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
