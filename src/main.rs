// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/frigate-notify

//! frigate-notify - Frigate NVR event relay
//!
//! Subscribes to `frigate/events`, gates detections through the cooldown and
//! fans notifications out to every configured sink.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn, Level};
use frigate_notify::{logging, Config, Engine, VERSION};

/// frigate-notify - Frigate NVR event relay
#[derive(Parser, Debug)]
#[command(name = "frigate-notify")]
#[command(author = "bad-antics")]
#[command(version = VERSION)]
#[command(about = "Relays Frigate detections as cooldown-gated notifications")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace-level logging
    #[arg(long)]
    trace: bool,

    /// MQTT broker address
    #[arg(long)]
    mqtt_broker: Option<String>,

    /// Frigate HTTP API host
    #[arg(long)]
    frigate_host: Option<String>,

    /// Cooldown between notifications in seconds
    #[arg(long)]
    cooldown: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load or create configuration; its own log lines go to the console
    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let mut config = tracing::subscriber::with_default(logging::bootstrap_subscriber(), || {
        Config::load_or_create(&config_path)
    })?;

    // Initialize logging
    let log_level = if args.trace {
        Level::TRACE
    } else if args.debug {
        Level::DEBUG
    } else {
        config.log_level.parse().unwrap_or(Level::INFO)
    };
    logging::init(log_level, args.debug, &config.logging)?;

    info!("frigate-notify v{}", VERSION);

    // Override with command line args
    if let Some(mqtt) = args.mqtt_broker {
        config.frigate.mqtt_server = mqtt;
    }
    if let Some(host) = args.frigate_host {
        config.frigate.host = host;
    }
    if let Some(cooldown) = args.cooldown {
        config.frigate.cooldown_secs = cooldown;
    }

    info!("Configuration loaded from {:?}", config_path);
    if config.logging.file_enabled {
        info!("Logging to {:?}", config.logging.file_path());
    }
    info!(
        "Frigate at {}, MQTT broker {}:{}",
        config.frigate.api_url(),
        config.frigate.mqtt_server,
        config.frigate.mqtt_port
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(config, config_path))
}

async fn run(config: Config, config_path: PathBuf) -> Result<()> {
    let mut engine = Engine::new(config, &config_path).await?;
    engine.start().await?;

    info!("frigate-notify running");
    info!("   Press Ctrl+C to shutdown");

    // Wait for shutdown signal
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Listening for Ctrl+C failed: {}", e);
    }

    info!("Shutdown signal received, draining notifications...");
    engine.stop().await?;
    let state = engine.state().await;

    info!(
        dropped = state.notifications_dropped,
        "frigate-notify shutdown complete"
    );
    Ok(())
}
