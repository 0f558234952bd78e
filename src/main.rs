//! Chime entry point - starts the playback service and begins the
//! configured track.
//!
//! The process stays alive until interrupted or until the user dismisses
//! the playback notification, then tears the service down.

use std::error::Error;

use clap::{Parser, Subcommand};
use tracing::info;

use chime::{config::Config, services::playback::PlaybackService, tracing_config};

#[derive(Parser)]
#[command(name = "chime", version, about = "Single-track audio playback daemon")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the playback service and begin the configured track
    Start,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Start) {
        Command::Start => run().await,
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    tracing_config::init_with_file()?;
    info!("Starting chime");

    let config = Config::load()?;
    let service = PlaybackService::start(config).await?;
    service.begin().await?;

    wait_for_stop(&service).await?;

    service.shutdown().await?;
    Ok(())
}

/// Blocks until Ctrl-C or a user-dismissed notification.
async fn wait_for_stop(service: &PlaybackService) -> Result<(), Box<dyn Error>> {
    match service.dismissed() {
        Some(mut dismissed) => {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    result?;
                    info!("Interrupted, stopping");
                }
                changed = dismissed.changed() => {
                    if changed.is_ok() && *dismissed.borrow() {
                        info!("Notification dismissed by user, stopping");
                    }
                }
            }
        }
        None => {
            tokio::signal::ctrl_c().await?;
            info!("Interrupted, stopping");
        }
    }

    Ok(())
}
