//! Airthings bridge
//!
//! Polls the Airthings consumer API and keeps one accessory per configured
//! device up to date until interrupted.

mod cli;
mod logging;

use anyhow::Result;
use at_accessory::AccessoryEvent;
use at_platform::Platform;
use clap::Parser;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = logging::init(cli.debug)?;

    info!("Starting Airthings bridge v{}", env!("CARGO_PKG_VERSION"));

    let validated = match at_config::load_config(&cli.config_dir, &cli.config_file) {
        Ok(validated) => validated,
        Err(err) => {
            // Nothing to poll without credentials
            error!("{}", err);
            error!("Airthings platform not started due to invalid configuration");
            tokio::signal::ctrl_c().await?;
            return Ok(());
        }
    };
    if validated.config.debug {
        log_level.enable_debug()?;
    }

    let mut platform = Platform::from_config(validated.config, &cli.config_dir)?;
    if let Err(err) = platform.load_cache().await {
        warn!("Ignoring unreadable accessory cache: {}", err);
    }
    platform.discover_devices()?;
    platform.save_cache().await?;

    let event_logger = spawn_event_logger(platform.cache().subscribe());
    platform.start().await;

    info!("Airthings bridge is running");

    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");

    platform.shutdown().await;
    platform.save_cache().await?;
    event_logger.abort();

    Ok(())
}

/// Log accessory changes as they are published
fn spawn_event_logger(mut events: broadcast::Receiver<AccessoryEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(AccessoryEvent::CharacteristicChanged(change)) => debug!(
                    "[{}] {} {}: {}",
                    change.display_name,
                    change.service_type,
                    change.characteristic,
                    change.new_value
                ),
                Ok(event) => trace!(?event, "Accessory event"),
                Err(RecvError::Lagged(n)) => warn!("Event logger lagged by {} events", n),
                Err(RecvError::Closed) => break,
            }
        }
    })
}
