//! Tracing setup

use anyhow::Result;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

const DEFAULT_FILTER: &str = "info";

const DEBUG_FILTER: &str = "info,airthings_bridge=debug,at_accessory=debug,at_api=debug,\
                            at_config=debug,at_core=debug,at_platform=debug";

/// Switches the log filter once the config file has been read
pub struct LogLevel {
    handle: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

impl LogLevel {
    /// Raise the bridge crates to debug unless `RUST_LOG` is in charge
    pub fn enable_debug(&self) -> Result<()> {
        if self.from_env {
            return Ok(());
        }
        self.handle.modify(|filter| *filter = EnvFilter::new(DEBUG_FILTER))?;
        Ok(())
    }
}

/// Install the global subscriber
///
/// `RUST_LOG` wins over everything, then `--debug`, then `info`.
pub fn init(debug: bool) -> Result<LogLevel> {
    let (filter, from_env) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (default_filter(debug), false),
    };

    let (filter, handle) = reload::Layer::new(filter);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init()?;

    Ok(LogLevel { handle, from_env })
}

fn default_filter(debug: bool) -> EnvFilter {
    EnvFilter::new(if debug { DEBUG_FILTER } else { DEFAULT_FILTER })
}
