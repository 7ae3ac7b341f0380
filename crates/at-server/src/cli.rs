//! Command line interface

use std::path::PathBuf;

use at_config::CONFIG_FILE;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "airthings-bridge")]
#[command(version)]
#[command(about = "Publish Airthings air quality monitors as HomeKit accessories")]
pub struct Cli {
    /// Directory holding config.yaml, secrets.yaml and the accessory cache
    #[arg(short, long, env = "AIRTHINGS_BRIDGE_CONFIG_DIR", default_value = ".")]
    pub config_dir: PathBuf,

    /// Config file, relative to the config directory
    #[arg(long, default_value = CONFIG_FILE)]
    pub config_file: PathBuf,

    /// Enable debug logging regardless of the config file
    #[arg(short, long)]
    pub debug: bool,
}
