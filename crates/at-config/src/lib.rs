//! Configuration loading for the Airthings bridge
//!
//! `config.yaml` may pull credentials from `secrets.yaml` with `!secret key`
//! or from the environment with `!env_var NAME`.
//!
//! # Example
//!
//! ```ignore
//! use at_config::load_config;
//!
//! let validated = load_config("/etc/airthings-bridge", "config.yaml")?;
//! for device in &validated.config.devices {
//!     println!("{} every {}s", device.name, device.refresh_interval_secs);
//! }
//! ```

mod error;
mod loader;
mod platform;
mod secrets;

use std::path::{Path, PathBuf};

pub use error::{ConfigError, ConfigResult};
pub use loader::{read_config, CONFIG_FILE};
pub use platform::{
    ConfigWarning, Credentials, DeviceConfig, PlatformConfig, RawDeviceConfig,
    RawPlatformConfig, ValidatedConfig, DEFAULT_PLATFORM_NAME, DEFAULT_REFRESH_INTERVAL_SECS,
    MIN_REFRESH_INTERVAL_SECS,
};

// Re-export serde_yaml::Value for convenience
pub use serde_yaml::Value;

/// Load and validate the platform configuration
pub fn load_config(
    config_dir: impl Into<PathBuf>,
    file: impl AsRef<Path>,
) -> ConfigResult<ValidatedConfig> {
    read_config(config_dir, file)?.validate()
}
