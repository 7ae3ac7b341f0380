//! Airthings platform
//!
//! Ties configuration, the vendor API and the accessory cache together:
//!
//! - [`Platform`] discovers configured devices and runs their refresh loops
//! - [`DeviceHandler`] maps each fetched result onto one accessory
//!
//! # Example
//!
//! ```ignore
//! let validated = at_config::load_config(&config_dir, "config.yaml")?;
//! let mut platform = Platform::from_config(validated.config, &config_dir)?;
//! platform.load_cache().await?;
//! platform.discover_devices()?;
//! platform.start().await;
//! ```

mod error;
mod handler;
mod platform;
mod refresh;

pub use error::{PlatformError, PlatformResult};
pub use handler::{DeviceHandler, Features, AIR_PRESSURE_SUBTYPE};
pub use platform::Platform;
