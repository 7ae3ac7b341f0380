//! Airthings consumer API client
//!
//! Authenticates with the OAuth2 client-credentials grant, discovers the
//! account attached to the credentials and fetches the latest sensor values
//! for a set of devices.
//!
//! The refresh loop only sees the [`SensorSource`] trait, so tests can
//! replace the HTTP client with scripted results.

mod client;
mod error;
mod token;

use async_trait::async_trait;
use at_core::SensorResult;

pub use client::{AirthingsClient, Endpoints, API_BASE_URL, SCOPE, TOKEN_URL};
pub use error::{ApiError, ApiResult};
pub use token::{MAX_TOKEN_LIFETIME, TOKEN_EXPIRY_MARGIN};

/// Something that can produce the latest result for a device
#[async_trait]
pub trait SensorSource: Send + Sync {
    /// Latest sensor values for one serial number
    async fn latest(&self, serial_number: &str) -> ApiResult<SensorResult>;
}
