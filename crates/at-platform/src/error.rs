//! Error types for the platform

use at_accessory::StorageError;
use at_api::ApiError;
use thiserror::Error;

/// Result type for platform operations
pub type PlatformResult<T> = Result<T, PlatformError>;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("No accessory registered for serial {serial}")]
    AccessoryNotFound { serial: String },
}
