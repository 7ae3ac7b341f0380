//! Error types for the vendor API client

use thiserror::Error;

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced by the vendor API client
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure (connect, timeout, TLS)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status other than 401 and 429
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// Token exchange failed or the API rejected the access token
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Too many requests
    #[error("rate limited by the Airthings API")]
    RateLimited,

    /// Response body did not match the expected schema
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Client was built without credentials
    #[error("Airthings API client not initialized due to invalid configuration")]
    NotInitialized,

    /// The credentials have no account attached
    #[error("no Airthings account available for these credentials")]
    NoAccount,

    /// The API answered but returned nothing for the requested device
    #[error("no sensor results found for {serial}")]
    NoResults { serial: String },
}

impl ApiError {
    /// Whether raising the refresh interval would help
    pub fn is_rate_limited(&self) -> bool {
        match self {
            ApiError::RateLimited => true,
            ApiError::Status { status, body } => {
                *status == 429 || body.to_ascii_lowercase().contains("rate limit")
            }
            ApiError::Unauthorized(message) => {
                message.to_ascii_lowercase().contains("rate limit")
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_detection() {
        assert!(ApiError::RateLimited.is_rate_limited());
        assert!(ApiError::Status {
            status: 503,
            body: "Rate limit exceeded, retry later".to_string()
        }
        .is_rate_limited());
        assert!(!ApiError::Status {
            status: 500,
            body: "internal".to_string()
        }
        .is_rate_limited());
        assert!(!ApiError::NoAccount.is_rate_limited());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ApiError::NoResults {
                serial: "2930000001".to_string()
            }
            .to_string(),
            "no sensor results found for 2930000001"
        );
    }
}
