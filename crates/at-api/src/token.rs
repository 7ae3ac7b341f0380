//! OAuth2 client-credentials token cache

use std::time::Duration;

use serde::Deserialize;
use tokio::time::Instant;

/// Renew the token once it is this close to expiring
pub const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(300);

/// Longest lifetime trusted from the token endpoint
pub const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// Token endpoint response
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
    #[serde(default)]
    #[allow(dead_code)]
    pub token_type: Option<String>,
}

/// A bearer token and the instant it stops being valid
#[derive(Debug, Clone)]
pub(crate) struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    pub fn from_response(response: TokenResponse) -> Self {
        let lifetime = Duration::from_secs(response.expires_in).min(MAX_TOKEN_LIFETIME);
        Self {
            value: response.access_token,
            expires_at: Instant::now() + lifetime,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether the token expires within `margin` from now
    pub fn expires_within(&self, margin: Duration) -> bool {
        Instant::now() + margin >= self.expires_at
    }
}
