//! HTTP client for the Airthings consumer API

use std::time::Duration;

use at_core::SensorResult;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, trace};

use crate::error::{ApiError, ApiResult};
use crate::token::{AccessToken, TokenResponse, TOKEN_EXPIRY_MARGIN};
use crate::SensorSource;

/// OAuth2 token endpoint
pub const TOKEN_URL: &str = "https://accounts-api.airthings.com/v1/token";

/// Consumer API base URL
pub const API_BASE_URL: &str = "https://consumer-api.airthings.com/v1";

/// Scope requested for the client-credentials grant
pub const SCOPE: &str = "read:device:current_values";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the client sends its requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub token_url: String,
    pub base_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            token_url: TOKEN_URL.to_string(),
            base_url: API_BASE_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// Production endpoints with optional overrides
    pub fn new(base_url: Option<&str>, token_url: Option<&str>) -> Self {
        let defaults = Self::default();
        Self {
            token_url: token_url.map(str::to_string).unwrap_or(defaults.token_url),
            base_url: base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AccountsResponse {
    #[serde(default)]
    accounts: Vec<Account>,
}

#[derive(Debug, Deserialize)]
struct Account {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SensorsResponse {
    #[serde(default)]
    results: Vec<SensorResult>,
}

/// Airthings consumer API client
///
/// One client is shared by every device. The access token and account id
/// are fetched lazily and cached for the lifetime of the client.
pub struct AirthingsClient {
    http: Client,
    endpoints: Endpoints,
    credentials: Option<(String, String)>,
    token: Mutex<Option<AccessToken>>,
    account_id: OnceCell<String>,
}

impl AirthingsClient {
    /// Create a client against the production endpoints
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> ApiResult<Self> {
        Self::with_endpoints(client_id, client_secret, Endpoints::default())
    }

    /// Create a client against custom endpoints
    ///
    /// Empty credentials produce a client whose every request fails with
    /// [`ApiError::NotInitialized`].
    pub fn with_endpoints(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        endpoints: Endpoints,
    ) -> ApiResult<Self> {
        let client_id = client_id.into();
        let client_secret = client_secret.into();
        let credentials = (!client_id.is_empty() && !client_secret.is_empty())
            .then_some((client_id, client_secret));

        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http,
            endpoints,
            credentials,
            token: Mutex::new(None),
            account_id: OnceCell::new(),
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Latest sensor values for the given serial numbers
    pub async fn fetch_latest(&self, serials: &[String]) -> ApiResult<Vec<SensorResult>> {
        let account_id = self.account_id().await?;
        let url = format!("{}/accounts/{}/sensors", self.endpoints.base_url, account_id);

        let mut query: Vec<(&str, &str)> = serials.iter().map(|sn| ("sn", sn.as_str())).collect();
        query.push(("unit", "metric"));

        let response: SensorsResponse = self.get_json(&url, &query).await?;
        debug!(
            "Fetched {} sensor results for {} serials",
            response.results.len(),
            serials.len()
        );
        Ok(response.results)
    }

    /// Account id, discovered on first use
    pub async fn account_id(&self) -> ApiResult<&str> {
        let id = self
            .account_id
            .get_or_try_init(|| async {
                let url = format!("{}/accounts", self.endpoints.base_url);
                let response: AccountsResponse = self.get_json(&url, &[]).await?;
                let account = response.accounts.into_iter().next().ok_or(ApiError::NoAccount)?;
                debug!(
                    "Using Airthings account {} ({})",
                    account.id,
                    account.name.as_deref().unwrap_or("unnamed")
                );
                Ok::<_, ApiError>(account.id)
            })
            .await?;
        Ok(id.as_str())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> ApiResult<T> {
        let token = self.access_token().await?;
        trace!("GET {}", url);

        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            // Force a new token exchange next time
            self.token.lock().await.take();
        }

        let body = Self::check_status(response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Current access token, renewed when close to expiry
    async fn access_token(&self) -> ApiResult<String> {
        let (client_id, client_secret) =
            self.credentials.as_ref().ok_or(ApiError::NotInitialized)?;

        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if !token.expires_within(TOKEN_EXPIRY_MARGIN) {
                return Ok(token.value().to_string());
            }
        }

        debug!("Requesting new Airthings access token");
        let response = self
            .http
            .post(&self.endpoints.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
                ("scope", SCOPE),
            ])
            .send()
            .await?;

        let body = match Self::check_status(response).await {
            Ok(body) => body,
            Err(ApiError::Status { status, body }) => {
                return Err(ApiError::Unauthorized(format!(
                    "token request failed with status {}: {}",
                    status, body
                )))
            }
            Err(e) => return Err(e),
        };

        let token = AccessToken::from_response(serde_json::from_str::<TokenResponse>(&body)?);
        let value = token.value().to_string();
        *cached = Some(token);
        Ok(value)
    }

    /// Map error statuses and return the body of a successful response
    async fn check_status(response: Response) -> ApiResult<String> {
        let status = response.status();
        let body = response.text().await?;

        match status {
            s if s.is_success() => Ok(body),
            StatusCode::TOO_MANY_REQUESTS => Err(ApiError::RateLimited),
            StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized(body)),
            s => Err(ApiError::Status {
                status: s.as_u16(),
                body,
            }),
        }
    }
}

#[async_trait]
impl SensorSource for AirthingsClient {
    async fn latest(&self, serial_number: &str) -> ApiResult<SensorResult> {
        let results = self.fetch_latest(&[serial_number.to_string()]).await?;
        results
            .into_iter()
            .find(|r| r.serial_number == serial_number)
            .ok_or_else(|| ApiError::NoResults {
                serial: serial_number.to_string(),
            })
    }
}
