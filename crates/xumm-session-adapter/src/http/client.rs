/*
[INPUT]:  HTTP configuration (base URLs, timeouts) and API key credentials
[OUTPUT]: Configured reqwest client ready for platform API calls
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
*/

use std::fmt;
use std::time::Duration;

use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use crate::http::{Result, XummError};

/// Base URL for the Xumm platform REST API
pub const API_BASE_URL: &str = "https://xumm.app/api/v1/";
/// Base URL for payload status websockets (`{base}{uuid}`)
pub const WS_BASE_URL: &str = "wss://xumm.app/sign/";

const API_KEY_HEADER: &str = "X-API-Key";
const API_SECRET_HEADER: &str = "X-API-Secret";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub api_base_url: String,
    pub ws_base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            api_base_url: API_BASE_URL.to_string(),
            ws_base_url: WS_BASE_URL.to_string(),
        }
    }
}

/// Application credentials issued by the developer console
#[derive(Clone)]
pub struct ApiCredentials {
    pub api_key: String,
    pub api_secret: String,
}

impl ApiCredentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    reference: Option<String>,
    #[serde(default)]
    code: Option<i32>,
    #[serde(default)]
    message: Option<String>,
}

/// Main HTTP client for the Xumm platform API
#[derive(Debug)]
pub struct XummClient {
    http_client: Client,
    api_base_url: Url,
    ws_base_url: Url,
    credentials: ApiCredentials,
}

impl XummClient {
    /// Create a new client with default configuration
    pub fn new(credentials: ApiCredentials) -> Result<Self> {
        Self::with_config(credentials, ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(credentials: ApiCredentials, config: ClientConfig) -> Result<Self> {
        if credentials.api_key.trim().is_empty() {
            return Err(XummError::Config("API key must not be empty".to_string()));
        }

        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http_client,
            api_base_url: parse_base_url(&config.api_base_url)?,
            ws_base_url: parse_base_url(&config.ws_base_url)?,
            credentials,
        })
    }

    /// Get the configured credentials
    pub fn credentials(&self) -> &ApiCredentials {
        &self.credentials
    }

    /// REST base URL in use
    pub fn api_base_url(&self) -> &Url {
        &self.api_base_url
    }

    /// Websocket URL carrying status updates for one payload
    pub fn subscription_url(&self, uuid: Uuid) -> Result<Url> {
        Ok(self.ws_base_url.join(&uuid.to_string())?)
    }

    /// Build full URL for API endpoints
    fn api_url(&self, endpoint: &str) -> std::result::Result<Url, url::ParseError> {
        self.api_base_url.join(endpoint.trim_start_matches('/'))
    }

    /// Build an authenticated request builder for API endpoints
    pub(crate) fn api_request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let url = self.api_url(endpoint)?;
        debug!(%method, %url, "api request");
        Ok(self
            .http_client
            .request(method, url)
            .header(API_KEY_HEADER, &self.credentials.api_key)
            .header(API_SECRET_HEADER, &self.credentials.api_secret))
    }

    /// Send a request and decode a JSON body, mapping non-2xx statuses to errors
    pub(crate) async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(error_from_response(response).await);
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    if raw.ends_with('/') {
        Ok(Url::parse(raw)?)
    } else {
        Ok(Url::parse(&format!("{raw}/"))?)
    }
}

async fn error_from_response(response: Response) -> XummError {
    let status = response.status();
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());
    let body = response.text().await.unwrap_or_default();
    map_error_status(status, retry_after, &body)
}

fn map_error_status(status: StatusCode, retry_after: Option<u64>, body: &str) -> XummError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok().map(|e| e.error);

    let message = parsed
        .as_ref()
        .and_then(|error| {
            error.message.clone().or_else(|| {
                error
                    .reference
                    .as_ref()
                    .map(|reference| format!("reference {reference}"))
            })
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        });

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => XummError::Authentication { message },
        StatusCode::TOO_MANY_REQUESTS => XummError::RateLimit {
            retry_after: retry_after.unwrap_or(1),
        },
        _ => match parsed.and_then(|error| error.code) {
            Some(code) => XummError::Api { code, message },
            None => XummError::api_error(status, message),
        },
    }
}
