/*
[INPUT]:  YAML configuration file
[OUTPUT]: Parsed session configuration and derived adapter settings
[POS]:    Configuration layer - credentials, endpoints, session storage
[UPDATE]: When adding new configuration options
*/

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use xumm_session_adapter::http::{API_BASE_URL, WS_BASE_URL};
use xumm_session_adapter::{ApiCredentials, ClientConfig, ControllerConfig, SessionStore};

/// Top-level configuration for the session runner
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Application credentials from the developer console
    pub credentials: CredentialsConfig,
    /// Service endpoints and timeouts
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    /// One-time token handed over by the embedded host
    #[serde(default)]
    pub ott: Option<String>,
    /// Run as an app embedded in the wallet host
    #[serde(default)]
    pub embedded: bool,
    /// Where the signed-in session is persisted
    #[serde(default)]
    pub session_dir: Option<PathBuf>,
    /// Delay before a finished redirect surface is closed
    #[serde(default = "default_surface_close_grace_ms")]
    pub surface_close_grace_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CredentialsConfig {
    pub api_key: String,
    /// Falls back to `XUMM_API_SECRET` when empty
    #[serde(default)]
    pub api_secret: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_ws_base_url")]
    pub ws_base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            ws_base_url: default_ws_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

const API_SECRET_ENV: &str = "XUMM_API_SECRET";

fn default_api_base_url() -> String {
    API_BASE_URL.to_string()
}

fn default_ws_base_url() -> String {
    WS_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_surface_close_grace_ms() -> u64 {
    500
}

impl SessionConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let mut config: Self = serde_yaml::from_str(content)?;
        if config.credentials.api_secret.trim().is_empty() {
            if let Ok(secret) = std::env::var(API_SECRET_ENV) {
                config.credentials.api_secret = secret;
            }
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.credentials.api_key.trim().is_empty() {
            bail!("credentials.api_key must not be empty");
        }
        if self.credentials.api_secret.trim().is_empty() {
            bail!("credentials.api_secret must be set (or export {API_SECRET_ENV})");
        }
        if self.endpoints.request_timeout_secs == 0 {
            bail!("endpoints.request_timeout_secs must be positive");
        }
        if self.embedded && self.ott_token().is_none() {
            bail!("embedded mode requires an ott launch token");
        }
        Ok(())
    }

    pub fn ott_token(&self) -> Option<&str> {
        self.ott
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    pub fn api_credentials(&self) -> ApiCredentials {
        ApiCredentials::new(
            self.credentials.api_key.trim(),
            self.credentials.api_secret.trim(),
        )
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.endpoints.request_timeout_secs),
            api_base_url: self.endpoints.api_base_url.clone(),
            ws_base_url: self.endpoints.ws_base_url.clone(),
            ..ClientConfig::default()
        }
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            surface_close_grace: Duration::from_millis(self.surface_close_grace_ms),
        }
    }

    pub fn session_store(&self) -> anyhow::Result<SessionStore> {
        let dir = match &self.session_dir {
            Some(dir) => dir.clone(),
            None => SessionStore::default_dir().context("no data directory for session storage")?,
        };
        Ok(SessionStore::new(dir))
    }
}
