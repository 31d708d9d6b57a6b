/*
[INPUT]:  SessionConfig, shutdown token, payload files
[OUTPUT]: Results of ping / connect / sign / status / disconnect commands
[POS]:    Execution layer - wires adapter capabilities into a controller
[UPDATE]: When adding commands or changing startup wiring
*/

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result, anyhow, bail};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use xumm_session_adapter::{
    HostContext, PayloadBody, PayloadRecord, Pong, Session, SignOptions, SigningSessionController,
    SurfaceOpener, XummAuthorizer, XummClient,
};

use crate::config::SessionConfig;
use crate::surface::{ConsoleHost, ConsoleSurfaceOpener};

const RESTORE_WAIT: Duration = Duration::from_secs(2);

/// One configured session: REST client, authorizer and controller
pub struct SessionRunner {
    client: Arc<XummClient>,
    authorizer: Arc<XummAuthorizer>,
    controller: SigningSessionController,
    shutdown: CancellationToken,
}

impl SessionRunner {
    /// Build the runner; must be called inside a Tokio runtime
    pub fn from_config(config: &SessionConfig, shutdown: CancellationToken) -> Result<Self> {
        Self::with_surfaces(config, shutdown, Arc::new(ConsoleSurfaceOpener))
    }

    pub fn with_surfaces(
        config: &SessionConfig,
        shutdown: CancellationToken,
        surfaces: Arc<dyn SurfaceOpener>,
    ) -> Result<Self> {
        let client = Arc::new(
            XummClient::with_config(config.api_credentials(), config.client_config())
                .context("create api client")?,
        );

        let mut authorizer = XummAuthorizer::new(client.clone(), surfaces.clone())
            .with_store(config.session_store()?)
            .with_surface_close_grace(config.controller_config().surface_close_grace);
        if let Some(token) = config.ott_token() {
            authorizer = authorizer.with_ott(token);
        }
        let authorizer = Arc::new(authorizer);

        let host = if config.embedded {
            HostContext::embedded(Arc::new(ConsoleHost::new(shutdown.clone())))
        } else {
            HostContext::Standalone
        };

        let controller = SigningSessionController::new(
            authorizer.clone(),
            client.clone(),
            surfaces,
            host,
            config.controller_config(),
        );
        debug!(embedded = config.embedded, "session runner ready");

        Ok(Self {
            client,
            authorizer,
            controller,
            shutdown,
        })
    }

    pub fn controller(&self) -> &SigningSessionController {
        &self.controller
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Verify credentials
    pub async fn ping(&self) -> Result<Pong> {
        self.interruptible(async { self.client.ping().await.map_err(anyhow::Error::from) })
            .await
            .context("ping platform")
    }

    /// Sign in and return the populated session
    pub async fn connect(&self) -> Result<Session> {
        self.interruptible(async { self.controller.connect().await.map_err(anyhow::Error::from) })
            .await
            .context("sign in")?;
        self.wait_for_user(None).await
    }

    /// Session restored from storage
    pub async fn status(&self) -> Result<Session> {
        if !self.authorizer.restore() {
            return Ok(self.controller.session());
        }
        self.wait_for_user(Some(RESTORE_WAIT)).await
    }

    /// Request a signature, pushing to the stored user's device when possible
    pub async fn sign(
        &self,
        mut body: PayloadBody,
        timeout: Option<Duration>,
    ) -> Result<Option<PayloadRecord>> {
        let session = self.status().await?;
        if body.user_token.is_none() {
            if let Some(token) = session.user.and_then(|user| user.token) {
                body = body.with_user_token(token);
            }
        }

        let mut options = SignOptions::new();
        if let Some(timeout) = timeout {
            options = options.timeout(timeout);
        }

        let signing = async {
            self.controller
                .sign_transaction(&body, options)
                .await
                .map_err(anyhow::Error::from)
        };
        self.interruptible(signing)
            .await
            .context("sign transaction")
    }

    /// End the session (or ask the embedded host to close)
    pub async fn disconnect(&self) -> Result<()> {
        self.authorizer.restore();
        self.controller
            .disconnect()
            .await
            .context("disconnect session")?;
        info!(embedded = self.controller.is_embedded(), "session ended");
        Ok(())
    }

    pub async fn close(self) {
        self.controller.shutdown().await;
    }

    async fn wait_for_user(&self, limit: Option<Duration>) -> Result<Session> {
        let mut rx = self.controller.subscribe_session();
        let wait = async {
            rx.wait_for(|session| session.user.is_some())
                .await
                .map(|session| session.clone())
                .map_err(|_| anyhow!("session channel closed"))
        };
        let session = match limit {
            Some(limit) => tokio::time::timeout(limit, wait)
                .await
                .context("timed out waiting for session")??,
            None => self.interruptible(wait).await?,
        };
        Ok(session)
    }

    async fn interruptible<T>(&self, work: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            _ = self.shutdown.cancelled() => bail!("interrupted"),
            result = work => result,
        }
    }
}

/// Read a payload body from a JSON file
///
/// Accepts either a full body (`{"txjson": {...}, "options": {...}}`) or a
/// bare transaction object.
pub fn load_payload_body(path: &Path) -> Result<PayloadBody> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read payload file {}", path.display()))?;
    parse_payload_body(&content)
}

pub fn parse_payload_body(content: &str) -> Result<PayloadBody> {
    let value: serde_json::Value = serde_json::from_str(content).context("payload is not JSON")?;
    let is_full_body = value
        .as_object()
        .is_some_and(|object| object.contains_key("txjson") || object.contains_key("txblob"));
    if is_full_body {
        return serde_json::from_value(value).context("invalid payload body");
    }
    if !value.is_object() {
        bail!("payload must be a JSON object");
    }
    Ok(PayloadBody::from_txjson(value))
}
