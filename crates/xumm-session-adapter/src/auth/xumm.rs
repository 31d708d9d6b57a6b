/*
[INPUT]:  REST client, surface opener, optional launch token and session store
[OUTPUT]: Authorized user, environment snapshot, ordered lifecycle events
[POS]:    Auth layer - authorizer backed by the platform API and sign-in payloads
[UPDATE]: When sign-in steps or persistence rules change
*/

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::auth::{AuthEvent, AuthEventBus, Authorizer, SessionStore};
use crate::http::{Result, XummClient, XummError};
use crate::signing::{DEFAULT_SURFACE_CLOSE_GRACE, SignOptions, SigningFlow};
use crate::surface::SurfaceOpener;
use crate::types::{ApplicationDetails, Environment, OttData, PayloadBody, User};

#[derive(Debug, Default)]
struct AuthState {
    application: Option<ApplicationDetails>,
    ott: Option<OttData>,
    user: Option<User>,
}

/// Authorizer for the Xumm platform
///
/// Standalone apps sign in with a `SignIn` payload. Apps launched inside the
/// embedded host pass the host's one-time token and are signed in from the
/// launch context.
pub struct XummAuthorizer {
    client: Arc<XummClient>,
    surfaces: Arc<dyn SurfaceOpener>,
    store: Option<SessionStore>,
    ott: Option<String>,
    sign_in: PayloadBody,
    surface_close_grace: Duration,
    surface_closes: TaskTracker,
    events: AuthEventBus,
    state: RwLock<AuthState>,
}

impl XummAuthorizer {
    pub fn new(client: Arc<XummClient>, surfaces: Arc<dyn SurfaceOpener>) -> Self {
        Self {
            client,
            surfaces,
            store: None,
            ott: None,
            sign_in: PayloadBody::sign_in(),
            surface_close_grace: DEFAULT_SURFACE_CLOSE_GRACE,
            surface_closes: TaskTracker::new(),
            events: AuthEventBus::new(),
            state: RwLock::new(AuthState::default()),
        }
    }

    /// Sign in from an embedded-host one-time token
    pub fn with_ott(mut self, token: impl Into<String>) -> Self {
        self.ott = Some(token.into()).filter(|token: &String| !token.trim().is_empty());
        self
    }

    /// Persist the signed-in user across restarts
    pub fn with_store(mut self, store: SessionStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Body used for the sign-in request
    pub fn with_sign_in_body(mut self, body: PayloadBody) -> Self {
        self.sign_in = body;
        self
    }

    pub fn with_surface_close_grace(mut self, grace: Duration) -> Self {
        self.surface_close_grace = grace;
        self
    }

    pub fn is_embedded(&self) -> bool {
        self.ott.is_some()
    }

    pub fn client(&self) -> &XummClient {
        &self.client
    }

    /// Pick up a persisted user, emitting `Retrieved` when one exists
    pub fn restore(&self) -> bool {
        let Some(stored) = self.store.as_ref().and_then(SessionStore::load) else {
            return false;
        };
        info!(account = %stored.user.account, stored_at = %stored.stored_at, "restored session");
        self.write().user = Some(stored.user);
        self.events.emit(AuthEvent::Retrieved);
        true
    }

    async fn sign_in_with_payload(&self) -> Result<User> {
        let record = SigningFlow::new(self.client.as_ref(), self.surfaces.as_ref())
            .surface_close_grace(self.surface_close_grace)
            .track_surface_closes(&self.surface_closes)
            .run(&self.sign_in, SignOptions::default())
            .await?
            .ok_or_else(|| XummError::Authentication {
                message: "sign-in request was not resolved".to_string(),
            })?;

        User::from_sign_in(&record).ok_or_else(|| XummError::Authentication {
            message: "sign-in request was rejected".to_string(),
        })
    }

    async fn sign_in_with_ott(&self, token: &str) -> Result<User> {
        let ott = self.client.get_ott(token).await?;
        let user = User::from_ott(&ott).ok_or_else(|| XummError::Authentication {
            message: "launch context carries no account".to_string(),
        })?;
        self.write().ott = Some(ott);
        Ok(user)
    }

    fn remember(&self, user: &User) {
        self.write().user = Some(user.clone());
        if let Some(store) = &self.store {
            if let Err(err) = store.save(user) {
                warn!(path = %store.session_file_path().display(), error = %err, "failed to persist session");
            }
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, AuthState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, AuthState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Authorizer for XummAuthorizer {
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    async fn authorize(&self) -> Result<()> {
        let pong = self.client.ping().await?;
        info!(application = %pong.auth.application.name, "application verified");
        self.write().application = Some(pong.auth.application);
        self.events.emit(AuthEvent::Ready);

        match self.ott.as_deref() {
            Some(token) => {
                let user = self.sign_in_with_ott(token).await?;
                info!(account = %user.account, "signed in from launch context");
                self.remember(&user);
                self.events.emit(AuthEvent::Retrieved);
            }
            None => {
                let user = self.sign_in_with_payload().await?;
                info!(account = %user.account, "signed in");
                self.remember(&user);
                self.events.emit(AuthEvent::Success);
            }
        }
        Ok(())
    }

    async fn logout(&self) -> Result<()> {
        {
            let mut state = self.write();
            state.user = None;
            state.ott = None;
        }
        if let Some(store) = &self.store {
            store.clear()?;
        }
        info!("logged out");
        self.events.emit(AuthEvent::LoggedOut);
        Ok(())
    }

    async fn user(&self) -> Result<Option<User>> {
        Ok(self.read().user.clone())
    }

    async fn environment(&self) -> Result<Option<Environment>> {
        let state = self.read();
        if state.application.is_none() && state.ott.is_none() {
            return Ok(None);
        }
        Ok(Some(Environment {
            application: state.application.clone(),
            ott: state.ott.clone(),
            embedded: self.is_embedded(),
        }))
    }

    async fn shutdown(&self) {
        self.surface_closes.close();
        debug!(pending = self.surface_closes.len(), "waiting for sign-in surface closes");
        self.surface_closes.wait().await;
    }
}
