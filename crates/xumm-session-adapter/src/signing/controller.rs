/*
[INPUT]:  Authorizer events, payload capability, surface opener, host context
[OUTPUT]: Observable Session snapshots, sign state, connect/disconnect/sign operations
[POS]:    Signing layer - session controller composing auth, payloads and surfaces
[UPDATE]: When session mirroring or controller operations change
*/

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::auth::{AuthEvent, Authorizer};
use crate::http::{Result, XummError};
use crate::signing::flow::{DEFAULT_SURFACE_CLOSE_GRACE, SignOptions, SignState, SigningFlow};
use crate::signing::PayloadApi;
use crate::surface::{HostContext, SurfaceOpener};
use crate::types::{PayloadBody, PayloadRecord, Session};

const COMMAND_BUFFER: usize = 8;

/// Controller tuning
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Delay before a redirect surface is closed after resolution
    pub surface_close_grace: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            surface_close_grace: DEFAULT_SURFACE_CLOSE_GRACE,
        }
    }
}

enum SessionCommand {
    Clear { ack: oneshot::Sender<()> },
}

/// Stateful binding between an application and the wallet service
///
/// Session state is owned by a single background task that applies
/// authorizer events one at a time and publishes whole snapshots through a
/// watch channel. Must be created inside a Tokio runtime.
pub struct SigningSessionController {
    authorizer: Arc<dyn Authorizer>,
    payloads: Arc<dyn PayloadApi>,
    surfaces: Arc<dyn SurfaceOpener>,
    host: HostContext,
    config: ControllerConfig,
    session: watch::Receiver<Session>,
    sign_state: watch::Sender<SignState>,
    commands: mpsc::Sender<SessionCommand>,
    signing: AtomicBool,
    surface_closes: TaskTracker,
    shutdown: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl SigningSessionController {
    pub fn new(
        authorizer: Arc<dyn Authorizer>,
        payloads: Arc<dyn PayloadApi>,
        surfaces: Arc<dyn SurfaceOpener>,
        host: HostContext,
        config: ControllerConfig,
    ) -> Self {
        let (session_tx, session_rx) = watch::channel(Session::default());
        let (sign_state, _) = watch::channel(SignState::Idle);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let shutdown = CancellationToken::new();

        let worker = SessionWorker {
            authorizer: authorizer.clone(),
            session: session_tx,
            events: authorizer.subscribe(),
            commands: command_rx,
            shutdown: shutdown.clone(),
        };
        let handle = tokio::spawn(worker.run());
        debug!(embedded = host.is_embedded(), "signing session controller started");

        Self {
            authorizer,
            payloads,
            surfaces,
            host,
            config,
            session: session_rx,
            sign_state,
            commands: command_tx,
            signing: AtomicBool::new(false),
            surface_closes: TaskTracker::new(),
            shutdown,
            worker: Mutex::new(Some(handle)),
        }
    }

    /// Current session snapshot
    pub fn session(&self) -> Session {
        self.session.borrow().clone()
    }

    /// Receiver notified on every snapshot replacement
    pub fn subscribe_session(&self) -> watch::Receiver<Session> {
        self.session.clone()
    }

    pub fn sign_state(&self) -> SignState {
        *self.sign_state.borrow()
    }

    pub fn subscribe_sign_state(&self) -> watch::Receiver<SignState> {
        self.sign_state.subscribe()
    }

    pub fn is_embedded(&self) -> bool {
        self.host.is_embedded()
    }

    pub fn authorizer(&self) -> &Arc<dyn Authorizer> {
        &self.authorizer
    }

    /// Start authorization; session fields follow from the emitted events
    ///
    /// Sign-in may open its own sign request, so this shares the single-flight
    /// slot with [`Self::sign_transaction`].
    pub async fn connect(&self) -> Result<()> {
        let _guard = SignGuard::acquire(&self.signing)?;
        info!("connecting");
        self.authorizer.authorize().await
    }

    /// End the session
    ///
    /// Inside an embedded host the host is asked to close and the user stays
    /// logged in. Otherwise the authorizer logs out and local fields are
    /// cleared before this returns.
    pub async fn disconnect(&self) -> Result<()> {
        if let HostContext::Embedded(host) = &self.host {
            info!("asking embedded host to close");
            return host.close().await;
        }

        self.authorizer.logout().await?;

        let (ack, done) = oneshot::channel();
        if self.commands.send(SessionCommand::Clear { ack }).await.is_err() {
            warn!("session worker stopped, snapshot not cleared");
            return Ok(());
        }
        if done.await.is_err() {
            warn!("session worker stopped before clearing snapshot");
        }
        info!("disconnected");
        Ok(())
    }

    /// Request a signature on a transaction payload
    ///
    /// Returns `Ok(None)` when the request ended without a result. Only one
    /// request (or sign-in) may be outstanding; a concurrent call fails with
    /// [`XummError::SignInProgress`].
    pub async fn sign_transaction(
        &self,
        body: &PayloadBody,
        options: SignOptions,
    ) -> Result<Option<PayloadRecord>> {
        let _guard = SignGuard::acquire(&self.signing)?;
        SigningFlow::new(self.payloads.as_ref(), self.surfaces.as_ref())
            .surface_close_grace(self.config.surface_close_grace)
            .track_surface_closes(&self.surface_closes)
            .report_to(&self.sign_state)
            .run(body, options)
            .await
    }

    /// Stop the session task and wait for it and any pending surface closes
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                warn!(error = %err, "session worker ended abnormally");
            }
        }

        self.surface_closes.close();
        tokio::join!(self.surface_closes.wait(), self.authorizer.shutdown());
        debug!("signing session controller stopped");
    }
}

impl Drop for SigningSessionController {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Single-flight marker for sign requests, released on every exit path
struct SignGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SignGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| XummError::SignInProgress)?;
        Ok(Self { flag })
    }
}

impl Drop for SignGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

struct SessionWorker {
    authorizer: Arc<dyn Authorizer>,
    session: watch::Sender<Session>,
    events: broadcast::Receiver<AuthEvent>,
    commands: mpsc::Receiver<SessionCommand>,
    shutdown: CancellationToken,
}

impl SessionWorker {
    async fn run(mut self) {
        let mut events_open = true;
        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => {
                    debug!("session worker shutting down");
                    break;
                }

                command = self.commands.recv() => match command {
                    Some(SessionCommand::Clear { ack }) => {
                        self.clear();
                        let _ = ack.send(());
                    }
                    None => break,
                },

                event = self.events.recv(), if events_open => match event {
                    Ok(event) => self.apply(event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "auth events lagged, refreshing snapshot");
                        self.refresh(false).await;
                    }
                    Err(RecvError::Closed) => {
                        debug!("auth event channel closed");
                        events_open = false;
                    }
                },
            }
        }
    }

    async fn apply(&self, event: AuthEvent) {
        debug!(?event, "applying auth event");
        match event {
            AuthEvent::Ready => self.refresh(true).await,
            AuthEvent::Success | AuthEvent::Retrieved => self.refresh(false).await,
            AuthEvent::LoggedOut => self.clear(),
        }
    }

    /// Replace user and environment together from one authorizer read
    async fn refresh(&self, ready: bool) {
        let (user, environment) =
            tokio::join!(self.authorizer.user(), self.authorizer.environment());

        match (user, environment) {
            (Ok(user), Ok(environment)) => {
                let loading = !ready && self.session.borrow().loading;
                self.session.send_replace(Session {
                    loading,
                    user,
                    environment,
                });
            }
            (Err(err), _) | (_, Err(err)) => {
                warn!(error = %err, "session refresh failed, keeping previous snapshot");
                if ready {
                    self.session.send_modify(|session| session.loading = false);
                }
            }
        }
    }

    fn clear(&self) {
        self.session.send_modify(Session::clear);
    }
}
