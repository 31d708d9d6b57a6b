/*
[INPUT]:  Payload body, sign options, payload capability, surface opener
[OUTPUT]: Final payload record once the request resolves (or no result)
[POS]:    Signing layer - create / redirect / subscribe / fetch state machine
[UPDATE]: When completion detection or surface handling changes
*/

use std::fmt;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::http::{Result, XummError};
use crate::signing::PayloadApi;
use crate::surface::{RedirectSurface, SurfaceOpener};
use crate::types::{CreatedPayload, PayloadBody, PayloadRecord};
use crate::ws::{PayloadSubscription, SubscriptionMessage};

/// Delay between resolution and closing the redirect surface
pub const DEFAULT_SURFACE_CLOSE_GRACE: Duration = Duration::from_millis(500);

/// Callback receiving the created payload instead of a redirect surface
pub type PayloadCreatedCallback = Box<dyn FnOnce(&CreatedPayload) + Send>;

/// Progress of a sign request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignState {
    Idle,
    Creating,
    AwaitingSignature,
    Resolved,
    /// Ended without a result (no subscription, socket closed, expired, timed out)
    Abandoned,
    Failed,
}

/// Per-call options for a sign request
#[derive(Default)]
pub struct SignOptions {
    /// Present the payload yourself; no redirect surface is opened
    pub on_payload_created: Option<PayloadCreatedCallback>,
    /// Stop waiting after this long and cancel the payload
    pub timeout: Option<Duration>,
}

impl SignOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_payload_created<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&CreatedPayload) + Send + 'static,
    {
        self.on_payload_created = Some(Box::new(callback));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl fmt::Debug for SignOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignOptions")
            .field("on_payload_created", &self.on_payload_created.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

enum WaitOutcome {
    Resolved(bool),
    Expired,
    Closed,
    TimedOut,
}

/// One pass through create → await signature → fetch
///
/// The redirect surface is closed by a background task after the grace
/// delay. Owners that outlive the flow pass a [`TaskTracker`] and wait on it
/// before shutting down so the close is not lost.
pub struct SigningFlow<'a> {
    payloads: &'a dyn PayloadApi,
    surfaces: &'a dyn SurfaceOpener,
    surface_close_grace: Duration,
    surface_closes: TaskTracker,
    state: Option<&'a watch::Sender<SignState>>,
}

impl<'a> SigningFlow<'a> {
    pub fn new(payloads: &'a dyn PayloadApi, surfaces: &'a dyn SurfaceOpener) -> Self {
        Self {
            payloads,
            surfaces,
            surface_close_grace: DEFAULT_SURFACE_CLOSE_GRACE,
            surface_closes: TaskTracker::new(),
            state: None,
        }
    }

    pub fn surface_close_grace(mut self, grace: Duration) -> Self {
        self.surface_close_grace = grace;
        self
    }

    /// Spawn surface close tasks on a caller-owned tracker
    pub fn track_surface_closes(mut self, tracker: &TaskTracker) -> Self {
        self.surface_closes = tracker.clone();
        self
    }

    /// Publish state transitions to a watch channel
    pub fn report_to(mut self, state: &'a watch::Sender<SignState>) -> Self {
        self.state = Some(state);
        self
    }

    /// Run the flow
    ///
    /// Returns `Ok(None)` when no result is available: the subscription could
    /// not be opened, the channel closed, the payload expired, or the
    /// optional timeout elapsed.
    pub async fn run(
        &self,
        body: &PayloadBody,
        options: SignOptions,
    ) -> Result<Option<PayloadRecord>> {
        let outcome = self.drive(body, options).await;
        match &outcome {
            Ok(Some(_)) => self.transition(None, SignState::Resolved),
            Ok(None) => self.transition(None, SignState::Abandoned),
            Err(err) => {
                warn!(error = %err, "signing flow failed");
                self.transition(None, SignState::Failed);
            }
        }
        outcome
    }

    async fn drive(
        &self,
        body: &PayloadBody,
        options: SignOptions,
    ) -> Result<Option<PayloadRecord>> {
        self.transition(None, SignState::Creating);
        let Some(created) = self.payloads.create(body).await? else {
            return Err(XummError::InvalidPayload);
        };
        let uuid = created.uuid;

        let surface = match options.on_payload_created {
            Some(callback) => {
                debug!(uuid = %uuid, "handing created payload to caller");
                callback(&created);
                None
            }
            None => {
                debug!(uuid = %uuid, url = %created.next.always, "opening redirect surface");
                Some(self.surfaces.open(&created.next.always).await?)
            }
        };

        self.transition(Some(uuid), SignState::AwaitingSignature);
        let Some(mut subscription) = self.payloads.subscribe(&created).await? else {
            warn!(uuid = %uuid, "no subscription for payload, completing without result");
            return Ok(None);
        };

        let outcome = match options.timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, await_resolution(&mut subscription)).await {
                    Ok(outcome) => outcome,
                    Err(_) => WaitOutcome::TimedOut,
                }
            }
            None => await_resolution(&mut subscription).await,
        };
        subscription.close();

        match outcome {
            WaitOutcome::Resolved(signed) => {
                info!(uuid = %uuid, signed, "payload resolved");
                if let Some(surface) = surface {
                    self.schedule_surface_close(uuid, surface);
                }
                let record = self.payloads.get(uuid).await?;
                Ok(Some(record))
            }
            WaitOutcome::Expired => {
                info!(uuid = %uuid, "payload expired before resolution");
                if let Some(surface) = surface {
                    self.schedule_surface_close(uuid, surface);
                }
                Ok(None)
            }
            WaitOutcome::TimedOut => {
                warn!(uuid = %uuid, "gave up waiting for signature, cancelling payload");
                if let Err(err) = self.payloads.cancel(uuid).await {
                    warn!(uuid = %uuid, error = %err, "payload cancel failed");
                }
                if let Some(surface) = surface {
                    self.schedule_surface_close(uuid, surface);
                }
                Ok(None)
            }
            WaitOutcome::Closed => {
                warn!(uuid = %uuid, "subscription closed before resolution");
                Ok(None)
            }
        }
    }

    fn schedule_surface_close(&self, uuid: Uuid, surface: Box<dyn RedirectSurface>) {
        let grace = self.surface_close_grace;
        self.surface_closes.spawn(async move {
            tokio::time::sleep(grace).await;
            match surface.close().await {
                Ok(()) => debug!(uuid = %uuid, "redirect surface closed"),
                Err(err) => warn!(uuid = %uuid, error = %err, "redirect surface close failed"),
            }
        });
    }

    fn transition(&self, uuid: Option<Uuid>, next: SignState) {
        match uuid {
            Some(uuid) => debug!(uuid = %uuid, state = ?next, "sign state"),
            None => debug!(state = ?next, "sign state"),
        }
        if let Some(state) = self.state {
            state.send_replace(next);
        }
    }
}

async fn await_resolution(subscription: &mut PayloadSubscription) -> WaitOutcome {
    let uuid = subscription.uuid();
    while let Some(message) = subscription.next_message().await {
        match message {
            SubscriptionMessage::Resolved(resolution) => {
                return WaitOutcome::Resolved(resolution.signed);
            }
            SubscriptionMessage::Expired => return WaitOutcome::Expired,
            other => debug!(uuid = %uuid, kind = other.kind(), "subscription message"),
        }
    }
    WaitOutcome::Closed
}
