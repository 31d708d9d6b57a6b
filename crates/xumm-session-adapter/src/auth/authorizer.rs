/*
[INPUT]:  Authorization lifecycle (authorize, restore, logout)
[OUTPUT]: Ordered AuthEvent stream, user and environment snapshots
[POS]:    Auth layer - authorization capability abstraction
[UPDATE]: When lifecycle events or authorizer operations change
*/

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;

use crate::http::Result;
use crate::types::{Environment, User};

const EVENT_CAPACITY: usize = 32;

/// Lifecycle events emitted by an authorizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// The client is configured and reachable
    Ready,
    /// A user completed authorization
    Success,
    /// A previous or host-provided session was picked up
    Retrieved,
    /// The user was logged out
    LoggedOut,
}

/// Trait for the authorization capability
///
/// Events are delivered in emission order to every subscriber.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Subscribe to lifecycle events emitted from now on
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;

    /// Start authorization
    async fn authorize(&self) -> Result<()>;

    /// End the current session
    async fn logout(&self) -> Result<()>;

    /// Current user, if authorized
    async fn user(&self) -> Result<Option<User>>;

    /// Current environment, once known
    async fn environment(&self) -> Result<Option<Environment>>;

    /// Wait for background work started by the authorizer to finish
    async fn shutdown(&self) {}
}

/// Ordered fan-out of lifecycle events
#[derive(Debug, Clone)]
pub struct AuthEventBus {
    tx: broadcast::Sender<AuthEvent>,
}

impl AuthEventBus {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: AuthEvent) {
        let receivers = self.tx.send(event).unwrap_or(0);
        debug!(?event, receivers, "auth event emitted");
    }
}

impl Default for AuthEventBus {
    fn default() -> Self {
        Self::new()
    }
}
