/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public Xumm session adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod auth;
pub mod http;
pub mod signing;
pub mod surface;
pub mod types;
pub mod ws;

// Re-export commonly used types from auth
pub use auth::{AuthEvent, AuthEventBus, Authorizer, SessionStore, StoredSession, XummAuthorizer};

// Re-export commonly used types from http
pub use http::{ApiCredentials, ClientConfig, Result, XummClient, XummError};

// Re-export the signing surface
pub use signing::{
    ControllerConfig, PayloadApi, SignOptions, SignState, SigningFlow, SigningSessionController,
};

pub use surface::{EmbeddedHost, HostContext, RedirectSurface, SurfaceOpener};

// Re-export all types
pub use types::*;

// Re-export commonly used types from ws
pub use ws::{PayloadSubscription, SignResolution, SubscriptionMessage};
