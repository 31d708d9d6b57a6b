/*
[INPUT]:  Payload capability, surfaces, authorizer events
[OUTPUT]: Signing flow and session controller
[POS]:    Signing layer - module exports
[UPDATE]: When adding signing components
*/

mod api;
mod controller;
mod flow;

pub use api::PayloadApi;
pub use controller::{ControllerConfig, SigningSessionController};
pub use flow::{
    DEFAULT_SURFACE_CLOSE_GRACE, PayloadCreatedCallback, SignOptions, SignState, SigningFlow,
};
