/*
[INPUT]:  Payload status websocket URLs
[OUTPUT]: Per-payload status subscriptions and typed frames
[POS]:    WebSocket layer - real-time payload status
[UPDATE]: When adding frame kinds or changing connection logic
*/

pub mod client;
pub mod message;

pub use client::{PayloadSubscription, connect_subscription};
pub use message::{SignResolution, SubscriptionMessage};
