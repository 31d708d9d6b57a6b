/*
[INPUT]:  HTTP client configuration and platform API endpoints
[OUTPUT]: HTTP responses and typed API results
[POS]:    HTTP layer - REST API communication
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod client;
pub mod error;
pub mod payload;
pub mod platform;

pub use error::{Result, XummError};

pub use client::{API_BASE_URL, ApiCredentials, ClientConfig, WS_BASE_URL, XummClient};
