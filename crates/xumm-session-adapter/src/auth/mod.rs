/*
[INPUT]:  API credentials, launch tokens, session storage
[OUTPUT]: Authorization lifecycle events, users, environments
[POS]:    Auth layer - authorization capability and its Xumm implementation
[UPDATE]: When auth flow or persistence changes
*/

pub mod authorizer;
pub mod store;
pub mod xumm;

pub use authorizer::{AuthEvent, AuthEventBus, Authorizer};
pub use store::{SessionStore, StoredSession};
pub use xumm::XummAuthorizer;
