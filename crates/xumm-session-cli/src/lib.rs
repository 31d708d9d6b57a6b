/*
[INPUT]:  Public API exports for xumm-session-cli crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod config;
pub mod runner;
pub mod surface;

// Re-export main types for convenience
pub use config::SessionConfig;
pub use runner::{SessionRunner, load_payload_body};
pub use surface::{ConsoleHost, ConsoleSurfaceOpener};
