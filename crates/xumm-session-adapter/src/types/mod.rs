/*
[INPUT]:  API schema definitions and serde requirements
[OUTPUT]: Typed Rust structs/enums with serialization support
[POS]:    Data layer - type definitions for API communication and session state
[UPDATE]: When API schema changes or new types added
*/

pub mod payload;
pub mod platform;
pub mod session;

pub use payload::*;
pub use platform::*;
pub use session::*;
