//! Domain types and rules for the media generation gateway.
//!
//! Everything here is transport-agnostic: request shapes and their
//! validation, the video operation state machine, and the per-user daily
//! quota gate. The HTTP layer lives in `mediagen-api`, upstream calls in
//! `mediagen-provider`.

pub mod error;
pub mod music;
pub mod operation;
pub mod quota;
pub mod types;
pub mod validation;
pub mod video;
