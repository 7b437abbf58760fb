//! Upstream clients for Google's generative media APIs.
//!
//! - [`api::VeoApi`] wraps the Veo long-running-operation REST endpoints.
//! - [`client::LyriaClient`] drives a Lyria RealTime WebSocket session and
//!   captures PCM audio.
//! - [`gateway`] exposes both behind the [`gateway::VideoGateway`] and
//!   [`gateway::MusicGateway`] traits the HTTP layer depends on.

pub mod api;
pub mod client;
pub mod error;
pub mod gateway;
pub mod messages;

pub use error::ProviderError;
pub use gateway::{http_client, GeminiGateway, GeminiSettings, MusicGateway, VideoGateway, VideoPoll};
