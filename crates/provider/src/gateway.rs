//! Provider-neutral gateway traits and the Gemini implementation.
//!
//! The HTTP layer only sees [`VideoGateway`] and [`MusicGateway`]; tests
//! substitute in-memory fakes.

use std::time::Duration;

use async_trait::async_trait;
use mediagen_core::music::MusicGenerationRequest;
use mediagen_core::operation::VideoPayload;
use mediagen_core::video::VideoJob;

use crate::api::{extract_filter_reason, extract_video_uri, VeoApi};
use crate::client::LyriaClient;
use crate::error::ProviderError;

/// Result of polling a provider-side video operation.
#[derive(Debug, Clone, PartialEq)]
pub enum VideoPoll {
    Pending,
    Completed(VideoPayload),
    Failed(String),
}

#[async_trait]
pub trait VideoGateway: Send + Sync {
    /// Start a generation without waiting for it. Returns the provider's
    /// operation name.
    async fn submit(&self, job: &VideoJob) -> Result<String, ProviderError>;

    /// Query a previously submitted operation.
    async fn poll(&self, operation_name: &str) -> Result<VideoPoll, ProviderError>;
}

#[async_trait]
pub trait MusicGateway: Send + Sync {
    /// Generate and capture PCM for the requested duration.
    async fn generate(&self, request: &MusicGenerationRequest) -> Result<Vec<u8>, ProviderError>;
}

/// Connection settings for the Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub video_model: String,
    pub music_model: String,
    pub music_ws_url: String,
    /// Download finished videos and return them inline instead of the URI.
    pub inline_video: bool,
    pub music_capture_grace: Duration,
    /// Upper bound on each REST call (submit, poll, download).
    pub http_timeout: Duration,
}

/// Build the shared HTTP client with a per-request timeout, so a stalled
/// provider surfaces as [`ProviderError::Timeout`].
///
/// # Panics
///
/// Panics if the TLS backend cannot be initialised.
pub fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .expect("Failed to build reqwest HTTP client")
}

/// Veo + Lyria behind the gateway traits. Without an API key every call
/// fails with [`ProviderError::NotConfigured`].
pub struct GeminiGateway {
    veo: Option<VeoApi>,
    lyria: Option<LyriaClient>,
    inline_video: bool,
}

impl GeminiGateway {
    pub fn new(settings: GeminiSettings) -> Self {
        Self::with_client(http_client(settings.http_timeout), settings)
    }

    pub fn with_client(client: reqwest::Client, settings: GeminiSettings) -> Self {
        let api_key = settings.api_key.filter(|k| !k.trim().is_empty());
        let veo = api_key.clone().map(|key| {
            VeoApi::new(client, settings.base_url.clone(), settings.video_model.clone(), key)
        });
        let lyria = api_key.map(|key| {
            LyriaClient::new(
                settings.music_ws_url.clone(),
                key,
                settings.music_model.clone(),
                settings.music_capture_grace,
            )
        });
        Self {
            veo,
            lyria,
            inline_video: settings.inline_video,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.veo.is_some()
    }

    fn veo(&self) -> Result<&VeoApi, ProviderError> {
        self.veo.as_ref().ok_or(ProviderError::NotConfigured)
    }
}

#[async_trait]
impl VideoGateway for GeminiGateway {
    async fn submit(&self, job: &VideoJob) -> Result<String, ProviderError> {
        let operation = self.veo()?.submit(job).await?;
        tracing::info!(operation = %operation.name, "Submitted video generation");
        Ok(operation.name)
    }

    async fn poll(&self, operation_name: &str) -> Result<VideoPoll, ProviderError> {
        let veo = self.veo()?;
        let operation = veo.get_operation(operation_name).await?;

        if !operation.done {
            return Ok(VideoPoll::Pending);
        }
        if let Some(error) = operation.error {
            let message = error
                .message
                .unwrap_or_else(|| "Video generation failed".to_string());
            tracing::warn!(operation = %operation_name, code = ?error.code, %message, "Video operation failed");
            return Ok(VideoPoll::Failed(message));
        }

        let response = operation.response.unwrap_or_default();
        let Some(uri) = extract_video_uri(&response) else {
            let message = extract_filter_reason(&response)
                .unwrap_or_else(|| "Provider returned no video".to_string());
            return Ok(VideoPoll::Failed(message));
        };

        if !self.inline_video {
            return Ok(VideoPoll::Completed(VideoPayload::Url(uri)));
        }

        match veo.download(&uri).await {
            Ok(bytes) => {
                tracing::info!(operation = %operation_name, bytes = bytes.len(), "Downloaded generated video");
                Ok(VideoPoll::Completed(VideoPayload::Inline(bytes)))
            }
            Err(e) => {
                tracing::error!(operation = %operation_name, error = %e, "Failed to retrieve video");
                Ok(VideoPoll::Failed(format!("Failed to retrieve video: {e}")))
            }
        }
    }
}

#[async_trait]
impl MusicGateway for GeminiGateway {
    async fn generate(&self, request: &MusicGenerationRequest) -> Result<Vec<u8>, ProviderError> {
        let lyria = self.lyria.as_ref().ok_or(ProviderError::NotConfigured)?;
        let pcm = lyria.generate(request).await?;
        tracing::info!(
            prompts = request.prompts.len(),
            bytes = pcm.len(),
            "Captured music audio",
        );
        Ok(pcm)
    }
}
