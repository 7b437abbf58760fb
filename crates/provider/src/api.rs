//! REST client for Veo video generation.
//!
//! Veo runs as a long-running operation: `POST models/{model}:predictLongRunning`
//! returns an operation name, which is then polled with `GET {name}` until
//! `done` is set. Completed operations carry the video as a provider-hosted
//! URI that must be fetched with the same API key.

use base64::Engine;
use mediagen_core::video::VideoJob;
use serde::Deserialize;

use crate::error::ProviderError;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// HTTP client for the Veo endpoints of the Gemini API.
#[derive(Clone)]
pub struct VeoApi {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

/// Response of `predictLongRunning` and of operation polling.
#[derive(Debug, Clone, Deserialize)]
pub struct LongRunningOperation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub response: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<OperationError>,
}

/// `error` member of a failed operation.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationError {
    #[serde(default)]
    pub code: Option<i32>,
    #[serde(default)]
    pub message: Option<String>,
}

impl VeoApi {
    /// * `base_url` - API root, e.g. `https://generativelanguage.googleapis.com/v1beta`.
    /// * `model`    - model id with or without the `models/` prefix.
    pub fn new(client: reqwest::Client, base_url: String, model: String, api_key: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key,
        }
    }

    /// Start a generation. Returns the provider operation name.
    pub async fn submit(&self, job: &VideoJob) -> Result<LongRunningOperation, ProviderError> {
        let body = build_predict_body(job);
        let response = self
            .client
            .post(predict_url(&self.base_url, &self.model))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fetch the current state of an operation.
    pub async fn get_operation(&self, name: &str) -> Result<LongRunningOperation, ProviderError> {
        let response = self
            .client
            .get(operation_url(&self.base_url, name))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Download a generated video from its provider URI.
    pub async fn download(&self, uri: &str) -> Result<Vec<u8>, ProviderError> {
        let response = self
            .client
            .get(uri)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    // ---- private helpers ----

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ProviderError::from_status(status.as_u16(), body));
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ProviderError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/* --------------------------------------------------------------------------
Request / response shaping
-------------------------------------------------------------------------- */

fn model_id(model: &str) -> &str {
    let trimmed = model.trim().trim_matches('/');
    trimmed.strip_prefix("models/").unwrap_or(trimmed)
}

pub fn predict_url(base_url: &str, model: &str) -> String {
    format!(
        "{}/models/{}:predictLongRunning",
        base_url.trim_end_matches('/'),
        model_id(model)
    )
}

/// Operation names are relative (`models/.../operations/...`); absolute
/// URLs are used as-is.
pub fn operation_url(base_url: &str, name: &str) -> String {
    let name = name.trim().trim_start_matches('/');
    if name.starts_with("http://") || name.starts_with("https://") {
        return name.to_string();
    }
    format!("{}/{}", base_url.trim_end_matches('/'), name)
}

/// Build the `predictLongRunning` request body for a job.
pub fn build_predict_body(job: &VideoJob) -> serde_json::Value {
    let mut instance = serde_json::Map::new();
    instance.insert("prompt".into(), serde_json::json!(job.prompt));
    if let Some(image) = &job.image {
        instance.insert(
            "image".into(),
            serde_json::json!({
                "bytesBase64Encoded": base64::engine::general_purpose::STANDARD.encode(&image.bytes),
                "mimeType": image.format.mime_type(),
            }),
        );
    }

    let config = &job.config;
    let mut parameters = serde_json::Map::new();
    parameters.insert("aspectRatio".into(), serde_json::json!(config.aspect_ratio.as_str()));
    parameters.insert("resolution".into(), serde_json::json!(config.resolution.as_str()));
    parameters.insert(
        "durationSeconds".into(),
        serde_json::json!(config.duration_seconds.seconds()),
    );
    parameters.insert(
        "personGeneration".into(),
        serde_json::json!(config.person_generation.as_str()),
    );
    if let Some(negative) = &config.negative_prompt {
        parameters.insert("negativePrompt".into(), serde_json::json!(negative));
    }
    if let Some(seed) = config.seed {
        parameters.insert("seed".into(), serde_json::json!(seed));
    }

    serde_json::json!({
        "instances": [instance],
        "parameters": parameters,
    })
}

/// URI of the first generated sample, if any.
pub fn extract_video_uri(response: &serde_json::Value) -> Option<String> {
    [
        "/generateVideoResponse/generatedSamples/0/video/uri",
        "/generateVideoResponse/generatedSamples/0/videoUri",
    ]
    .iter()
    .find_map(|path| response.pointer(path).and_then(|v| v.as_str()))
    .map(str::to_string)
}

/// Reason given when the provider's safety filters removed every sample.
pub fn extract_filter_reason(response: &serde_json::Value) -> Option<String> {
    response
        .pointer("/generateVideoResponse/raiMediaFilteredReasons/0")
        .and_then(|v| v.as_str())
        .map(str::to_string)
}
