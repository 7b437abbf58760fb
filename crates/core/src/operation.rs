//! Video operation state machine and its client-facing snapshots.
//!
//! An operation starts `processing` and moves exactly once to either
//! `completed` (with a URL or inline video) or `failed` (with a message).
//! Snapshots are derived from the state, so a snapshot can never carry
//! both a media field and an error, or media before completion.

use base64::Engine;
use serde::{Deserialize, Serialize};

/// Client-facing status of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    Processing,
    Completed,
    Failed,
}

/// Generated video as returned by the provider.
#[derive(Debug, Clone, PartialEq)]
pub enum VideoPayload {
    /// Provider-hosted URI the caller can fetch.
    Url(String),
    /// Raw video bytes (usually MP4).
    Inline(Vec<u8>),
}

/// Stored form of a completed result. Inline bytes are encoded once at
/// completion so repeated polls do not re-encode.
#[derive(Debug, Clone, PartialEq)]
pub enum VideoResult {
    Url(String),
    Base64(String),
}

impl From<VideoPayload> for VideoResult {
    fn from(payload: VideoPayload) -> Self {
        match payload {
            VideoPayload::Url(url) => VideoResult::Url(url),
            VideoPayload::Inline(bytes) => {
                VideoResult::Base64(base64::engine::general_purpose::STANDARD.encode(bytes))
            }
        }
    }
}

/// Current state of an operation.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationState {
    Processing,
    Completed(VideoResult),
    Failed(String),
}

impl OperationState {
    pub fn status(&self) -> OperationStatus {
        match self {
            OperationState::Processing => OperationStatus::Processing,
            OperationState::Completed(_) => OperationStatus::Completed,
            OperationState::Failed(_) => OperationStatus::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, OperationState::Processing)
    }

    /// Move to `next`. Terminal states never change; returns whether the
    /// transition was applied.
    pub fn transition(&mut self, next: OperationState) -> bool {
        if self.is_terminal() {
            return false;
        }
        *self = next;
        true
    }

    /// Render the state as a status-poll response for `operation_id`.
    pub fn snapshot(&self, operation_id: &str) -> OperationSnapshot {
        let (video_url, video_b64, error_message) = match self {
            OperationState::Processing => (None, None, None),
            OperationState::Completed(VideoResult::Url(url)) => (Some(url.clone()), None, None),
            OperationState::Completed(VideoResult::Base64(b64)) => (None, Some(b64.clone()), None),
            OperationState::Failed(message) => (None, None, Some(message.clone())),
        };
        OperationSnapshot {
            operation_id: operation_id.to_string(),
            done: self.is_terminal(),
            status: self.status(),
            video_url,
            video_b64,
            error_message,
        }
    }
}

/// Response body of `GET /ai/videos/status/{operation_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationSnapshot {
    pub operation_id: String,
    pub done: bool,
    pub status: OperationStatus,
    pub video_url: Option<String>,
    pub video_b64: Option<String>,
    pub error_message: Option<String>,
}

/// Response body of the two video submission endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoGenerationResponse {
    pub operation_id: String,
    pub status: OperationStatus,
    pub video_url: Option<String>,
    pub video_b64: Option<String>,
    pub error_message: Option<String>,
}

impl From<OperationSnapshot> for VideoGenerationResponse {
    fn from(s: OperationSnapshot) -> Self {
        Self {
            operation_id: s.operation_id,
            status: s.status,
            video_url: s.video_url,
            video_b64: s.video_b64,
            error_message: s.error_message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media_count(s: &OperationSnapshot) -> usize {
        usize::from(s.video_url.is_some()) + usize::from(s.video_b64.is_some())
    }

    #[test]
    fn processing_snapshot_has_no_result_fields() {
        let snap = OperationState::Processing.snapshot("op-1");
        assert!(!snap.done);
        assert_eq!(snap.status, OperationStatus::Processing);
        assert_eq!(media_count(&snap), 0);
        assert!(snap.error_message.is_none());
    }

    #[test]
    fn completed_snapshot_has_exactly_one_media_field() {
        for payload in [VideoPayload::Url("https://x/v.mp4".into()), VideoPayload::Inline(vec![1, 2, 3])] {
            let state = OperationState::Completed(payload.into());
            let snap = state.snapshot("op-1");
            assert!(snap.done);
            assert_eq!(snap.status, OperationStatus::Completed);
            assert_eq!(media_count(&snap), 1);
            assert!(snap.error_message.is_none());
        }
    }

    #[test]
    fn inline_payload_is_base64_encoded() {
        let result = VideoResult::from(VideoPayload::Inline(b"video".to_vec()));
        assert_eq!(result, VideoResult::Base64("dmlkZW8=".into()));
    }

    #[test]
    fn failed_snapshot_has_error_and_no_media() {
        let snap = OperationState::Failed("blocked by safety filter".into()).snapshot("op-1");
        assert!(snap.done);
        assert_eq!(snap.status, OperationStatus::Failed);
        assert_eq!(media_count(&snap), 0);
        assert_eq!(snap.error_message.as_deref(), Some("blocked by safety filter"));
    }

    #[test]
    fn terminal_states_do_not_transition() {
        let mut state = OperationState::Processing;
        assert!(state.transition(OperationState::Failed("boom".into())));
        assert!(!state.transition(OperationState::Completed(VideoResult::Url("u".into()))));
        assert_eq!(state, OperationState::Failed("boom".into()));
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_value(OperationState::Processing.snapshot("id")).unwrap();
        assert_eq!(json["status"], "processing");
        assert_eq!(json["video_url"], serde_json::Value::Null);
        assert_eq!(json["done"], false);
    }
}
