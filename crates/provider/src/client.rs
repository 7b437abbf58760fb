//! WebSocket client for Lyria RealTime music sessions.
//!
//! A session is opened per request: connect, send `setup` and wait for
//! `setupComplete`, send prompts and config, start playback, then collect
//! audio chunks until the requested amount of PCM has arrived or the
//! capture deadline passes. Playback is stopped and the socket closed
//! before returning.

use std::time::Duration;

use base64::Engine;
use futures::{SinkExt, StreamExt};
use mediagen_core::music::{MusicGenerationRequest, BYTES_PER_FRAME};
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, WebSocketStream};

use crate::error::ProviderError;
use crate::messages::{
    parse_server_message, ClientMessage, LiveMusicConfig, LyriaEvent, PlaybackControl, PromptWire,
};

/// Connection settings for the Lyria RealTime endpoint.
#[derive(Debug, Clone)]
pub struct LyriaClient {
    ws_url: String,
    api_key: String,
    model: String,
    capture_grace: Duration,
}

impl LyriaClient {
    /// * `ws_url`        - `BidiGenerateMusic` endpoint, without the key.
    /// * `model`         - e.g. `models/lyria-realtime-exp`.
    /// * `capture_grace` - extra time allowed on top of the requested duration.
    pub fn new(ws_url: String, api_key: String, model: String, capture_grace: Duration) -> Self {
        Self {
            ws_url,
            api_key,
            model,
            capture_grace,
        }
    }

    /// Endpoint URL with the API key appended to any existing query.
    fn url_with_key(&self) -> Result<String, ProviderError> {
        let mut url = reqwest::Url::parse(&self.ws_url)
            .map_err(|e| ProviderError::Protocol(format!("invalid music endpoint {}: {e}", self.ws_url)))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url.into())
    }

    /// Run one session and return the captured PCM, truncated to whole
    /// frames and at most the requested length.
    pub async fn generate(&self, request: &MusicGenerationRequest) -> Result<Vec<u8>, ProviderError> {
        let deadline = Instant::now()
            + Duration::from_secs(u64::from(request.duration_seconds))
            + self.capture_grace;

        let (mut ws, _response) = connect_async(self.url_with_key()?).await.map_err(|e| match e {
            tokio_tungstenite::tungstenite::Error::Http(_) => ProviderError::from(e),
            other => ProviderError::Unavailable(format!("failed to connect to music service: {other}")),
        })?;

        tracing::debug!(model = %self.model, "Connected to Lyria RealTime");

        let result = run_session(&mut ws, &self.model, request, deadline).await;

        // Best effort: the session is over either way.
        let _ = send(&mut ws, &ClientMessage::PlaybackControl(PlaybackControl::Stop)).await;
        let _ = ws.close(None).await;

        result
    }
}

async fn send<S>(ws: &mut WebSocketStream<S>, message: &ClientMessage) -> Result<(), ProviderError>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    ws.send(Message::Text(message.to_json()?)).await?;
    Ok(())
}

/// Wait for the next classified event, or `None` if the peer closed the
/// socket. Fails with [`ProviderError::Timeout`] at `deadline`.
async fn next_event<S>(
    ws: &mut WebSocketStream<S>,
    deadline: Instant,
) -> Result<Option<LyriaEvent>, ProviderError>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    loop {
        let frame = tokio::time::timeout_at(deadline, ws.next())
            .await
            .map_err(|_| ProviderError::Timeout("music capture deadline reached".into()))?;

        let payload = match frame {
            None => return Ok(None),
            Some(frame) => match frame? {
                Message::Text(text) => text.into_bytes(),
                Message::Binary(bytes) => bytes,
                Message::Close(close) => {
                    if let Some(close) = close {
                        tracing::debug!(code = %close.code, reason = %close.reason, "Lyria closed session");
                    }
                    return Ok(None);
                }
                _ => continue,
            },
        };

        return Ok(Some(parse_server_message(&payload)?));
    }
}

async fn run_session<S>(
    ws: &mut WebSocketStream<S>,
    model: &str,
    request: &MusicGenerationRequest,
    deadline: Instant,
) -> Result<Vec<u8>, ProviderError>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    send(ws, &ClientMessage::Setup { model: model.to_string() }).await?;
    loop {
        match next_event(ws, deadline).await? {
            Some(LyriaEvent::SetupComplete) => break,
            Some(_) => continue,
            None => return Err(ProviderError::Protocol("session closed before setup completed".into())),
        }
    }

    send(
        ws,
        &ClientMessage::ClientContent {
            weighted_prompts: request.prompts.iter().map(PromptWire::from).collect(),
        },
    )
    .await?;
    send(ws, &ClientMessage::MusicGenerationConfig(LiveMusicConfig::from(&request.config))).await?;
    send(ws, &ClientMessage::PlaybackControl(PlaybackControl::Play)).await?;

    let mut collector = PcmCollector::new(request.target_pcm_len());
    let mut filtered = 0usize;

    let outcome = loop {
        match next_event(ws, deadline).await {
            Ok(Some(LyriaEvent::Audio(chunks))) => {
                for chunk in &chunks {
                    collector.push_base64(&chunk.data)?;
                }
                if collector.is_complete() {
                    break Ok(());
                }
            }
            Ok(Some(LyriaEvent::PromptFiltered(f))) => {
                filtered += 1;
                tracing::warn!(
                    prompt = %f.text,
                    reason = f.filtered_reason.as_deref().unwrap_or("unspecified"),
                    "Lyria filtered a prompt",
                );
                if filtered >= request.prompts.len() && collector.is_empty() {
                    return Err(ProviderError::Rejected {
                        status: 400,
                        message: format!(
                            "prompt was filtered: {}",
                            f.filtered_reason.unwrap_or_else(|| "unspecified".into())
                        ),
                    });
                }
            }
            Ok(Some(LyriaEvent::Warning(w))) => tracing::warn!(warning = %w, "Lyria warning"),
            Ok(Some(_)) => {}
            Ok(None) => break Ok(()),
            Err(e @ ProviderError::Timeout(_)) => break Err(e),
            Err(e) => return Err(e),
        }
    };

    match outcome {
        Ok(()) if collector.is_empty() => {
            Err(ProviderError::Protocol("music session ended without audio".into()))
        }
        Err(e) if collector.is_empty() => Err(e),
        _ => {
            if !collector.is_complete() {
                tracing::warn!(
                    captured = collector.len(),
                    target = collector.target(),
                    "Returning partial music capture",
                );
            }
            Ok(collector.finish())
        }
    }
}

/* --------------------------------------------------------------------------
PCM accumulation
-------------------------------------------------------------------------- */

/// Accumulates decoded PCM up to a target length.
#[derive(Debug)]
pub struct PcmCollector {
    target: usize,
    buf: Vec<u8>,
}

impl PcmCollector {
    pub fn new(target: usize) -> Self {
        Self {
            target,
            buf: Vec::with_capacity(target),
        }
    }

    /// Decode and append one base64 chunk.
    pub fn push_base64(&mut self, data: &str) -> Result<(), ProviderError> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(data)
            .map_err(|e| ProviderError::Protocol(format!("invalid audio chunk: {e}")))?;
        self.buf.extend_from_slice(&bytes);
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.buf.len() >= self.target
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn target(&self) -> usize {
        self.target
    }

    /// Captured PCM cut to the target and to a whole number of frames.
    pub fn finish(mut self) -> Vec<u8> {
        let len = self.buf.len().min(self.target);
        self.buf.truncate(len - len % BYTES_PER_FRAME);
        self.buf
    }
}
