//! Lyria RealTime WebSocket message types.
//!
//! Every frame is a JSON object with a single top-level key naming the
//! message kind. Client frames are produced from [`ClientMessage`]; server
//! frames are parsed into [`ServerMessage`] and classified with
//! [`ServerMessage::into_event`].

use mediagen_core::music::{MusicGenerationConfig, MusicGenerationMode, MusicScale, WeightedPrompt};
use serde::{Deserialize, Serialize};

/// Messages sent by the client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientMessage {
    Setup {
        model: String,
    },
    ClientContent {
        #[serde(rename = "weightedPrompts")]
        weighted_prompts: Vec<PromptWire>,
    },
    MusicGenerationConfig(LiveMusicConfig),
    PlaybackControl(PlaybackControl),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlaybackControl {
    Play,
    Stop,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptWire {
    pub text: String,
    pub weight: f64,
}

impl From<&WeightedPrompt> for PromptWire {
    fn from(p: &WeightedPrompt) -> Self {
        Self {
            text: p.text.clone(),
            weight: p.weight,
        }
    }
}

/// `musicGenerationConfig` payload. Unset optional knobs are omitted so the
/// model keeps its own defaults.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveMusicConfig {
    pub bpm: u32,
    pub temperature: f64,
    pub guidance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<MusicScale>,
    pub mute_bass: bool,
    pub mute_drums: bool,
    pub only_bass_and_drums: bool,
    pub music_generation_mode: MusicGenerationMode,
}

impl From<&MusicGenerationConfig> for LiveMusicConfig {
    fn from(c: &MusicGenerationConfig) -> Self {
        Self {
            bpm: c.bpm,
            temperature: c.temperature,
            guidance: c.guidance,
            density: c.density,
            brightness: c.brightness,
            scale: c.scale,
            mute_bass: c.mute_bass,
            mute_drums: c.mute_drums,
            only_bass_and_drums: c.only_bass_and_drums,
            music_generation_mode: c.music_generation_mode,
        }
    }
}

impl ClientMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/* --------------------------------------------------------------------------
Server messages
-------------------------------------------------------------------------- */

/// Raw server frame. Exactly one member is normally present.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMessage {
    #[serde(default)]
    pub setup_complete: Option<serde_json::Value>,
    #[serde(default)]
    pub server_content: Option<ServerContent>,
    #[serde(default)]
    pub filtered_prompt: Option<FilteredPrompt>,
    #[serde(default)]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerContent {
    #[serde(default)]
    pub audio_chunks: Vec<AudioChunk>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioChunk {
    /// Base64-encoded PCM.
    pub data: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredPrompt {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub filtered_reason: Option<String>,
}

/// Classified server frame.
#[derive(Debug, Clone)]
pub enum LyriaEvent {
    SetupComplete,
    Audio(Vec<AudioChunk>),
    PromptFiltered(FilteredPrompt),
    Warning(String),
    Other,
}

impl ServerMessage {
    pub fn into_event(self) -> LyriaEvent {
        if self.setup_complete.is_some() {
            LyriaEvent::SetupComplete
        } else if let Some(content) = self.server_content {
            LyriaEvent::Audio(content.audio_chunks)
        } else if let Some(filtered) = self.filtered_prompt {
            LyriaEvent::PromptFiltered(filtered)
        } else if let Some(warning) = self.warning {
            LyriaEvent::Warning(warning)
        } else {
            LyriaEvent::Other
        }
    }
}

/// Parse a server frame (text or UTF-8 binary) into an event.
pub fn parse_server_message(payload: &[u8]) -> Result<LyriaEvent, serde_json::Error> {
    let message: ServerMessage = serde_json::from_slice(payload)?;
    Ok(message.into_event())
}
