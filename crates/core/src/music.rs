//! Music generation request model and PCM result packaging.
//!
//! Audio comes back from the provider as raw PCM16 little-endian, 48 kHz,
//! stereo. The output format is fixed, so the response always reports the
//! same sample rate, channel count and bit depth; only the byte length (and
//! therefore duration) varies.

use base64::Engine;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// PCM sample rate of generated audio.
pub const SAMPLE_RATE_HZ: u32 = 48_000;
/// Interleaved channel count (stereo).
pub const CHANNELS: u16 = 2;
/// Bits per sample.
pub const BIT_DEPTH: u16 = 16;
/// Bytes per interleaved stereo frame.
pub const BYTES_PER_FRAME: usize = (CHANNELS as usize) * (BIT_DEPTH as usize / 8);
/// Bytes of PCM per second of audio (192 000).
pub const BYTES_PER_SECOND: usize = SAMPLE_RATE_HZ as usize * BYTES_PER_FRAME;

pub const DEFAULT_BPM: u32 = 120;
pub const DEFAULT_DURATION_SECS: u32 = 30;
pub const MIN_DURATION_SECS: u32 = 5;
pub const MAX_DURATION_SECS: u32 = 120;

/* --------------------------------------------------------------------------
Enumerations
-------------------------------------------------------------------------- */

/// Musical key (relative major/minor pair).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MusicScale {
    #[serde(rename = "C_MAJOR_A_MINOR")]
    CMajorAMinor,
    #[serde(rename = "G_MAJOR_E_MINOR")]
    GMajorEMinor,
    #[serde(rename = "D_MAJOR_B_MINOR")]
    DMajorBMinor,
    #[serde(rename = "A_MAJOR_F_SHARP_MINOR")]
    AMajorFSharpMinor,
    #[serde(rename = "E_MAJOR_C_SHARP_MINOR")]
    EMajorCSharpMinor,
    #[serde(rename = "B_MAJOR_G_SHARP_MINOR")]
    BMajorGSharpMinor,
    #[serde(rename = "F_MAJOR_D_MINOR")]
    FMajorDMinor,
    #[serde(rename = "B_FLAT_MAJOR_G_MINOR")]
    BFlatMajorGMinor,
    #[serde(rename = "E_FLAT_MAJOR_C_MINOR")]
    EFlatMajorCMinor,
    #[serde(rename = "A_FLAT_MAJOR_F_MINOR")]
    AFlatMajorFMinor,
}

/// What the model optimizes for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MusicGenerationMode {
    #[default]
    Quality,
    Diversity,
    Vocalization,
}

/* --------------------------------------------------------------------------
Request model
-------------------------------------------------------------------------- */

/// A text direction and how strongly it steers the music.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct WeightedPrompt {
    #[validate(
        length(min = 1, max = 500, message = "must be between 1 and 500 characters"),
        custom(function = "crate::validation::non_blank")
    )]
    pub text: String,
    #[serde(default = "default_weight")]
    #[validate(range(exclusive_min = 0.0, max = 5.0, message = "must be greater than 0 and at most 5"))]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

/// Generation knobs. Every field has a documented default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct MusicGenerationConfig {
    #[validate(range(min = 60, max = 200, message = "must be between 60 and 200"))]
    pub bpm: u32,
    #[validate(range(min = 0.0, max = 2.0, message = "must be between 0.0 and 2.0"))]
    pub temperature: f64,
    #[validate(range(min = 0.0, max = 6.0, message = "must be between 0.0 and 6.0"))]
    pub guidance: f64,
    #[validate(range(min = 0.0, max = 1.0, message = "must be between 0.0 and 1.0"))]
    pub density: Option<f64>,
    #[validate(range(min = 0.0, max = 1.0, message = "must be between 0.0 and 1.0"))]
    pub brightness: Option<f64>,
    pub scale: Option<MusicScale>,
    pub mute_bass: bool,
    pub mute_drums: bool,
    pub only_bass_and_drums: bool,
    pub music_generation_mode: MusicGenerationMode,
}

impl Default for MusicGenerationConfig {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            temperature: 1.0,
            guidance: 4.0,
            density: None,
            brightness: None,
            scale: None,
            mute_bass: false,
            mute_drums: false,
            only_bass_and_drums: false,
            music_generation_mode: MusicGenerationMode::Quality,
        }
    }
}

/// JSON body of `POST /ai/music/generate`.
#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct MusicGenerationRequest {
    #[validate(length(min = 1, max = 5, message = "must contain between 1 and 5 prompts"), nested)]
    pub prompts: Vec<WeightedPrompt>,
    #[serde(default, deserialize_with = "crate::validation::null_as_default")]
    #[validate(nested)]
    pub config: MusicGenerationConfig,
    #[serde(default = "default_duration")]
    #[validate(range(min = 5, max = 120, message = "must be between 5 and 120 seconds"))]
    pub duration_seconds: u32,
}

fn default_duration() -> u32 {
    DEFAULT_DURATION_SECS
}

impl MusicGenerationRequest {
    /// Single-prompt request used by the query-string endpoint.
    pub fn simple(prompt: String, bpm: u32, duration_seconds: u32) -> Self {
        Self {
            prompts: vec![WeightedPrompt {
                text: prompt,
                weight: 1.0,
            }],
            config: MusicGenerationConfig {
                bpm,
                ..MusicGenerationConfig::default()
            },
            duration_seconds,
        }
    }

    /// Number of PCM bytes that make up the requested duration.
    pub fn target_pcm_len(&self) -> usize {
        self.duration_seconds as usize * BYTES_PER_SECOND
    }
}

/* --------------------------------------------------------------------------
Result
-------------------------------------------------------------------------- */

/// Response body of both music endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicResult {
    /// Base64-encoded PCM16 little-endian interleaved stereo.
    pub audio_b64: String,
    pub sample_rate_hz: u32,
    pub channels: u16,
    pub bit_depth: u16,
    /// Actual duration derived from the PCM byte count.
    pub duration_seconds: f64,
    pub prompts_used: Vec<String>,
}

impl MusicResult {
    /// Package raw PCM and the prompts that produced it.
    pub fn from_pcm(pcm: &[u8], prompts: &[WeightedPrompt]) -> Self {
        Self {
            audio_b64: base64::engine::general_purpose::STANDARD.encode(pcm),
            sample_rate_hz: SAMPLE_RATE_HZ,
            channels: CHANNELS,
            bit_depth: BIT_DEPTH,
            duration_seconds: pcm_duration_secs(pcm.len()),
            prompts_used: prompts.iter().map(|p| p.text.clone()).collect(),
        }
    }
}

/// Duration in seconds of `len` bytes of PCM in the fixed output format.
pub fn pcm_duration_secs(len: usize) -> f64 {
    len as f64 / BYTES_PER_SECOND as f64
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */
