//! Video generation request model (text-to-video and image-to-video).
//!
//! Every enumerated option is a closed enum whose serde names are the wire
//! values callers send (`"16:9"`, `"720p"`, `"allow_adult"`, ...). Omitted
//! options fall back to the documented defaults through `Default`.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use validator::Validate;

use crate::error::CoreError;

/// Upper bound on prompt length, in characters.
pub const MAX_PROMPT_CHARS: usize = 2000;

/// Upper bound on negative prompt length, in characters.
pub const MAX_NEGATIVE_PROMPT_CHARS: usize = 500;

/* --------------------------------------------------------------------------
Enumerations
-------------------------------------------------------------------------- */

/// Output frame shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 2] = [AspectRatio::Landscape, AspectRatio::Portrait];

    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
        }
    }
}

/// Output resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Resolution {
    #[default]
    #[serde(rename = "720p")]
    Hd,
    #[serde(rename = "1080p")]
    FullHd,
}

impl Resolution {
    pub const ALL: [Resolution; 2] = [Resolution::Hd, Resolution::FullHd];

    pub fn as_str(self) -> &'static str {
        match self {
            Resolution::Hd => "720p",
            Resolution::FullHd => "1080p",
        }
    }
}

/// Whether and which people may appear in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonGeneration {
    AllowAll,
    #[default]
    AllowAdult,
    DontAllow,
}

impl PersonGeneration {
    pub const ALL: [PersonGeneration; 3] = [
        PersonGeneration::AllowAll,
        PersonGeneration::AllowAdult,
        PersonGeneration::DontAllow,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PersonGeneration::AllowAll => "allow_all",
            PersonGeneration::AllowAdult => "allow_adult",
            PersonGeneration::DontAllow => "dont_allow",
        }
    }
}

/// Clip length. Accepted on the wire as either `"8"` or `8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VideoDuration {
    Four,
    Six,
    #[default]
    Eight,
}

impl VideoDuration {
    pub const ALL: [VideoDuration; 3] = [VideoDuration::Four, VideoDuration::Six, VideoDuration::Eight];

    pub fn seconds(self) -> u32 {
        match self {
            VideoDuration::Four => 4,
            VideoDuration::Six => 6,
            VideoDuration::Eight => 8,
        }
    }

    pub fn from_seconds(seconds: u64) -> Option<Self> {
        match seconds {
            4 => Some(VideoDuration::Four),
            6 => Some(VideoDuration::Six),
            8 => Some(VideoDuration::Eight),
            _ => None,
        }
    }
}

impl Serialize for VideoDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.seconds())
    }
}

impl<'de> Deserialize<'de> for VideoDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DurationVisitor;

        impl Visitor<'_> for DurationVisitor {
            type Value = VideoDuration;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("one of 4, 6 or 8 (number or string)")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                VideoDuration::from_seconds(v)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Unsigned(v), &self))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                u64::try_from(v)
                    .ok()
                    .and_then(VideoDuration::from_seconds)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Signed(v), &self))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.trim()
                    .parse::<u64>()
                    .ok()
                    .and_then(VideoDuration::from_seconds)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_any(DurationVisitor)
    }
}

/* --------------------------------------------------------------------------
Request model
-------------------------------------------------------------------------- */

/// Tunable options for a video generation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate)]
#[serde(default)]
pub struct VideoGenerationConfig {
    pub aspect_ratio: AspectRatio,
    pub resolution: Resolution,
    pub duration_seconds: VideoDuration,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub negative_prompt: Option<String>,
    pub person_generation: PersonGeneration,
    pub seed: Option<i64>,
}

/// JSON body of `POST /ai/videos/generate`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VideoGenerationRequest {
    #[validate(
        length(min = 1, max = 2000, message = "must be between 1 and 2000 characters"),
        custom(function = "crate::validation::non_blank")
    )]
    pub prompt: String,
    #[serde(default, deserialize_with = "crate::validation::null_as_default")]
    #[validate(nested)]
    pub config: VideoGenerationConfig,
}

impl VideoGenerationRequest {
    /// Normalize a validated request into the job handed to the gateway.
    ///
    /// An empty negative prompt is dropped rather than forwarded.
    pub fn into_job(self, image: Option<SourceImage>) -> VideoJob {
        let mut config = self.config;
        config.negative_prompt = config
            .negative_prompt
            .filter(|p| !p.trim().is_empty());
        VideoJob {
            prompt: self.prompt,
            image,
            config,
        }
    }
}

/// A validated, normalized video generation job.
#[derive(Debug, Clone)]
pub struct VideoJob {
    pub prompt: String,
    pub image: Option<SourceImage>,
    pub config: VideoGenerationConfig,
}

/* --------------------------------------------------------------------------
Source images
-------------------------------------------------------------------------- */

/// Image formats accepted for image-to-video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
}

impl ImageFormat {
    /// Content types accepted on upload.
    pub const SUPPORTED_CONTENT_TYPES: [&'static str; 3] = ["image/jpeg", "image/png", "image/webp"];

    /// Match a declared `Content-Type`, ignoring parameters and case.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "image/jpeg" => Some(ImageFormat::Jpeg),
            "image/png" => Some(ImageFormat::Png),
            "image/webp" => Some(ImageFormat::Webp),
            _ => None,
        }
    }

    /// Detect the format from the file's magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match image::guess_format(bytes).ok()? {
            image::ImageFormat::Jpeg => Some(ImageFormat::Jpeg),
            image::ImageFormat::Png => Some(ImageFormat::Png),
            image::ImageFormat::WebP => Some(ImageFormat::Webp),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Webp => "image/webp",
        }
    }
}

/// An uploaded source image whose declared type matches its contents.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

impl SourceImage {
    /// Validate an uploaded file against the accepted formats and size cap.
    pub fn from_upload(
        content_type: Option<&str>,
        bytes: Vec<u8>,
        max_bytes: usize,
    ) -> Result<Self, CoreError> {
        let declared = content_type
            .and_then(ImageFormat::from_content_type)
            .ok_or_else(|| {
                CoreError::invalid_field("image", "Invalid image format. Supported: JPEG, PNG, WEBP")
            })?;

        if bytes.is_empty() {
            return Err(CoreError::invalid_field("image", "must not be empty"));
        }
        if bytes.len() > max_bytes {
            return Err(CoreError::invalid_field(
                "image",
                format!("exceeds the {max_bytes} byte limit ({} bytes)", bytes.len()),
            ));
        }

        match ImageFormat::sniff(&bytes) {
            Some(actual) if actual == declared => Ok(Self {
                bytes,
                format: declared,
            }),
            _ => Err(CoreError::invalid_field(
                "image",
                format!("content does not match declared type {}", declared.mime_type()),
            )),
        }
    }
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */
