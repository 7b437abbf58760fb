use std::str::FromStr;
use std::time::Duration;

use mediagen_provider::GeminiSettings;

use crate::auth::AuthConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the auth settings have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds. Must exceed the longest music capture.
    pub request_timeout_secs: u64,
    /// Generation requests allowed per user per UTC day.
    pub ai_daily_rate_limit: u32,
    /// How long finished operations stay pollable.
    pub operation_retention_secs: u64,
    /// Age after which unfinished operations are abandoned.
    pub operation_max_age_secs: u64,
    /// Upper bound on an uploaded source image.
    pub max_image_bytes: usize,
    pub provider: GeminiSettings,
    pub auth: AuthConfig,
}

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_VIDEO_MODEL: &str = "veo-3.1-generate-preview";
pub const DEFAULT_MUSIC_MODEL: &str = "models/lyria-realtime-exp";
pub const DEFAULT_MUSIC_WS_URL: &str = "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1alpha.GenerativeService.BidiGenerateMusic";

/// Read `name`, falling back to `default`, and parse it.
///
/// Panics with a descriptive message if the value does not parse.
fn env_or<T>(name: &str, default: &str) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(name).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse()
        .unwrap_or_else(|e| panic!("{name} must be a valid {}: {e}", std::any::type_name::<T>()))
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                                            |
    /// |----------------------------|----------------------------------------------------|
    /// | `HOST`                     | `0.0.0.0`                                          |
    /// | `PORT`                     | `8000`                                             |
    /// | `CORS_ORIGINS`             | `http://localhost:5173`                            |
    /// | `REQUEST_TIMEOUT_SECS`     | `180`                                              |
    /// | `AI_DAILY_RATE_LIMIT`      | `50`                                               |
    /// | `OPERATION_RETENTION_SECS` | `3600`                                             |
    /// | `OPERATION_MAX_AGE_SECS`   | `86400`                                            |
    /// | `MAX_IMAGE_BYTES`          | `20971520`                                         |
    /// | `GOOGLE_API_KEY`           | unset (generation disabled)                        |
    /// | `GOOGLE_API_BASE_URL`      | `https://generativelanguage.googleapis.com/v1beta` |
    /// | `GOOGLE_VIDEO_MODEL`       | `veo-3.1-generate-preview`                         |
    /// | `GOOGLE_MUSIC_MODEL`       | `models/lyria-realtime-exp`                        |
    /// | `GOOGLE_MUSIC_WS_URL`      | Lyria `BidiGenerateMusic` endpoint                 |
    /// | `VIDEO_INLINE_DELIVERY`    | `true`                                             |
    /// | `MUSIC_CAPTURE_GRACE_SECS` | `30`                                               |
    /// | `PROVIDER_TIMEOUT_SECS`    | `60`                                               |
    ///
    /// Auth settings are read by [`AuthConfig::from_env`].
    ///
    /// # Panics
    ///
    /// Panics on unparseable values, on a request timeout shorter than the
    /// longest music capture or the provider timeout, or when no token
    /// verifier is configured.
    pub fn from_env() -> Self {
        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let music_capture_grace_secs: u64 = env_or("MUSIC_CAPTURE_GRACE_SECS", "30");
        let provider_timeout_secs: u64 = env_or("PROVIDER_TIMEOUT_SECS", "60");
        let request_timeout_secs: u64 = env_or("REQUEST_TIMEOUT_SECS", "180");
        let longest_capture =
            u64::from(mediagen_core::music::MAX_DURATION_SECS) + music_capture_grace_secs;
        assert!(
            request_timeout_secs > longest_capture,
            "REQUEST_TIMEOUT_SECS ({request_timeout_secs}) must exceed the longest music capture ({longest_capture}s)"
        );
        assert!(
            request_timeout_secs > provider_timeout_secs,
            "REQUEST_TIMEOUT_SECS ({request_timeout_secs}) must exceed PROVIDER_TIMEOUT_SECS ({provider_timeout_secs})"
        );

        let provider = GeminiSettings {
            api_key: env_opt("GOOGLE_API_KEY"),
            base_url: env_opt("GOOGLE_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into()),
            video_model: env_opt("GOOGLE_VIDEO_MODEL").unwrap_or_else(|| DEFAULT_VIDEO_MODEL.into()),
            music_model: env_opt("GOOGLE_MUSIC_MODEL").unwrap_or_else(|| DEFAULT_MUSIC_MODEL.into()),
            music_ws_url: env_opt("GOOGLE_MUSIC_WS_URL")
                .unwrap_or_else(|| DEFAULT_MUSIC_WS_URL.into()),
            inline_video: env_or("VIDEO_INLINE_DELIVERY", "true"),
            music_capture_grace: Duration::from_secs(music_capture_grace_secs),
            http_timeout: Duration::from_secs(provider_timeout_secs),
        };

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_or("PORT", "8000"),
            cors_origins,
            request_timeout_secs,
            ai_daily_rate_limit: env_or("AI_DAILY_RATE_LIMIT", "50"),
            operation_retention_secs: env_or("OPERATION_RETENTION_SECS", "3600"),
            operation_max_age_secs: env_or("OPERATION_MAX_AGE_SECS", "86400"),
            max_image_bytes: env_or("MAX_IMAGE_BYTES", "20971520"),
            provider,
            auth: AuthConfig::from_env(),
        }
    }

    pub fn provider_configured(&self) -> bool {
        self.provider
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }
}
