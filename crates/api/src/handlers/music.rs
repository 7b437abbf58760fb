//! Handlers for the `/ai/music` resource.
//!
//! Music generation is synchronous: the request stays open while the
//! provider streams audio, and the response carries the whole clip.

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use mediagen_core::music::{MusicGenerationRequest, MusicResult, DEFAULT_BPM, DEFAULT_DURATION_SECS};
use mediagen_core::validation;
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::extract::{QueryParams, ValidatedJson};
use crate::middleware::auth::AuthUser;
use crate::middleware::quota::QuotaUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query types
// ---------------------------------------------------------------------------

/// Query string of `POST /ai/music/generate-simple`.
#[derive(Debug, Deserialize, Validate)]
pub struct SimpleMusicParams {
    #[validate(
        length(min = 1, max = 500, message = "must be between 1 and 500 characters"),
        custom(function = "mediagen_core::validation::non_blank")
    )]
    pub prompt: String,
    #[serde(default = "default_bpm")]
    #[validate(range(min = 60, max = 200, message = "must be between 60 and 200"))]
    pub bpm: u32,
    #[serde(default = "default_duration")]
    #[validate(range(min = 5, max = 120, message = "must be between 5 and 120 seconds"))]
    pub duration_seconds: u32,
}

fn default_bpm() -> u32 {
    DEFAULT_BPM
}

fn default_duration() -> u32 {
    DEFAULT_DURATION_SECS
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn generate(
    state: &AppState,
    user: &AuthUser,
    request: MusicGenerationRequest,
) -> AppResult<Json<MusicResult>> {
    let started = Instant::now();
    let pcm = state.music.generate(&request).await?;
    let result = MusicResult::from_pcm(&pcm, &request.prompts);

    tracing::info!(
        user_id = %user.user_id,
        prompts = request.prompts.len(),
        requested_secs = request.duration_seconds,
        actual_secs = result.duration_seconds,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Generated music",
    );
    Ok(Json(result))
}

/// POST /api/v1/ai/music/generate
///
/// Weighted prompts plus full configuration.
pub async fn generate_music(
    State(state): State<AppState>,
    quota: QuotaUser,
    ValidatedJson(request): ValidatedJson<MusicGenerationRequest>,
) -> AppResult<Json<MusicResult>> {
    generate(&state, &quota.user, request).await
}

/// POST /api/v1/ai/music/generate-simple?prompt=...&bpm=...&duration_seconds=...
///
/// Single prompt with default configuration apart from the tempo.
pub async fn generate_music_simple(
    State(state): State<AppState>,
    quota: QuotaUser,
    QueryParams(params): QueryParams<SimpleMusicParams>,
) -> AppResult<Json<MusicResult>> {
    validation::check(&params).map_err(AppError::from_param_error)?;
    let request = MusicGenerationRequest::simple(params.prompt, params.bpm, params.duration_seconds);
    generate(&state, &quota.user, request).await
}
