//! Handlers for the `/ai/videos` resource.
//!
//! Submissions return immediately with a `processing` operation; callers
//! poll `/status/{operation_id}` until `done`.

use axum::extract::{Multipart, Path, State};
use axum::Json;
use mediagen_core::error::CoreError;
use mediagen_core::operation::{OperationSnapshot, VideoGenerationResponse};
use mediagen_core::validation::{self, parse_field};
use mediagen_core::video::{SourceImage, VideoGenerationConfig, VideoGenerationRequest, VideoJob};

use crate::error::{AppError, AppResult};
use crate::extract::ValidatedJson;
use crate::middleware::auth::AuthUser;
use crate::middleware::quota::QuotaUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn submit(state: &AppState, user: &AuthUser, job: VideoJob) -> AppResult<Json<VideoGenerationResponse>> {
    let provider_name = state.video.submit(&job).await?;
    let snapshot = state.tracker.register(&user.user_id, provider_name).await;
    Ok(Json(snapshot.into()))
}

/// Raw multipart fields of an image-to-video request.
#[derive(Debug, Default)]
struct ImageVideoForm {
    prompt: Option<String>,
    image: Option<(Option<String>, Vec<u8>)>,
    aspect_ratio: Option<String>,
    resolution: Option<String>,
    duration_seconds: Option<String>,
    negative_prompt: Option<String>,
    person_generation: Option<String>,
    seed: Option<String>,
}

impl ImageVideoForm {
    async fn read(multipart: &mut Multipart) -> AppResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "image" {
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                form.image = Some((content_type, data.to_vec()));
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            // Browsers send empty strings for untouched optional inputs.
            let value = Some(value).filter(|v| !v.trim().is_empty() || name == "prompt");

            match name.as_str() {
                "prompt" => form.prompt = value,
                "aspect_ratio" => form.aspect_ratio = value,
                "resolution" => form.resolution = value,
                "duration_seconds" => form.duration_seconds = value,
                "negative_prompt" => form.negative_prompt = value,
                "person_generation" => form.person_generation = value,
                "seed" => form.seed = value,
                other => tracing::debug!(field = %other, "Ignoring unknown form field"),
            }
        }

        Ok(form)
    }

    fn config(&self) -> Result<VideoGenerationConfig, CoreError> {
        let mut config = VideoGenerationConfig::default();
        if let Some(v) = &self.aspect_ratio {
            config.aspect_ratio = parse_field("aspect_ratio", v)?;
        }
        if let Some(v) = &self.resolution {
            config.resolution = parse_field("resolution", v)?;
        }
        if let Some(v) = &self.duration_seconds {
            config.duration_seconds = parse_field("duration_seconds", v)?;
        }
        if let Some(v) = &self.person_generation {
            config.person_generation = parse_field("person_generation", v)?;
        }
        if let Some(v) = &self.seed {
            config.seed = Some(
                v.trim()
                    .parse()
                    .map_err(|_| CoreError::invalid_field("seed", "must be an integer"))?,
            );
        }
        config.negative_prompt = self.negative_prompt.clone();
        Ok(config)
    }
}

/// Form fields are flat, so drop the `config.` prefix from nested paths.
fn form_error(err: CoreError) -> AppError {
    match err {
        CoreError::InvalidField { field, message } => AppError::InvalidParam {
            field: field.strip_prefix("config.").unwrap_or(&field).to_string(),
            message,
        },
        other => AppError::from_param_error(other),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/ai/videos/generate
///
/// Text-to-video. Returns the new operation in `processing` state.
pub async fn generate_video(
    State(state): State<AppState>,
    quota: QuotaUser,
    ValidatedJson(request): ValidatedJson<VideoGenerationRequest>,
) -> AppResult<Json<VideoGenerationResponse>> {
    tracing::info!(
        user_id = %quota.user.user_id,
        aspect_ratio = request.config.aspect_ratio.as_str(),
        resolution = request.config.resolution.as_str(),
        duration = request.config.duration_seconds.seconds(),
        "Video generation requested",
    );
    submit(&state, &quota.user, request.into_job(None)).await
}

/// POST /api/v1/ai/videos/generate-from-image
///
/// Image-to-video from a multipart form. The image must be JPEG, PNG or
/// WEBP, both by declared content type and by content.
pub async fn generate_video_from_image(
    State(state): State<AppState>,
    quota: QuotaUser,
    mut multipart: Multipart,
) -> AppResult<Json<VideoGenerationResponse>> {
    let form = ImageVideoForm::read(&mut multipart).await?;

    let prompt = form
        .prompt
        .clone()
        .ok_or_else(|| AppError::InvalidParam {
            field: "prompt".into(),
            message: "is required".into(),
        })?;
    let config = form.config().map_err(form_error)?;
    let request = VideoGenerationRequest { prompt, config };
    validation::check(&request).map_err(form_error)?;

    let (content_type, bytes) = form.image.ok_or_else(|| AppError::InvalidParam {
        field: "image".into(),
        message: "is required".into(),
    })?;
    let image = SourceImage::from_upload(content_type.as_deref(), bytes, state.config.max_image_bytes)
        .map_err(form_error)?;

    tracing::info!(
        user_id = %quota.user.user_id,
        image_format = image.format.mime_type(),
        image_bytes = image.bytes.len(),
        "Image-to-video generation requested",
    );
    submit(&state, &quota.user, request.into_job(Some(image))).await
}

/// GET /api/v1/ai/videos/status/{operation_id}
///
/// Does not consume quota.
pub async fn get_video_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(operation_id): Path<String>,
) -> AppResult<Json<OperationSnapshot>> {
    let snapshot = state
        .tracker
        .status(&user.user_id, &operation_id, state.video.as_ref())
        .await?;
    Ok(Json(snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use mediagen_core::video::{AspectRatio, PersonGeneration, VideoDuration};

    #[test]
    fn form_config_parses_all_fields() {
        let form = ImageVideoForm {
            aspect_ratio: Some("9:16".into()),
            duration_seconds: Some("6".into()),
            person_generation: Some("dont_allow".into()),
            seed: Some("7".into()),
            ..Default::default()
        };
        let config = form.config().unwrap();
        assert_eq!(config.aspect_ratio, AspectRatio::Portrait);
        assert_eq!(config.duration_seconds, VideoDuration::Six);
        assert_eq!(config.person_generation, PersonGeneration::DontAllow);
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn form_config_rejects_unknown_enum_value() {
        let form = ImageVideoForm {
            duration_seconds: Some("5".into()),
            ..Default::default()
        };
        assert_matches!(
            form.config().map_err(form_error),
            Err(AppError::InvalidParam { field, .. }) if field == "duration_seconds"
        );
    }

    #[test]
    fn nested_paths_are_flattened_for_forms() {
        let err = form_error(CoreError::invalid_field("config.negative_prompt", "too long"));
        assert_matches!(err, AppError::InvalidParam { field, .. } if field == "negative_prompt");
    }
}
