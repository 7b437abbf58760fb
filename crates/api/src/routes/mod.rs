pub mod health;
pub mod music;
pub mod video;

use axum::routing::get;
use axum::Router;

use crate::config::ServerConfig;
use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /health                              liveness (public)
/// /health/ready                        readiness (public)
///
/// /ai/videos/generate                  text-to-video (auth + quota)
/// /ai/videos/generate-from-image       image-to-video (auth + quota)
/// /ai/videos/status/{operation_id}     poll operation (auth)
///
/// /ai/music/generate                   weighted prompts (auth + quota)
/// /ai/music/generate-simple            single prompt (auth + quota)
///
/// /ai/quota                            caller's usage today (auth)
/// ```
pub fn api_routes(config: &ServerConfig) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/ai/videos", video::router(config.max_image_bytes))
        .nest("/ai/music", music::router())
        .route("/ai/quota", get(handlers::quota::get_quota))
}
