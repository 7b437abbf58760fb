//! Route definitions for video generation.
//!
//! Mounted at `/ai/videos`.
//!
//! ```text
//! POST /generate                   generate_video
//! POST /generate-from-image        generate_video_from_image (multipart)
//! GET  /status/{operation_id}      get_video_status
//! ```

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::video;
use crate::state::AppState;

/// Room for the prompt and option fields alongside the image.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn router(max_image_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/generate", post(video::generate_video))
        .route(
            "/generate-from-image",
            post(video::generate_video_from_image)
                .layer(DefaultBodyLimit::max(max_image_bytes + MULTIPART_OVERHEAD_BYTES)),
        )
        .route("/status/{operation_id}", get(video::get_video_status))
}
