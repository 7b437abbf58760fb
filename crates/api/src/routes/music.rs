//! Route definitions for music generation.
//!
//! Mounted at `/ai/music`.
//!
//! ```text
//! POST /generate          generate_music (JSON body)
//! POST /generate-simple   generate_music_simple (query string)
//! ```

use axum::routing::post;
use axum::Router;

use crate::handlers::music;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate", post(music::generate_music))
        .route("/generate-simple", post(music::generate_music_simple))
}
