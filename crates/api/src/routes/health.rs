use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether a generation provider API key is configured.
    pub provider_configured: bool,
}

/// GET /health -- liveness. Always 200 while the process is serving.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        provider_configured: state.config.provider_configured(),
    })
}

/// GET /health/ready -- readiness. 503 until a provider is configured.
async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let provider_configured = state.config.provider_configured();
    let (code, status) = if provider_configured {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not_ready")
    };

    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            provider_configured,
        }),
    )
}

/// Health routes. Mounted both at the root and under `/api/v1`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness_check))
}
