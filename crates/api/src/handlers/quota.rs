//! Handler for `/ai/quota`.

use axum::extract::State;
use axum::Json;
use mediagen_core::quota::QuotaUsage;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// GET /api/v1/ai/quota
///
/// The caller's usage for the current UTC day. Does not consume quota.
pub async fn get_quota(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<QuotaUsage>> {
    Ok(Json(state.quota.usage(&user.user_id)?))
}
