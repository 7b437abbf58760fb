//! Daily quota extractor for generation endpoints.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use mediagen_core::error::CoreError;

use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// An authenticated caller who has been charged one generation request.
///
/// Must be listed before any body extractor so the quota is checked (and
/// consumed) before the body is read or validated. The charge is not
/// refunded if the request later fails.
#[derive(Debug, Clone)]
pub struct QuotaUser {
    pub user: AuthUser,
    /// Requests left today after this one.
    pub remaining: u32,
}

impl FromRequestParts<AppState> for QuotaUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;

        let remaining = state
            .quota
            .check_and_increment(&user.user_id)
            .inspect_err(|e| {
                if matches!(e, CoreError::QuotaExceeded { .. }) {
                    tracing::info!(user_id = %user.user_id, "Daily AI quota exhausted");
                }
            })?;

        tracing::debug!(user_id = %user.user_id, remaining, "Charged generation quota");

        Ok(QuotaUser { user, remaining })
    }
}
