//! Bearer-token authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use mediagen_core::error::CoreError;
use mediagen_core::types::UserId;

use crate::auth::AuthError;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated caller extracted from the `Authorization: Bearer` header.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = %user.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: UserId,
    pub email: Option<String>,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Authorization header missing".into(),
                ))
            })?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Invalid Authorization format. Expected: Bearer <token>".into(),
                ))
            })?;

        let user = state.verifier.verify(token).await.map_err(|e| match e {
            AuthError::InvalidToken(reason) => {
                tracing::debug!(%reason, "Rejected bearer token");
                AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
            }
            AuthError::KeysUnavailable(reason) => {
                AppError::Core(CoreError::ProviderUnavailable(format!(
                    "token verification keys unavailable: {reason}"
                )))
            }
        })?;

        Ok(AuthUser {
            user_id: user.uid,
            email: user.email,
        })
    }
}
