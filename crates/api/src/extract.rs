//! Body and query extractors with the service's error mapping.
//!
//! - [`ValidatedJson`] -- JSON body, deserialized then checked with
//!   `validator`. Shape and range errors are 422, unreadable bodies 400.
//! - [`QueryParams`] -- query string; any failure is a 400.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use mediagen_core::error::CoreError;
use mediagen_core::validation;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::AppError;

/// A JSON body that deserialized and passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection)?;
        validation::check(&value)?;
        Ok(ValidatedJson(value))
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::JsonDataError(e) => AppError::Core(CoreError::Validation(e.body_text())),
        other => AppError::BadRequest(other.body_text()),
    }
}

/// Query parameters; rejections become 400 `BAD_REQUEST` in the JSON error
/// format rather than axum's plain-text default.
#[derive(Debug, Clone)]
pub struct QueryParams<T>(pub T);

impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e: QueryRejection| AppError::BadRequest(e.body_text()))?;
        Ok(QueryParams(value))
    }
}
