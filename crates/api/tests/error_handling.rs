//! Tests for `AppError` -> HTTP response mapping.
//!
//! These call `IntoResponse` directly on `AppError` values; no router is
//! involved.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use mediagen_api::error::AppError;
use mediagen_core::error::CoreError;
use mediagen_provider::ProviderError;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

// ---------------------------------------------------------------------------
// Test: CoreError::NotFound maps to 404 with NOT_FOUND code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::NotFound {
        entity: "Operation",
        id: "abc".into(),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Operation with id abc not found");
}

// ---------------------------------------------------------------------------
// Test: field validation errors are 422 and name the field
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_field_returns_422_with_field() {
    let err = AppError::Core(CoreError::invalid_field("config.bpm", "must be between 60 and 200"));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["field"], "config.bpm");
}

// ---------------------------------------------------------------------------
// Test: form and query parameter errors are 400 and name the field
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_param_returns_400_with_field() {
    let err = AppError::from_param_error(CoreError::invalid_field("bpm", "must be between 60 and 200"));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["field"], "bpm");
}

// ---------------------------------------------------------------------------
// Test: Unauthorized maps to 401 with a Bearer challenge
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unauthorized_returns_401_with_challenge() {
    let response = AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        .into_response();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get("www-authenticate").unwrap(),
        "Bearer"
    );
}

// ---------------------------------------------------------------------------
// Test: QuotaExceeded maps to 429 and mentions the limit
// ---------------------------------------------------------------------------

#[tokio::test]
async fn quota_exceeded_returns_429() {
    let (status, json) = error_to_response(AppError::Core(CoreError::QuotaExceeded { limit: 50 })).await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["code"], "QUOTA_EXCEEDED");
    assert!(json["error"].as_str().unwrap().contains("50"));
}

// ---------------------------------------------------------------------------
// Test: provider errors map by category
// ---------------------------------------------------------------------------

#[tokio::test]
async fn provider_not_configured_returns_503() {
    let (status, json) = error_to_response(ProviderError::NotConfigured.into()).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["code"], "PROVIDER_NOT_CONFIGURED");
}

#[tokio::test]
async fn provider_unavailable_returns_503_without_detail() {
    let err = ProviderError::Unavailable("connection refused to 10.0.0.7".into());
    let (status, json) = error_to_response(err.into()).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["code"], "PROVIDER_UNAVAILABLE");
    assert!(!json["error"].as_str().unwrap().contains("10.0.0.7"));
}

#[tokio::test]
async fn provider_rejection_returns_400_with_reason() {
    let err = ProviderError::Rejected {
        status: 400,
        message: "prompt blocked by safety filter".into(),
    };
    let (status, json) = error_to_response(err.into()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "PROVIDER_REJECTED");
    assert!(json["error"].as_str().unwrap().contains("safety filter"));
}

#[tokio::test]
async fn provider_timeout_returns_500() {
    let (status, json) = error_to_response(ProviderError::Timeout("no audio".into()).into()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "PROVIDER_TIMEOUT");
}

#[tokio::test]
async fn provider_protocol_error_is_sanitized() {
    let err = ProviderError::Protocol("unexpected frame: {\"secret\":1}".into());
    let (status, json) = error_to_response(err.into()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

// ---------------------------------------------------------------------------
// Test: AppError::InternalError maps to 500 and sanitizes the message
// ---------------------------------------------------------------------------

#[tokio::test]
async fn internal_error_is_sanitized() {
    let err = AppError::InternalError("lock poisoned at quota.rs:42".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
    assert!(json.get("field").is_none());
}

// ---------------------------------------------------------------------------
// Test: AppError::RequestTimeout maps to 408
// ---------------------------------------------------------------------------

#[tokio::test]
async fn request_timeout_returns_408() {
    let (status, json) = error_to_response(AppError::RequestTimeout).await;

    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(json["code"], "REQUEST_TIMEOUT");
}
