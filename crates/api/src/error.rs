use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use mediagen_core::error::CoreError;
use mediagen_provider::ProviderError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`ProviderError`] for upstream
/// failures, and adds HTTP-specific variants. Implements [`IntoResponse`] to
/// produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `mediagen_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An upstream generation provider error.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A form or query parameter failed validation.
    #[error("Invalid parameter {field}: {message}")]
    InvalidParam { field: String, message: String },

    /// The request exceeded the server-wide timeout.
    #[error("Request timed out")]
    RequestTimeout,

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Re-classify a field error from a form or query string as a 400.
    pub fn from_param_error(err: CoreError) -> Self {
        match err {
            CoreError::InvalidField { field, message } => AppError::InvalidParam { field, message },
            CoreError::Validation(msg) => AppError::BadRequest(msg),
            other => AppError::Core(other),
        }
    }
}

const GENERIC_INTERNAL: &str = "An internal error occurred";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut field: Option<String> = None;

        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "VALIDATION_ERROR",
                    msg.clone(),
                ),
                CoreError::InvalidField { field: f, message } => {
                    field = Some(f.clone());
                    (
                        StatusCode::UNPROCESSABLE_ENTITY,
                        "VALIDATION_ERROR",
                        format!("{f}: {message}"),
                    )
                }
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::QuotaExceeded { limit } => (
                    StatusCode::TOO_MANY_REQUESTS,
                    "QUOTA_EXCEEDED",
                    format!("Daily AI limit of {limit} requests exceeded. Please try again tomorrow."),
                ),
                CoreError::ProviderUnavailable(msg) => {
                    tracing::warn!(error = %msg, "Provider unavailable");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "PROVIDER_UNAVAILABLE",
                        "The generation provider is temporarily unavailable".to_string(),
                    )
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        GENERIC_INTERNAL.to_string(),
                    )
                }
            },

            // --- Provider errors ---
            AppError::Provider(err) => classify_provider_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InvalidParam { field: f, message } => {
                field = Some(f.clone());
                (
                    StatusCode::BAD_REQUEST,
                    "BAD_REQUEST",
                    format!("{f}: {message}"),
                )
            }
            AppError::RequestTimeout => (
                StatusCode::REQUEST_TIMEOUT,
                "REQUEST_TIMEOUT",
                "The request took too long to complete".to_string(),
            ),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    GENERIC_INTERNAL.to_string(),
                )
            }
        };

        let mut body = json!({
            "error": message,
            "code": code,
        });
        if let Some(field) = field {
            body["field"] = json!(field);
        }

        let mut response = (status, axum::Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// Classify a provider error into an HTTP status, error code, and message.
///
/// - Missing configuration and unreachable providers map to 503.
/// - Requests the provider refused map to 400 with the provider's reason.
/// - Timeouts and protocol errors map to 500 with a sanitized message.
fn classify_provider_error(err: &ProviderError) -> (StatusCode, &'static str, String) {
    match err {
        ProviderError::NotConfigured => (
            StatusCode::SERVICE_UNAVAILABLE,
            "PROVIDER_NOT_CONFIGURED",
            "Generation is not configured on this server".to_string(),
        ),
        ProviderError::Unavailable(detail) => {
            tracing::warn!(error = %detail, "Provider unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "PROVIDER_UNAVAILABLE",
                "The generation provider is temporarily unavailable".to_string(),
            )
        }
        ProviderError::Rejected { status, message } => {
            tracing::info!(provider_status = status, error = %message, "Provider rejected request");
            (
                StatusCode::BAD_REQUEST,
                "PROVIDER_REJECTED",
                format!("The generation provider rejected the request: {message}"),
            )
        }
        ProviderError::Timeout(detail) => {
            tracing::error!(error = %detail, "Provider timed out");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "PROVIDER_TIMEOUT",
                "The generation provider did not respond in time".to_string(),
            )
        }
        ProviderError::Protocol(detail) => {
            tracing::error!(error = %detail, "Provider protocol error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                GENERIC_INTERNAL.to_string(),
            )
        }
    }
}
