//! Errors from upstream provider calls.

use tokio_tungstenite::tungstenite;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// No API key is configured; generation is disabled.
    #[error("Generation provider is not configured")]
    NotConfigured,

    /// The provider could not be reached or answered with a server error.
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// The provider refused the request (4xx other than rate limiting).
    #[error("Provider rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The provider did not produce a result in time.
    #[error("Provider timed out: {0}")]
    Timeout(String),

    /// The provider answered with something we could not interpret.
    #[error("Provider protocol error: {0}")]
    Protocol(String),
}

impl ProviderError {
    /// Classify a non-2xx upstream HTTP response.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            429 => ProviderError::Unavailable(format!("rate limited by provider: {body}")),
            400..=499 => ProviderError::Rejected {
                status,
                message: body,
            },
            _ => ProviderError::Unavailable(format!("provider returned {status}: {body}")),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout(e.to_string())
        } else if e.is_decode() {
            ProviderError::Protocol(e.to_string())
        } else if let Some(status) = e.status() {
            ProviderError::from_status(status.as_u16(), e.to_string())
        } else {
            ProviderError::Unavailable(e.to_string())
        }
    }
}

impl From<tungstenite::Error> for ProviderError {
    fn from(e: tungstenite::Error) -> Self {
        match e {
            tungstenite::Error::Http(response) => {
                let status = response.status().as_u16();
                let body = response
                    .body()
                    .as_ref()
                    .map(|b| String::from_utf8_lossy(b).into_owned())
                    .unwrap_or_default();
                ProviderError::from_status(status, body)
            }
            tungstenite::Error::Io(e) => ProviderError::Unavailable(e.to_string()),
            tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
                ProviderError::Protocol("music session closed unexpectedly".into())
            }
            other => ProviderError::Protocol(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(e: serde_json::Error) -> Self {
        ProviderError::Protocol(format!("malformed provider payload: {e}"))
    }
}
