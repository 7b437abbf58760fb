//! Bearer-token verification.
//!
//! - [`firebase`] -- Firebase ID tokens (RS256) checked against Google's
//!   published signing keys.
//! - [`jwt`] -- shared-secret HS256 tokens for development and tests.
//!
//! Handlers never see the verifier directly; the [`AuthUser`] extractor
//! calls whichever [`TokenVerifier`] is installed in the app state.
//!
//! [`AuthUser`]: crate::middleware::auth::AuthUser

pub mod firebase;
pub mod jwt;

use std::sync::Arc;

use async_trait::async_trait;
use mediagen_core::types::UserId;

use self::firebase::FirebaseVerifier;
use self::jwt::{JwtConfig, JwtVerifier};

/// Identity established from a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedUser {
    pub uid: UserId,
    pub email: Option<String>,
}

/// Errors from token verification.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The token is malformed, expired, or signed by the wrong key.
    #[error("Invalid or expired token")]
    InvalidToken(String),

    /// Signing keys could not be fetched, so no token can be checked.
    #[error("Token signing keys unavailable: {0}")]
    KeysUnavailable(String),
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<VerifiedUser, AuthError>;
}

/// Which verifier to install.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Firebase project whose ID tokens are accepted.
    pub firebase_project_id: Option<String>,
    /// Shared-secret HS256 settings.
    pub jwt: Option<JwtConfig>,
}

impl AuthConfig {
    /// Load auth settings from environment variables.
    ///
    /// | Env Var               | Default |
    /// |-----------------------|---------|
    /// | `FIREBASE_PROJECT_ID` | unset   |
    /// | `JWT_SECRET`          | unset   |
    /// | `JWT_EXPIRY_MINS`     | `60`    |
    ///
    /// # Panics
    ///
    /// Panics if neither `FIREBASE_PROJECT_ID` nor `JWT_SECRET` is set.
    pub fn from_env() -> Self {
        let firebase_project_id = std::env::var("FIREBASE_PROJECT_ID")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let jwt = JwtConfig::from_env();

        assert!(
            firebase_project_id.is_some() || jwt.is_some(),
            "Either FIREBASE_PROJECT_ID or JWT_SECRET must be set"
        );

        Self {
            firebase_project_id,
            jwt,
        }
    }

    /// Build the configured verifier. Firebase takes precedence when both
    /// are configured.
    ///
    /// # Panics
    ///
    /// Panics if neither verifier is configured.
    pub fn build_verifier(&self, client: reqwest::Client) -> Arc<dyn TokenVerifier> {
        match (&self.firebase_project_id, &self.jwt) {
            (Some(project_id), _) => {
                tracing::info!(%project_id, "Verifying Firebase ID tokens");
                Arc::new(FirebaseVerifier::new(client, project_id.clone()))
            }
            (None, Some(jwt)) => {
                tracing::warn!("Verifying shared-secret HS256 tokens (development mode)");
                Arc::new(JwtVerifier::new(jwt.clone()))
            }
            (None, None) => panic!("No token verifier configured: set FIREBASE_PROJECT_ID or JWT_SECRET"),
        }
    }
}
