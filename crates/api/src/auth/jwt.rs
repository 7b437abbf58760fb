//! Shared-secret HS256 tokens.
//!
//! Used in development and tests where no Firebase project is available.
//! Tokens carry the user id in `sub` and an optional email.

use async_trait::async_trait;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AuthError, TokenVerifier, VerifiedUser};

/// JWT claims embedded in every token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the user id.
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Unique token identifier (UUID v4).
    pub jti: String,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Token lifetime in minutes (default: 60).
    pub token_expiry_mins: i64,
}

const DEFAULT_EXPIRY_MINS: i64 = 60;

impl JwtConfig {
    /// Load from `JWT_SECRET` / `JWT_EXPIRY_MINS`. Returns `None` when no
    /// secret is set.
    ///
    /// # Panics
    ///
    /// Panics if `JWT_EXPIRY_MINS` is not a valid integer.
    pub fn from_env() -> Option<Self> {
        let secret = std::env::var("JWT_SECRET").ok().filter(|s| !s.is_empty())?;

        let token_expiry_mins: i64 = std::env::var("JWT_EXPIRY_MINS")
            .unwrap_or_else(|_| DEFAULT_EXPIRY_MINS.to_string())
            .parse()
            .expect("JWT_EXPIRY_MINS must be a valid i64");

        Some(Self {
            secret,
            token_expiry_mins,
        })
    }
}

/// Issue an HS256 token for `user_id`.
pub fn issue_token(
    user_id: &str,
    email: Option<&str>,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.map(str::to_string),
        exp: now + config.token_expiry_mins * 60,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Validate and decode a token, returning the embedded [`Claims`].
pub fn validate_token(token: &str, config: &JwtConfig) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(), // HS256, validates exp
    )?;
    Ok(token_data.claims)
}

/// [`TokenVerifier`] backed by a shared secret.
pub struct JwtVerifier {
    config: JwtConfig,
}

impl JwtVerifier {
    pub fn new(config: JwtConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl TokenVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedUser, AuthError> {
        let claims =
            validate_token(token, &self.config).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        if claims.sub.is_empty() {
            return Err(AuthError::InvalidToken("empty subject".into()));
        }
        Ok(VerifiedUser {
            uid: claims.sub,
            email: claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            token_expiry_mins: 15,
        }
    }

    #[test]
    fn issue_and_validate() {
        let config = test_config();
        let token = issue_token("user-42", Some("a@example.com"), &config).unwrap();

        let claims = validate_token(&token, &config).unwrap();
        assert_eq!(claims.sub, "user-42");
        assert_eq!(claims.email.as_deref(), Some("a@example.com"));
        assert!(claims.exp > claims.iat);
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn expired_token_fails() {
        let config = test_config();
        // Well beyond the default 60-second leeway.
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: "user-1".into(),
            email: None,
            exp: now - 300,
            iat: now - 600,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();

        assert!(validate_token(&token, &config).is_err());
    }

    #[test]
    fn different_secret_fails() {
        let token = issue_token("user-1", None, &test_config()).unwrap();
        let other = JwtConfig {
            secret: "secret-bravo".into(),
            token_expiry_mins: 15,
        };
        assert!(validate_token(&token, &other).is_err());
    }

    #[tokio::test]
    async fn verifier_maps_claims_to_user() {
        let config = test_config();
        let token = issue_token("user-7", None, &config).unwrap();
        let user = JwtVerifier::new(config).verify(&token).await.unwrap();
        assert_eq!(user.uid, "user-7");
        assert_eq!(user.email, None);
    }

    #[tokio::test]
    async fn verifier_rejects_garbage() {
        let result = JwtVerifier::new(test_config()).verify("not.a.token").await;
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }
}
