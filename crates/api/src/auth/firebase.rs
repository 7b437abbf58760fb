//! Firebase ID token verification.
//!
//! ID tokens are RS256 JWTs signed with one of Google's rotating
//! `securetoken` keys. The key set is fetched from Google and cached for
//! the `max-age` the response advertises. An unknown `kid` forces a refresh
//! so rotations are picked up without waiting for expiry, at most once per
//! [`MIN_REFRESH_INTERVAL`].

use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::{AuthError, TokenVerifier, VerifiedUser};

pub const GOOGLE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Cache lifetime when the key response has no usable `Cache-Control`.
const DEFAULT_KEY_TTL: Duration = Duration::from_secs(3600);

/// Minimum spacing between refreshes triggered by an unknown `kid`.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct FirebaseClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
}

struct CachedKeys {
    keys: JwkSet,
    fetched_at: Instant,
    expires_at: Instant,
}

impl CachedKeys {
    fn is_fresh(&self) -> bool {
        self.expires_at > Instant::now()
    }

    /// Key for `kid` if the set is still fresh and knows it.
    fn lookup(&self, kid: &str) -> Option<Result<DecodingKey, AuthError>> {
        if !self.is_fresh() {
            return None;
        }
        let jwk = self.keys.find(kid)?;
        Some(DecodingKey::from_jwk(jwk).map_err(|e| AuthError::InvalidToken(e.to_string())))
    }
}

pub struct FirebaseVerifier {
    client: reqwest::Client,
    project_id: String,
    jwks_url: String,
    min_refresh_interval: Duration,
    cache: RwLock<Option<CachedKeys>>,
}

impl FirebaseVerifier {
    pub fn new(client: reqwest::Client, project_id: String) -> Self {
        Self::with_jwks_url(client, project_id, GOOGLE_JWKS_URL.to_string())
    }

    pub fn with_jwks_url(client: reqwest::Client, project_id: String, jwks_url: String) -> Self {
        Self {
            client,
            project_id,
            jwks_url,
            min_refresh_interval: MIN_REFRESH_INTERVAL,
            cache: RwLock::new(None),
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[format!("https://securetoken.google.com/{}", self.project_id)]);
        validation.set_required_spec_claims(&["exp", "iat", "aud", "iss", "sub"]);
        validation
    }

    /// Decoding key for `kid`, refreshing the cached key set if it is stale
    /// or does not know the key.
    async fn key_for(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        if let Some(found) = self.cache.read().await.as_ref().and_then(|c| c.lookup(kid)) {
            return found;
        }

        let mut cache = self.cache.write().await;
        // Another request may have refreshed while this one waited.
        if let Some(cached) = cache.as_ref() {
            if let Some(found) = cached.lookup(kid) {
                return found;
            }
            if cached.is_fresh() && cached.fetched_at.elapsed() < self.min_refresh_interval {
                return Err(AuthError::InvalidToken(format!("unknown signing key {kid}")));
            }
        }

        let fresh = self.fetch_keys().await?;
        let key = fresh
            .keys
            .find(kid)
            .ok_or_else(|| AuthError::InvalidToken(format!("unknown signing key {kid}")))
            .and_then(|jwk| {
                DecodingKey::from_jwk(jwk).map_err(|e| AuthError::InvalidToken(e.to_string()))
            });
        *cache = Some(fresh);
        key
    }

    async fn fetch_keys(&self) -> Result<CachedKeys, AuthError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| AuthError::KeysUnavailable(e.to_string()))?;

        let ttl = response
            .headers()
            .get(reqwest::header::CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_max_age)
            .unwrap_or(DEFAULT_KEY_TTL);

        let keys: JwkSet = response
            .json()
            .await
            .map_err(|e| AuthError::KeysUnavailable(e.to_string()))?;

        tracing::debug!(keys = keys.keys.len(), ttl_secs = ttl.as_secs(), "Refreshed Firebase signing keys");

        let fetched_at = Instant::now();
        Ok(CachedKeys {
            keys,
            fetched_at,
            expires_at: fetched_at + ttl,
        })
    }
}

#[async_trait]
impl TokenVerifier for FirebaseVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedUser, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        if header.alg != Algorithm::RS256 {
            return Err(AuthError::InvalidToken(format!(
                "unexpected algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| AuthError::InvalidToken("missing kid".into()))?;

        let key = self.key_for(&kid).await?;
        let data = decode::<FirebaseClaims>(token, &key, &self.validation())
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        if data.claims.sub.is_empty() {
            return Err(AuthError::InvalidToken("empty subject".into()));
        }

        Ok(VerifiedUser {
            uid: data.claims.sub,
            email: data.claims.email,
        })
    }
}

/// Extract `max-age` from a `Cache-Control` header value.
pub fn parse_max_age(header: &str) -> Option<Duration> {
    header.split(',').find_map(|directive| {
        let (name, value) = directive.trim().split_once('=')?;
        if name.trim().eq_ignore_ascii_case("max-age") {
            value.trim().trim_matches('"').parse().ok().map(Duration::from_secs)
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{issue_token, JwtConfig};

    #[test]
    fn parses_max_age() {
        assert_eq!(
            parse_max_age("public, max-age=19845, must-revalidate, no-transform"),
            Some(Duration::from_secs(19845))
        );
        assert_eq!(parse_max_age("MAX-AGE=10"), Some(Duration::from_secs(10)));
    }

    #[test]
    fn missing_or_bad_max_age() {
        assert_eq!(parse_max_age("no-cache"), None);
        assert_eq!(parse_max_age("max-age=soon"), None);
        assert_eq!(parse_max_age(""), None);
    }

    fn verifier() -> FirebaseVerifier {
        // Unroutable key URL: these tests must fail before any fetch.
        FirebaseVerifier::with_jwks_url(
            reqwest::Client::new(),
            "demo-project".into(),
            "http://127.0.0.1:9/keys".into(),
        )
    }

    #[tokio::test]
    async fn rejects_hs256_tokens() {
        let config = JwtConfig {
            secret: "secret".into(),
            token_expiry_mins: 5,
        };
        let token = issue_token("user-1", None, &config).unwrap();
        let result = verifier().verify(&token).await;
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn rejects_malformed_tokens() {
        let result = verifier().verify("garbage").await;
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn validation_pins_audience_and_issuer() {
        let validation = verifier().validation();
        assert_eq!(validation.algorithms, vec![Algorithm::RS256]);
        assert!(validation.aud.as_ref().unwrap().contains("demo-project"));
        assert!(validation
            .iss
            .as_ref()
            .unwrap()
            .contains("https://securetoken.google.com/demo-project"));
    }

    // -- key set caching against a local JWKS endpoint --

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::http::header;
    use axum::routing::get;
    use base64::Engine;

    // RSA public key from RFC 7517 appendix A.1.
    const RSA_N: &str = "0vx7agoebGcQSuuPiLJXZptN9nndrQmbXEps2aiAFbWhM78LhWx4cbbfAAtVT86zwu1RK7aPFFxuhDR1L6tSoc_BJECPebWKRXjBZCiFV4n3oknjhMstn64tZ_2W-5JsGY4Hc5n9yBXArwl93lqt7_RN5w6Cf0h4QyQ5v-65YGjQR0_FDW2QvzqY368QQMicAtaSqzs8KJZgnYb9c7d0zgdAZHzu6qMQvRL5hajrn1n91CbOpbISD08qNLyrdkt-bFTWhAI4vMQFh6WeZu0fM4lFd2NcRwr3XPksINHaQ-G_xBniIqbw0Ls1jF44-csFCur-kEgU8awapJzKnqDKgw";

    /// Serve one RS256 key (`kid` "k1") and count requests.
    async fn spawn_jwks(cache_control: &'static str) -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let app = axum::Router::new().route(
            "/keys",
            get(move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    (
                        [(header::CACHE_CONTROL, cache_control)],
                        axum::Json(serde_json::json!({
                            "keys": [{
                                "kty": "RSA",
                                "kid": "k1",
                                "alg": "RS256",
                                "use": "sig",
                                "n": RSA_N,
                                "e": "AQAB"
                            }]
                        })),
                    )
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/keys"), hits)
    }

    /// An RS256-labelled token for `kid` with a bogus signature.
    fn token_with_kid(kid: &str) -> String {
        let b64 = |v: serde_json::Value| {
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(v.to_string())
        };
        format!(
            "{}.{}.c2lnbmF0dXJl",
            b64(serde_json::json!({ "alg": "RS256", "typ": "JWT", "kid": kid })),
            b64(serde_json::json!({ "sub": "user-1" })),
        )
    }

    fn verifier_for(url: String) -> FirebaseVerifier {
        FirebaseVerifier::with_jwks_url(reqwest::Client::new(), "demo-project".into(), url)
    }

    #[tokio::test]
    async fn unknown_kids_do_not_refetch_within_interval() {
        let (url, hits) = spawn_jwks("public, max-age=3600").await;
        let verifier = verifier_for(url);

        for i in 0..20 {
            let result = verifier.verify(&token_with_kid(&format!("forged-{i}"))).await;
            assert!(matches!(result, Err(AuthError::InvalidToken(_))), "{result:?}");
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn known_kid_is_served_from_cache() {
        let (url, hits) = spawn_jwks("public, max-age=3600").await;
        let verifier = verifier_for(url);

        for _ in 0..3 {
            // The key is found; the forged signature is what fails.
            let result = verifier.verify(&token_with_kid("k1")).await;
            assert!(matches!(result, Err(AuthError::InvalidToken(_))), "{result:?}");
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_kid_refetches_once_interval_has_passed() {
        let (url, hits) = spawn_jwks("public, max-age=3600").await;
        let mut verifier = verifier_for(url);
        verifier.min_refresh_interval = Duration::ZERO;

        verifier.verify(&token_with_kid("rotated-1")).await.unwrap_err();
        verifier.verify(&token_with_kid("rotated-2")).await.unwrap_err();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn expired_key_set_is_refreshed() {
        let (url, hits) = spawn_jwks("public, max-age=0").await;
        let verifier = verifier_for(url);

        verifier.verify(&token_with_kid("k1")).await.unwrap_err();
        verifier.verify(&token_with_kid("k1")).await.unwrap_err();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unreachable_key_endpoint_is_keys_unavailable() {
        let result = verifier().verify(&token_with_kid("k1")).await;
        assert!(matches!(result, Err(AuthError::KeysUnavailable(_))), "{result:?}");
    }
}
