#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use mediagen_api::auth::jwt::{issue_token, JwtConfig, JwtVerifier};
use mediagen_api::auth::AuthConfig;
use mediagen_api::config::ServerConfig;
use mediagen_api::router::build_app_router;
use mediagen_api::state::AppState;
use mediagen_api::tracker::OperationTracker;
use mediagen_core::music::{MusicGenerationRequest, BYTES_PER_SECOND};
use mediagen_core::quota::QuotaGate;
use mediagen_core::video::VideoJob;
use mediagen_provider::{GeminiSettings, MusicGateway, ProviderError, VideoGateway, VideoPoll};

pub const JWT_SECRET: &str = "integration-test-secret-long-enough";

/* --------------------------------------------------------------------------
Fake gateways
-------------------------------------------------------------------------- */

/// Video gateway that records submissions and answers polls from a script.
/// Once the script is exhausted every poll is `Pending`.
#[derive(Default)]
pub struct FakeVideoGateway {
    pub submitted: Mutex<Vec<VideoJob>>,
    pub polls: Mutex<VecDeque<Result<VideoPoll, ProviderError>>>,
    pub poll_count: AtomicUsize,
    pub submit_error: Mutex<Option<ProviderError>>,
}

impl FakeVideoGateway {
    pub fn script(&self, poll: Result<VideoPoll, ProviderError>) {
        self.polls.lock().unwrap().push_back(poll);
    }

    pub fn fail_submit(&self, err: ProviderError) {
        *self.submit_error.lock().unwrap() = Some(err);
    }

    pub fn submissions(&self) -> usize {
        self.submitted.lock().unwrap().len()
    }

    pub fn last_job(&self) -> VideoJob {
        self.submitted.lock().unwrap().last().cloned().expect("no job submitted")
    }
}

#[async_trait]
impl VideoGateway for FakeVideoGateway {
    async fn submit(&self, job: &VideoJob) -> Result<String, ProviderError> {
        if let Some(err) = self.submit_error.lock().unwrap().take() {
            return Err(err);
        }
        let mut submitted = self.submitted.lock().unwrap();
        submitted.push(job.clone());
        Ok(format!("models/veo/operations/{}", submitted.len()))
    }

    async fn poll(&self, _operation_name: &str) -> Result<VideoPoll, ProviderError> {
        self.poll_count.fetch_add(1, Ordering::SeqCst);
        self.polls
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(VideoPoll::Pending))
    }
}

/// Music gateway that returns silence of exactly the requested length.
#[derive(Default)]
pub struct FakeMusicGateway {
    pub requests: Mutex<Vec<MusicGenerationRequest>>,
    pub error: Mutex<Option<ProviderError>>,
    pub delay: Mutex<Option<Duration>>,
}

impl FakeMusicGateway {
    /// Make every generation take `delay` before answering.
    pub fn stall_for(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn fail_with(&self, err: ProviderError) {
        *self.error.lock().unwrap() = Some(err);
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> MusicGenerationRequest {
        self.requests.lock().unwrap().last().cloned().expect("no music request")
    }
}

#[async_trait]
impl MusicGateway for FakeMusicGateway {
    async fn generate(&self, request: &MusicGenerationRequest) -> Result<Vec<u8>, ProviderError> {
        self.requests.lock().unwrap().push(request.clone());
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.error.lock().unwrap().take() {
            return Err(err);
        }
        Ok(vec![0u8; request.duration_seconds as usize * BYTES_PER_SECOND])
    }
}

/* --------------------------------------------------------------------------
App construction
-------------------------------------------------------------------------- */

fn jwt_config() -> JwtConfig {
    JwtConfig {
        secret: JWT_SECRET.to_string(),
        token_expiry_mins: 15,
    }
}

/// Build a test `ServerConfig` with safe defaults and HS256 auth.
pub fn test_config(daily_limit: u32) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 180,
        ai_daily_rate_limit: daily_limit,
        operation_retention_secs: 3600,
        operation_max_age_secs: 86400,
        max_image_bytes: 1024 * 1024,
        provider: GeminiSettings {
            api_key: Some("test-key".to_string()),
            base_url: "http://127.0.0.1:9".to_string(),
            video_model: "veo-3.1-generate-preview".to_string(),
            music_model: "models/lyria-realtime-exp".to_string(),
            music_ws_url: "ws://127.0.0.1:9".to_string(),
            inline_video: true,
            music_capture_grace: Duration::from_secs(30),
            http_timeout: Duration::from_secs(60),
        },
        auth: AuthConfig {
            firebase_project_id: None,
            jwt: Some(jwt_config()),
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub video: Arc<FakeVideoGateway>,
    pub music: Arc<FakeMusicGateway>,
}

pub fn build_test_app() -> TestApp {
    build_test_app_with(test_config(50))
}

/// Build the full application router (same middleware stack as `main.rs`)
/// around fake gateways.
pub fn build_test_app_with(config: ServerConfig) -> TestApp {
    let video = Arc::new(FakeVideoGateway::default());
    let music = Arc::new(FakeMusicGateway::default());

    let state = AppState {
        config: Arc::new(config.clone()),
        verifier: Arc::new(JwtVerifier::new(jwt_config())),
        quota: Arc::new(QuotaGate::new(config.ai_daily_rate_limit)),
        tracker: Arc::new(OperationTracker::new(
            Duration::from_secs(config.operation_retention_secs),
            Duration::from_secs(config.operation_max_age_secs),
        )),
        video: video.clone(),
        music: music.clone(),
    };

    TestApp {
        router: build_app_router(state.clone(), &config),
        state,
        video,
        music,
    }
}

/// A valid bearer token for `user_id`.
pub fn token(user_id: &str) -> String {
    issue_token(user_id, None, &jwt_config()).unwrap()
}

/* --------------------------------------------------------------------------
Request helpers
-------------------------------------------------------------------------- */

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_auth(app: &Router, uri: &str, user_id: &str) -> Response {
    let request = Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token(user_id)))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: &Router, uri: &str, user_id: &str, body: serde_json::Value) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token(user_id)))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_empty(app: &Router, uri: &str, user_id: &str) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token(user_id)))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

const BOUNDARY: &str = "mediagen-test-boundary";

/// One part of a multipart form.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                );
            }
            Part::File {
                name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"upload\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn post_multipart(app: &Router, uri: &str, user_id: &str, parts: &[Part<'_>]) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token(user_id)))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/* --------------------------------------------------------------------------
Sample images (magic bytes are all the upload check looks at)
-------------------------------------------------------------------------- */

pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01\x08\x02\0\0\0";
pub const JPEG_BYTES: &[u8] = b"\xFF\xD8\xFF\xE0\0\x10JFIF\0\x01\x01\0\0\x01\0\x01\0\0";
