use std::sync::Arc;

use mediagen_core::quota::QuotaGate;
use mediagen_provider::{MusicGateway, VideoGateway};

use crate::auth::TokenVerifier;
use crate::config::ServerConfig;
use crate::tracker::OperationTracker;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Verifies bearer tokens for [`AuthUser`](crate::middleware::auth::AuthUser).
    pub verifier: Arc<dyn TokenVerifier>,
    /// Per-user daily generation quota.
    pub quota: Arc<QuotaGate>,
    /// In-flight and recently finished video operations.
    pub tracker: Arc<OperationTracker>,
    pub video: Arc<dyn VideoGateway>,
    pub music: Arc<dyn MusicGateway>,
}
