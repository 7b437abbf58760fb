use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mediagen_core::quota::QuotaGate;
use mediagen_provider::GeminiGateway;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediagen_api::config::ServerConfig;
use mediagen_api::router::build_app_router;
use mediagen_api::state::AppState;
use mediagen_api::tracker::OperationTracker;

const DEFAULT_LOG_FILTER: &str = "mediagen_api=debug,mediagen_provider=info,tower_http=debug";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = config.port,
        daily_limit = config.ai_daily_rate_limit,
        provider_configured = config.provider_configured(),
        "Loaded server configuration"
    );
    if !config.provider_configured() {
        tracing::warn!("GOOGLE_API_KEY not set; generation endpoints will return 503");
    }

    // --- Shared services ---
    let http = mediagen_provider::http_client(config.provider.http_timeout);
    let gateway = Arc::new(GeminiGateway::with_client(http.clone(), config.provider.clone()));
    let quota = Arc::new(QuotaGate::new(config.ai_daily_rate_limit));
    let tracker = Arc::new(OperationTracker::new(
        Duration::from_secs(config.operation_retention_secs),
        Duration::from_secs(config.operation_max_age_secs),
    ));

    // --- Background retention ---
    let cancel = CancellationToken::new();
    let retention_handle = tokio::spawn(mediagen_api::background::retention::run(
        Arc::clone(&tracker),
        Arc::clone(&quota),
        cancel.clone(),
    ));

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        verifier: config.auth.build_verifier(http),
        quota,
        tracker,
        video: gateway.clone(),
        music: gateway,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), retention_handle).await;
    tracing::info!("Retention job stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
