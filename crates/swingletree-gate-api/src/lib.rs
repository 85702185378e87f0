//! # Swingletree Gate HTTP Service
//!
//! HTTP server relaying CI/build reports to Swingletree plugins and GitHub App
//! installation changes to the installation service.
//!
//! This service provides:
//! - `POST /report/{plugin_id}`: report relay with per-plugin authentication
//! - `POST /installation`: GitHub webhook receiver
//! - `GET /health`: liveness check

// Public modules
pub mod auth;
pub mod config;
pub mod downstream;
pub mod errors;
pub mod github_signature;
pub mod installation;
pub mod plugin_registry;
pub mod report;

pub use auth::{AccessDecision, BasicCredentials, ReportAuthenticator};
pub use config::{GateSettings, PluginEntries};
pub use downstream::{build_http_client, DispatchError, DownstreamClient};
pub use errors::{ConfigError, GateError, ServiceError};
pub use github_signature::{GithubSignatureVerifier, SignatureError};
pub use installation::{InstallationClient, InstallationNotifier};
pub use plugin_registry::{PluginClient, PluginRegistry, RegisteredPlugin};

use axum::{
    extract::{DefaultBodyLimit, State},
    http::HeaderValue,
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::{any::Any, sync::Arc};
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{error, info, instrument, warn};

// ============================================================================
// Application State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration for the service
    pub settings: Arc<GateSettings>,

    /// Enabled plugins, read-only after startup
    pub plugins: Arc<PluginRegistry>,

    /// Receiver of GitHub App installation changes
    pub installations: Arc<dyn InstallationNotifier>,

    /// Present when a GitHub webhook secret is configured
    pub github_verifier: Option<Arc<GithubSignatureVerifier>>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        settings: GateSettings,
        plugins: PluginRegistry,
        installations: Arc<dyn InstallationNotifier>,
    ) -> Self {
        let github_verifier = settings
            .gate
            .github
            .secret()
            .map(|secret| Arc::new(GithubSignatureVerifier::new(secret)));

        Self {
            settings: Arc::new(settings),
            plugins: Arc::new(plugins),
            installations,
            github_verifier,
        }
    }
}

// ============================================================================
// HTTP Server
// ============================================================================

/// Create HTTP router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let mut report_routes = Router::new().route("/report/{plugin_id}", post(report::handle_report));

    match ReportAuthenticator::from_secret(state.settings.gate.api.token(), state.plugins.clone()) {
        Some(authenticator) => {
            report_routes = report_routes.route_layer(middleware::from_fn_with_state(
                Arc::new(authenticator),
                auth::authenticate_report,
            ));
        }
        None => {
            warn!("No API token configured, report endpoints accept unauthenticated requests");
        }
    }

    let webhook_routes = Router::new().route(
        "/installation",
        post(installation::handle_installation_webhook),
    );

    let health_routes = Router::new().route("/health", get(handle_health_check));

    let max_body_size = state.settings.gate.max_body_size;

    Router::new()
        .merge(report_routes)
        .merge(webhook_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(request_logging_middleware))
                .layer(CatchPanicLayer::custom(handle_panic))
                .layer(DefaultBodyLimit::max(max_body_size))
                .into_inner(),
        )
        .with_state(state)
}

/// Start HTTP server
pub async fn start_server(state: AppState) -> Result<(), ServiceError> {
    let host = state.settings.gate.host.clone();
    let port = state.settings.gate.port;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .map_err(|source| ServiceError::BindFailed {
            address: format!("{host}:{port}"),
            source,
        })?;

    let local_addr = listener
        .local_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| format!("{host}:{port}"));
    info!("Starting HTTP server on {}", local_addr);

    // In-flight requests complete before the server returns
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServiceError::ServerFailed)?;

    info!("HTTP server shutdown complete");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}

// ============================================================================
// Health Check
// ============================================================================

/// Basic health check endpoint
#[instrument(skip(state))]
async fn handle_health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        plugins: state.plugins.len(),
    })
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,

    /// Number of enabled plugins
    pub plugins: usize,
}

// ============================================================================
// Middleware
// ============================================================================

/// Header carrying the request correlation id
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Logs each request once on completion, tagged with a correlation id.
///
/// The id is taken from `x-correlation-id` when the caller sends one and is
/// echoed on the response.
#[instrument(name = "request", skip_all, fields(
    method = %request.method(),
    uri = %request.uri(),
    correlation_id = tracing::field::Empty,
    status = tracing::field::Empty,
    duration_ms = tracing::field::Empty,
))]
async fn request_logging_middleware(
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let start = std::time::Instant::now();
    let span = tracing::Span::current();

    let correlation_id = request
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    span.record("correlation_id", correlation_id.as_str());

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }

    let status = response.status();
    span.record("status", status.as_u16());
    span.record("duration_ms", start.elapsed().as_millis() as u64);

    match status {
        s if s.is_server_error() => error!("Request failed"),
        s if s.is_client_error() => warn!("Request rejected"),
        _ => info!("Request completed"),
    }

    response
}

/// Turn a handler panic into a 500 error message.
fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };

    GateError::InternalError {
        message: format!("request handler panicked: {detail}"),
    }
    .into_response()
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
