//! Common test utilities for swingletree-gate-api integration tests
//!
//! This module provides:
//! - Gate construction from a JSON settings document
//! - Request builders for report and webhook deliveries
//! - Response decoding helpers

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use swingletree_gate_api::{create_router, AppState, GateSettings, InstallationClient, PluginRegistry};
use tower::ServiceExt;

#[allow(dead_code)]
pub const API_TOKEN: &str = "gate-token";

#[allow(dead_code)]
pub const WEBHOOK_SECRET: &str = "webhook-secret";

/// Build a gate router the way the service binary does.
pub fn gate(settings: serde_json::Value) -> axum::Router {
    let settings: GateSettings =
        serde_json::from_value(settings).expect("test settings should deserialize");
    let http = reqwest::Client::new();
    let plugins = PluginRegistry::from_entries(&settings.gate.plugins, &http);
    let installations = Arc::new(InstallationClient::new(
        http,
        settings.urls.scotty().map(str::to_string),
    ));

    create_router(AppState::new(settings, plugins, installations))
}

/// `Authorization` header value for Basic credentials.
#[allow(dead_code)]
pub fn basic_auth(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

/// GitHub style `sha256=<hex>` signature of `payload`.
#[allow(dead_code)]
pub fn github_signature(secret: &str, payload: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(payload.as_bytes());
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

/// POST a JSON report, optionally with credentials.
#[allow(dead_code)]
pub async fn post_report(
    app: axum::Router,
    uri: &str,
    authorization: Option<String>,
    body: &str,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(value) = authorization {
        builder = builder.header("authorization", value);
    }

    app.oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
}

/// Decode a response into its status and JSON body.
pub async fn json_response(response: Response<Body>) -> (StatusCode, serde_json::Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}
