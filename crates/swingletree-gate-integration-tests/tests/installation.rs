//! Integration tests for GitHub installation webhooks
//!
//! These tests verify that installation changes reach the installation
//! service and that unsigned or mis-signed deliveries are rejected.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{gate, github_signature, json_response, WEBHOOK_SECRET};
use serde_json::json;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn installation_payload(action: &str) -> String {
    json!({
        "action": action,
        "installation": { "id": 1001, "account": { "login": "acme", "id": 55 } }
    })
    .to_string()
}

fn webhook_request(event: &str, signature: Option<String>, payload: String) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/installation")
        .header("content-type", "application/json")
        .header("x-github-event", event);
    if let Some(signature) = signature {
        builder = builder.header("x-hub-signature-256", signature);
    }
    builder.body(Body::from(payload)).unwrap()
}

fn gate_for(scotty: &MockServer) -> axum::Router {
    gate(json!({
        "gate": { "github": { "secret": WEBHOOK_SECRET } },
        "urls": { "scotty": scotty.uri() }
    }))
}

/// Wait until the installation service received `count` requests.
async fn wait_for_requests(server: &MockServer, count: usize) -> usize {
    for _ in 0..100 {
        let received = server.received_requests().await.unwrap_or_default().len();
        if received >= count {
            return received;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    server.received_requests().await.unwrap_or_default().len()
}

/// Verify that a created installation is posted to the installation service
#[tokio::test]
async fn test_created_installation_is_posted() {
    // Arrange
    let scotty = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/installation"))
        .and(body_json(json!({
            "account": "acme",
            "accountId": 55,
            "installationId": 1001
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&scotty)
        .await;

    let payload = installation_payload("created");
    let signature = github_signature(WEBHOOK_SECRET, &payload);

    // Act
    let response = gate_for(&scotty)
        .oneshot(webhook_request("installation", Some(signature), payload))
        .await
        .unwrap();

    // Assert
    let (status, body) = json_response(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));
    assert_eq!(wait_for_requests(&scotty, 1).await, 1);
}

/// Verify that a deleted installation is sent as DELETE
#[tokio::test]
async fn test_deleted_installation_is_deleted() {
    // Arrange
    let scotty = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/installation"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&scotty)
        .await;

    let payload = installation_payload("deleted");
    let signature = github_signature(WEBHOOK_SECRET, &payload);

    // Act
    let response = gate_for(&scotty)
        .oneshot(webhook_request("installation", Some(signature), payload))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(wait_for_requests(&scotty, 1).await, 1);
}

/// Verify that a failing installation service does not fail the delivery
#[tokio::test]
async fn test_installation_service_failure_is_not_reported_to_github() {
    // Arrange
    let scotty = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&scotty)
        .await;

    let payload = installation_payload("created");
    let signature = github_signature(WEBHOOK_SECRET, &payload);

    // Act
    let response = gate_for(&scotty)
        .oneshot(webhook_request("installation", Some(signature), payload))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(wait_for_requests(&scotty, 1).await, 1);
}

/// Verify that a bad signature is rejected and nothing is forwarded
#[tokio::test]
async fn test_bad_signature_is_rejected() {
    // Arrange
    let scotty = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&scotty)
        .await;

    let payload = installation_payload("created");
    let signature = github_signature("wrong-secret", &payload);

    // Act
    let response = gate_for(&scotty)
        .oneshot(webhook_request("installation", Some(signature), payload))
        .await
        .unwrap();

    // Assert
    let (status, body) = json_response(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["title"], "Invalid signature");
    tokio::time::sleep(Duration::from_millis(50)).await;
}

/// Verify that events other than installation are acknowledged and dropped
#[tokio::test]
async fn test_other_events_are_ignored() {
    // Arrange
    let scotty = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&scotty)
        .await;

    let payload = json!({ "zen": "Keep it logically awesome." }).to_string();
    let signature = github_signature(WEBHOOK_SECRET, &payload);

    // Act
    let response = gate_for(&scotty)
        .oneshot(webhook_request("ping", Some(signature), payload))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
}
