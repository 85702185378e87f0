//! GitHub App installation webhooks.
//!
//! `POST /installation` receives GitHub deliveries. `installation` events
//! with action `created` or `deleted` are forwarded to the installation
//! service; everything else is acknowledged and dropped. Forwarding runs in
//! the background so GitHub always gets its answer immediately, and a failed
//! forward is only logged.

use crate::downstream::{DispatchError, DownstreamClient};
use crate::errors::GateError;
use crate::AppState;
use async_trait::async_trait;
use axum::{extract::State, http::HeaderMap, response::Json};
use bytes::Bytes;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use swingletree_gate_core::installation::INSTALLATION_EVENT;
use swingletree_gate_core::{InstallationAction, InstallationEvent, InstallationReference};
use tracing::{debug, error, info, instrument, Instrument};

/// Header carrying the GitHub event name
pub const EVENT_HEADER: &str = "x-github-event";

/// Header carrying the GitHub delivery id
pub const DELIVERY_HEADER: &str = "x-github-delivery";

/// Path below the installation service base URL
pub const INSTALLATION_PATH: &str = "/installation";

// ============================================================================
// InstallationNotifier
// ============================================================================

/// Receiver of installation changes.
#[async_trait]
pub trait InstallationNotifier: Send + Sync {
    /// Record a new installation of the app.
    async fn add_installation(&self, reference: &InstallationReference) -> Result<(), DispatchError>;

    /// Forget an installation of the app.
    async fn remove_installation(
        &self,
        reference: &InstallationReference,
    ) -> Result<(), DispatchError>;
}

/// [`InstallationNotifier`] backed by the installation service over HTTP.
#[derive(Debug, Clone)]
pub struct InstallationClient {
    downstream: DownstreamClient,
}

impl InstallationClient {
    pub fn new(http: reqwest::Client, base_url: Option<String>) -> Self {
        Self {
            downstream: DownstreamClient::new(http, base_url, "installation service"),
        }
    }
}

#[async_trait]
impl InstallationNotifier for InstallationClient {
    async fn add_installation(&self, reference: &InstallationReference) -> Result<(), DispatchError> {
        self.downstream
            .send_json(Method::POST, INSTALLATION_PATH, reference)
            .await
    }

    async fn remove_installation(
        &self,
        reference: &InstallationReference,
    ) -> Result<(), DispatchError> {
        self.downstream
            .send_json(Method::DELETE, INSTALLATION_PATH, reference)
            .await
    }
}

// ============================================================================
// Handler
// ============================================================================

/// Acknowledgement returned to GitHub
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookAck {
    pub ok: bool,
}

/// Handle a GitHub webhook delivery.
#[instrument(skip(state, headers, body), fields(event, delivery))]
pub async fn handle_installation_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, GateError> {
    if let Some(verifier) = &state.github_verifier {
        verifier.verify(&body, &headers)?;
    }

    let event_type = headers
        .get(EVENT_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(GateError::MissingEventHeader)?;

    let span = tracing::Span::current();
    span.record("event", event_type);
    if let Some(delivery) = headers.get(DELIVERY_HEADER).and_then(|v| v.to_str().ok()) {
        span.record("delivery", delivery);
    }

    if event_type != INSTALLATION_EVENT {
        debug!(event = %event_type, "Ignoring GitHub event");
        return Ok(Json(WebhookAck { ok: true }));
    }

    let event = InstallationEvent::from_slice(&body)?;
    let action = event.action();

    match &action {
        InstallationAction::Created | InstallationAction::Deleted => {
            spawn_notification(state.installations.clone(), action, event.reference());
        }
        InstallationAction::Other(other) => {
            debug!(action = %other, "Ignoring installation action");
        }
    }

    Ok(Json(WebhookAck { ok: true }))
}

/// Forward an installation change on a background task.
fn spawn_notification(
    notifier: Arc<dyn InstallationNotifier>,
    action: InstallationAction,
    reference: InstallationReference,
) {
    let task = async move {
        let result = match action {
            InstallationAction::Created => notifier.add_installation(&reference).await,
            InstallationAction::Deleted => notifier.remove_installation(&reference).await,
            InstallationAction::Other(_) => return,
        };

        match result {
            Ok(()) => info!(
                account = %reference.account,
                installation_id = reference.installation_id,
                "Forwarded installation change"
            ),
            Err(e) => error!(
                account = %reference.account,
                installation_id = reference.installation_id,
                error = %e,
                "Failed to forward installation change"
            ),
        }
    };

    tokio::spawn(task.in_current_span());
}

#[cfg(test)]
#[path = "installation_tests.rs"]
mod tests;
