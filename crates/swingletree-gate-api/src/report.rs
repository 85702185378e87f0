//! Report relay handler.
//!
//! `POST /report/{plugin_id}` wraps the inbound report into a
//! [`ForwardEnvelope`] and delivers it to the plugin's `/report` endpoint.
//! The plugin's verdict is translated for the caller:
//!
//! - plugin answered 2xx: `202 Accepted` with `{}`
//! - plugin rejected or unreachable: `422` with the relayed error entries

use crate::errors::GateError;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use bytes::Bytes;
use std::collections::HashMap;
use swingletree_gate_core::{collect_forward_headers, EmptyMessage, ForwardEnvelope, WebhookMetadata};
use tracing::{debug, info, instrument, warn};

/// Relay a report to its plugin.
#[instrument(skip(state, query, headers, body), fields(body_len = body.len()))]
pub async fn handle_report(
    State(state): State<AppState>,
    Path(plugin_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<EmptyMessage>), GateError> {
    let plugin = state
        .plugins
        .get(&plugin_id)
        .ok_or_else(|| GateError::PluginNotFound {
            plugin_id: plugin_id.clone(),
        })?;

    let report = parse_report(&body)?;
    let headers = header_map_to_strings(&headers);

    let metadata = WebhookMetadata::extract(&query, &headers);
    match &metadata {
        Some(metadata) => debug!(
            plugin_id = %plugin_id,
            owner = %metadata.source.owner,
            repo = %metadata.source.repo,
            sha = %metadata.source.sha,
            "Extracted webhook metadata"
        ),
        None => warn!(
            plugin_id = %plugin_id,
            "Report carries incomplete metadata, forwarding without it"
        ),
    }

    let envelope = ForwardEnvelope::new(collect_forward_headers(&headers), report, metadata);

    match plugin.client.send_report(&envelope).await {
        Ok(()) => {
            info!(plugin_id = %plugin_id, "Report accepted by plugin");
            Ok((StatusCode::ACCEPTED, Json(EmptyMessage {})))
        }
        Err(e) => Err(GateError::ReportProcessing {
            plugin_id,
            errors: e.into_entries(),
        }),
    }
}

/// Parse the report body, treating an empty body as `null`.
fn parse_report(body: &[u8]) -> Result<serde_json::Value, GateError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::Value::Null);
    }

    serde_json::from_slice(body).map_err(|e| GateError::MalformedReport {
        message: e.to_string(),
    })
}

/// Flatten request headers into lower-case names and string values.
///
/// Values that are not valid UTF-8 are skipped. Repeated headers keep the
/// last value.
pub fn header_map_to_strings(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
        })
        .collect()
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
