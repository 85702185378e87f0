//! Payload forwarded from the gate to a plugin.

use crate::metadata::{WebhookMetadata, HEADER_PREFIX, LEGACY_HEADER_PREFIX};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

const CONTENT_TYPE: &str = "content-type";

/// Body of `POST <plugin>/report`.
///
/// ```json
/// { "headers": { "swingletree-org": "acme" }, "body": { ... }, "metadata": null }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwardEnvelope {
    /// Selected inbound headers, see [`collect_forward_headers`]
    pub headers: BTreeMap<String, String>,

    /// The report exactly as received
    pub body: serde_json::Value,

    /// `null` when the request carried incomplete metadata
    pub metadata: Option<WebhookMetadata>,
}

impl ForwardEnvelope {
    pub fn new(
        headers: BTreeMap<String, String>,
        body: serde_json::Value,
        metadata: Option<WebhookMetadata>,
    ) -> Self {
        Self {
            headers,
            body,
            metadata,
        }
    }
}

/// Select the inbound headers a plugin gets to see.
///
/// Keeps every `swingletree-*` and `x-swingletree-*` header (prefix matched
/// case-insensitively) plus `content-type`. Names and values are copied as
/// given.
pub fn collect_forward_headers(headers: &HashMap<String, String>) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter(|(name, _)| is_forwarded_header(name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

fn is_forwarded_header(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.starts_with(HEADER_PREFIX)
        || lower.starts_with(LEGACY_HEADER_PREFIX)
        || lower == CONTENT_TYPE
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
