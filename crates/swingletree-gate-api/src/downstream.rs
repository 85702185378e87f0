//! JSON client for the services the gate forwards to.
//!
//! Plugins and the installation service share one delivery contract: a JSON
//! request, a single attempt, any 2xx status is success, and failures come
//! back as an [`ErrorMessage`] body. There is no retry; the caller gets the
//! outcome of the first attempt.

use reqwest::Method;
use serde::Serialize;
use std::time::Instant;
use swingletree_gate_core::{ErrorEntry, ErrorMessage};
use tracing::{debug, error, instrument};

/// Title of the entries describing a failed report delivery
pub const REPORT_PROCESSING_TITLE: &str = "Failed processing report";

/// User agent sent with every downstream request
pub const USER_AGENT: &str = concat!("swingletree-gate/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client shared by all downstream clients.
pub fn build_http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().user_agent(USER_AGENT).build()
}

/// Failure to deliver a request downstream.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// No base URL was configured for the target
    #[error("no base URL configured for {target}")]
    MissingBaseUrl { target: String },

    /// Network, DNS, TLS or encoding failure
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The target answered with a non-2xx status
    #[error("{url} responded with status {status}")]
    Rejected {
        url: String,
        status: u16,
        errors: Vec<ErrorEntry>,
    },
}

impl DispatchError {
    /// Error entries to relay to the caller.
    ///
    /// A rejection yields the downstream's own entries unchanged (possibly
    /// none, when the body was not an error message). Every other failure is
    /// wrapped in a single entry.
    pub fn into_entries(self) -> Vec<ErrorEntry> {
        match self {
            Self::Rejected { errors, .. } => errors,
            other => vec![ErrorEntry::new(REPORT_PROCESSING_TITLE, other.to_string())],
        }
    }
}

/// JSON client bound to one downstream base URL.
#[derive(Debug, Clone)]
pub struct DownstreamClient {
    http: reqwest::Client,
    base_url: Option<String>,
    target: String,
}

impl DownstreamClient {
    /// Create a client for `target`, a human readable name used in errors.
    ///
    /// A missing base URL is accepted here and reported on every send.
    pub fn new(http: reqwest::Client, base_url: Option<String>, target: impl Into<String>) -> Self {
        Self {
            http,
            base_url,
            target: target.into(),
        }
    }

    /// Absolute URL of `path` below the base URL.
    pub fn url(&self, path: &str) -> Option<String> {
        self.base_url
            .as_deref()
            .map(|base| format!("{}{}", base.trim_end_matches('/'), path))
    }

    /// Send `body` as JSON with a single attempt.
    #[instrument(skip(self, body), fields(target = %self.target))]
    pub async fn send_json<T>(&self, method: Method, path: &str, body: &T) -> Result<(), DispatchError>
    where
        T: Serialize + ?Sized,
    {
        let url = self.url(path).ok_or_else(|| DispatchError::MissingBaseUrl {
            target: self.target.clone(),
        })?;

        let start = Instant::now();
        let response = self
            .http
            .request(method, &url)
            .json(body)
            .send()
            .await
            .map_err(|source| {
                error!(url = %url, error = %source, "Encountered an error while sending data downstream");
                DispatchError::Transport {
                    url: url.clone(),
                    source,
                }
            })?;

        let status = response.status();
        debug!(
            url = %url,
            status = %status,
            duration_ms = %start.elapsed().as_millis(),
            "Downstream responded"
        );

        if status.is_success() {
            return Ok(());
        }

        let errors = match response.bytes().await {
            Ok(body) => serde_json::from_slice::<ErrorMessage>(&body)
                .map(|message| message.errors)
                .unwrap_or_else(|e| {
                    debug!(url = %url, error = %e, "Downstream error body is not an error message");
                    Vec::new()
                }),
            Err(e) => {
                debug!(url = %url, error = %e, "Failed to read downstream error body");
                Vec::new()
            }
        };

        error!(
            url = %url,
            status = %status,
            error_count = errors.len(),
            "Downstream rejected request"
        );

        Err(DispatchError::Rejected {
            url,
            status: status.as_u16(),
            errors,
        })
    }
}

#[cfg(test)]
#[path = "downstream_tests.rs"]
mod tests;
