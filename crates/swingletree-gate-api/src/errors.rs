//! Error types for the HTTP service

use crate::downstream::REPORT_PROCESSING_TITLE;
use crate::github_signature::SignatureError;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use swingletree_gate_core::{ErrorEntry, ErrorMessage, ValidationError};
use tracing::{error, warn};

/// Gate handler errors with HTTP status code mapping
///
/// Every variant renders as an [`ErrorMessage`] body:
///
/// - `400 Bad Request`: malformed report, missing GitHub event header,
///   signature mismatch, malformed installation payload
/// - `401 Unauthorized`: missing or wrong shared secret on a protected plugin
/// - `404 Not Found`: plugin unknown or disabled (indistinguishable)
/// - `422 Unprocessable Entity`: the plugin did not accept the report
/// - `500 Internal Server Error`: unexpected failure, details only in the log
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// Plugin is not registered. Disabled plugins are never registered, so
    /// this also covers them.
    #[error("Plugin not found: {plugin_id}")]
    PluginNotFound { plugin_id: String },

    /// The response does not tell the caller why authentication failed.
    #[error("Unauthorized")]
    Unauthorized,

    /// Report body is not valid JSON
    #[error("Malformed report: {message}")]
    MalformedReport { message: String },

    /// Plugin rejected the report or could not be reached
    ///
    /// `errors` holds the entries relayed from the plugin, or a single entry
    /// wrapping the transport failure.
    #[error("Failed processing report for plugin {plugin_id}")]
    ReportProcessing {
        plugin_id: String,
        errors: Vec<ErrorEntry>,
    },

    #[error("Missing X-GitHub-Event header")]
    MissingEventHeader,

    #[error("Invalid webhook signature: {0}")]
    InvalidSignature(#[from] SignatureError),

    #[error("Malformed webhook payload: {0}")]
    MalformedPayload(#[from] ValidationError),

    #[error("Internal server error: {message}")]
    InternalError { message: String },
}

impl GateError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::PluginNotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::MalformedReport { .. }
            | Self::MissingEventHeader
            | Self::InvalidSignature(_)
            | Self::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            Self::ReportProcessing { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Body sent to the caller.
    pub fn to_message(&self) -> ErrorMessage {
        match self {
            Self::PluginNotFound { plugin_id } => ErrorMessage::single(ErrorEntry::new(
                "Plugin not found",
                format!("could not find plugin with id {plugin_id} in registry"),
            )),
            Self::Unauthorized => ErrorMessage::single(ErrorEntry::new("Unauthorized", "")),
            Self::MalformedReport { message } => {
                ErrorMessage::single(ErrorEntry::new("Malformed report", message.clone()))
            }
            Self::ReportProcessing { errors, .. } => ErrorMessage::new()
                .push(ErrorEntry::new(
                    REPORT_PROCESSING_TITLE,
                    "failed to process report",
                ))
                .extend(errors.iter().cloned()),
            Self::MissingEventHeader => ErrorMessage::single(ErrorEntry::new(
                "Bad request",
                "missing X-GitHub-Event header",
            )),
            Self::InvalidSignature(e) => {
                ErrorMessage::single(ErrorEntry::new("Invalid signature", e.to_string()))
            }
            Self::MalformedPayload(e) => {
                ErrorMessage::single(ErrorEntry::new("Malformed payload", e.to_string()))
            }
            Self::InternalError { .. } => ErrorMessage::single(ErrorEntry::new(
                "Internal error",
                "Internal server error occurred. Please try again later.",
            )),
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            Self::InternalError { message } => {
                // Log detailed error server-side but return generic message to client
                error!(error = %message, "Internal server error occurred");
            }
            Self::ReportProcessing { plugin_id, errors } => {
                warn!(
                    plugin_id = %plugin_id,
                    error_count = errors.len(),
                    "Plugin failed processing report"
                );
            }
            other => {
                warn!(status = %status, error = %other, "Request rejected");
            }
        }

        let mut response = (status, Json(self.to_message())).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Basic realm=\"swingletree\""),
            );
        }

        response
    }
}

/// Errors that stop the gate process
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("cannot listen on {address}")]
    BindFailed {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP server stopped unexpectedly")]
    ServerFailed(#[source] std::io::Error),

    #[error(transparent)]
    Configuration(#[from] ConfigError),
}

impl ServiceError {
    /// Process exit code: 1 bind, 2 serve, 3 configuration.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::BindFailed { .. } => 1,
            Self::ServerFailed(_) => 2,
            Self::Configuration(_) => 3,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration loading failed: {message}")]
    Load { message: String },

    /// The TLS backend of the outbound client could not be initialised
    #[error("Failed to build HTTP client: {message}")]
    HttpClient { message: String },
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
