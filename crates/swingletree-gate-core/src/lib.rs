//! # Swingletree Gate Core
//!
//! Domain types for the Swingletree gate, the relay that receives CI/build
//! reports and GitHub installation webhooks and forwards them to downstream
//! plugin services.
//!
//! This crate holds everything that does not depend on an HTTP framework:
//!
//! - [`plugin`]: plugin identifiers, raw plugin settings and the loose boolean
//!   coercion applied to them
//! - [`metadata`]: source-control coordinates attached to a report and the
//!   query/header extraction rules
//! - [`envelope`]: the payload forwarded to a plugin
//! - [`message`]: the `{title, detail}` error list used on every failure path
//! - [`installation`]: the GitHub installation event subset forwarded to the
//!   installation service
//!
//! ## Usage
//!
//! ```rust
//! use std::collections::HashMap;
//! use swingletree_gate_core::WebhookMetadata;
//!
//! let query: HashMap<String, String> = [("org", "acme"), ("repo", "gate"), ("sha", "abc")]
//!     .into_iter()
//!     .map(|(k, v)| (k.to_string(), v.to_string()))
//!     .collect();
//!
//! let metadata = WebhookMetadata::extract(&query, &HashMap::new()).unwrap();
//! assert_eq!(metadata.source.owner, "acme");
//! ```

pub mod envelope;
pub mod installation;
pub mod message;
pub mod metadata;
pub mod plugin;

pub use envelope::{collect_forward_headers, ForwardEnvelope};
pub use installation::{InstallationAction, InstallationEvent, InstallationReference};
pub use message::{EmptyMessage, ErrorEntry, ErrorMessage};
pub use metadata::{ScmSource, WebhookMetadata};
pub use plugin::{LooseFlag, PluginConfig, PluginId, PluginSettings};

// ============================================================================
// Errors
// ============================================================================

/// Validation errors for inbound values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Field '{field}' is required")]
    Required { field: String },

    #[error("Field '{field}' has invalid format: {message}")]
    InvalidFormat { field: String, message: String },

    #[error("Field '{field}' contains invalid characters: {invalid_chars}")]
    InvalidCharacters {
        field: String,
        invalid_chars: String,
    },
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
