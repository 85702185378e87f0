//! Shared-secret authentication for the report endpoint.
//!
//! Every report request names a plugin in its path. The plugin decides how
//! the request is authenticated:
//!
//! | Plugin | Outcome |
//! |--------|---------|
//! | unknown or disabled | `404 Not Found` |
//! | enabled, `insecure` | passed through without credentials |
//! | enabled | HTTP Basic password must equal `gate.api.token` |
//!
//! The Basic username is ignored. When no token is configured the middleware
//! is not mounted at all, see [`crate::create_router`].

use crate::errors::GateError;
use crate::plugin_registry::PluginRegistry;
use axum::{
    extract::{Path, Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{debug, info, instrument, warn};

// ============================================================================
// BasicCredentials
// ============================================================================

/// Credentials carried in an `Authorization: Basic` header
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl BasicCredentials {
    /// Parse an `Authorization` header value.
    ///
    /// Returns `None` for any other scheme, invalid base64, non UTF-8
    /// content, or a decoded value without `:`.
    pub fn parse(header_value: &str) -> Option<Self> {
        let (scheme, encoded) = header_value.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }

        let decoded = STANDARD.decode(encoded.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, password) = decoded.split_once(':')?;

        Some(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .finish()
    }
}

// ============================================================================
// ReportAuthenticator
// ============================================================================

/// Outcome of authenticating a report request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// Credentials matched the shared secret
    Authenticated,

    /// Plugin is marked insecure; credentials were not checked
    Unprotected,

    /// Plugin is unknown or disabled
    PluginUnavailable,

    /// Credentials missing, malformed or wrong
    Unauthorized,
}

/// Decides whether a report request may reach its plugin.
#[derive(Clone)]
pub struct ReportAuthenticator {
    secret: String,
    registry: Arc<PluginRegistry>,
}

impl ReportAuthenticator {
    pub fn new(secret: impl Into<String>, registry: Arc<PluginRegistry>) -> Self {
        Self {
            secret: secret.into(),
            registry,
        }
    }

    /// Build an authenticator when a shared secret is configured.
    ///
    /// Returns `None` otherwise; report endpoints are then unauthenticated.
    pub fn from_secret(secret: Option<&str>, registry: Arc<PluginRegistry>) -> Option<Self> {
        secret.map(|secret| Self::new(secret, registry))
    }

    /// Decide access for `plugin_id` given the raw `Authorization` header.
    pub fn decide(&self, plugin_id: &str, authorization: Option<&str>) -> AccessDecision {
        let Some(plugin) = self.registry.get(plugin_id) else {
            return AccessDecision::PluginUnavailable;
        };

        if plugin.is_insecure() {
            return AccessDecision::Unprotected;
        }

        match authorization.and_then(BasicCredentials::parse) {
            Some(credentials) if self.password_matches(&credentials.password) => {
                AccessDecision::Authenticated
            }
            Some(_) => {
                debug!(plugin_id = %plugin_id, "Password does not match shared secret");
                AccessDecision::Unauthorized
            }
            None => {
                debug!(plugin_id = %plugin_id, "Missing or malformed Basic credentials");
                AccessDecision::Unauthorized
            }
        }
    }

    fn password_matches(&self, password: &str) -> bool {
        self.secret.as_bytes().ct_eq(password.as_bytes()).into()
    }
}

impl std::fmt::Debug for ReportAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportAuthenticator")
            .field("secret", &"<REDACTED>")
            .field("plugins", &self.registry.len())
            .finish()
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Route middleware guarding `POST /report/{plugin_id}`.
///
/// Must be installed with `route_layer` so the path parameter is resolved.
#[instrument(skip(auth, request, next))]
pub async fn authenticate_report(
    State(auth): State<Arc<ReportAuthenticator>>,
    Path(plugin_id): Path<String>,
    request: Request,
    next: Next,
) -> Result<Response, GateError> {
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match auth.decide(&plugin_id, authorization) {
        AccessDecision::Authenticated => Ok(next.run(request).await),
        AccessDecision::Unprotected => {
            info!(plugin_id = %plugin_id, "Unauthenticated access to insecure plugin");
            Ok(next.run(request).await)
        }
        AccessDecision::PluginUnavailable => Err(GateError::PluginNotFound { plugin_id }),
        AccessDecision::Unauthorized => {
            warn!(plugin_id = %plugin_id, "Rejected report with invalid credentials");
            Err(GateError::Unauthorized)
        }
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
