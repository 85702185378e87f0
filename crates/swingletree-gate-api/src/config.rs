//! Configuration types for the gate.
//!
//! The layout mirrors `swingletree.conf.yaml`:
//!
//! ```yaml
//! gate:
//!   port: 3000
//!   api:
//!     token: "shared secret"
//!   github:
//!     secret: "webhook secret"
//!   plugins:
//!     - id: sonar
//!       base: http://sonar:3000
//!       enabled: "true"
//! urls:
//!   scotty: http://scotty:3000
//! log:
//!   level: info
//! ```
//!
//! Every field carries a default, so an empty file yields a runnable (if
//! useless) gate. Secrets and URLs that are blank are treated as unset.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use swingletree_gate_core::PluginSettings;

/// Root of the gate configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GateSettings {
    /// Server, authentication and plugin settings
    pub gate: GateConfig,

    /// Addresses of collaborating services
    pub urls: UrlConfig,

    /// Logging configuration
    pub log: LoggingConfig,
}

impl GateSettings {
    /// Check values that deserialization alone cannot rule out.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gate.host.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "gate.host must not be empty".to_string(),
            });
        }

        if self.gate.max_body_size == 0 {
            return Err(ConfigError::Invalid {
                message: "gate.max_body_size must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

/// `gate` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Maximum request size in bytes
    pub max_body_size: usize,

    pub api: ApiConfig,

    pub github: GithubConfig,

    pub plugins: PluginEntries,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_body_size: 10 * 1024 * 1024, // 10MB
            api: ApiConfig::default(),
            github: GithubConfig::default(),
            plugins: PluginEntries::default(),
        }
    }
}

/// `gate.api` section
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Shared secret expected as the Basic auth password on report endpoints
    pub token: Option<String>,
}

impl ApiConfig {
    pub fn token(&self) -> Option<&str> {
        non_blank(self.token.as_deref())
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("token", &self.token().map(|_| "<REDACTED>"))
            .finish()
    }
}

/// `gate.github` section
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// Secret used by GitHub to sign webhook deliveries
    pub secret: Option<String>,
}

impl GithubConfig {
    pub fn secret(&self) -> Option<&str> {
        non_blank(self.secret.as_deref())
    }
}

impl fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubConfig")
            .field("secret", &self.secret().map(|_| "<REDACTED>"))
            .finish()
    }
}

/// `gate.plugins` section.
///
/// Plugins can be listed with an explicit `id` per entry, or keyed by id.
/// The keyed form is the one environment variables can address
/// (`GATE_PLUGINS_SONAR_ENABLED=true`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PluginEntries {
    List(Vec<PluginSettings>),
    Map(BTreeMap<String, PluginSettings>),
}

impl Default for PluginEntries {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl PluginEntries {
    /// Entries paired with their configured id, in configuration order.
    ///
    /// The map key wins over an `id` field inside a keyed entry. List entries
    /// without an id are returned with `None`.
    pub fn entries(&self) -> Vec<(Option<&str>, &PluginSettings)> {
        match self {
            Self::List(list) => list.iter().map(|s| (s.id.as_deref(), s)).collect(),
            Self::Map(map) => map.iter().map(|(id, s)| (Some(id.as_str()), s)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::List(list) => list.len(),
            Self::Map(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `urls` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlConfig {
    /// Installation service receiving GitHub App installation changes
    pub scotty: Option<String>,
}

impl UrlConfig {
    pub fn scotty(&self) -> Option<&str> {
        non_blank(self.scotty.as_deref())
    }
}

/// `log` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Logging level
    pub level: String,

    /// Enable JSON structured logging
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
