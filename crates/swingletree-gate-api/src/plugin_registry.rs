//! Plugin registry for report relaying.
//!
//! This module provides [`PluginRegistry`], which maps plugin ids to their
//! configuration and a [`PluginClient`] bound to the plugin's base URL. The
//! registry is built once at startup and used read-only during request
//! handling.
//!
//! # URL Structure
//!
//! Each enabled plugin is reachable at:
//! ```text
//! POST /report/{plugin_id}
//! ```
//!
//! and receives the relayed report at `POST <base>/report`.

use crate::config::PluginEntries;
use crate::downstream::{DispatchError, DownstreamClient};
use reqwest::Method;
use std::collections::HashMap;
use swingletree_gate_core::{ForwardEnvelope, PluginConfig, PluginId};
use tracing::{error, info, instrument, warn};

/// Path below the plugin base URL that receives reports
pub const REPORT_PATH: &str = "/report";

// ============================================================================
// PluginClient
// ============================================================================

/// Forward-only client for a single plugin.
#[derive(Debug, Clone)]
pub struct PluginClient {
    downstream: DownstreamClient,
}

impl PluginClient {
    pub fn new(config: &PluginConfig, http: reqwest::Client) -> Self {
        Self {
            downstream: DownstreamClient::new(
                http,
                config.base_url.clone(),
                format!("plugin {}", config.id),
            ),
        }
    }

    /// URL the plugin receives reports at, if a base URL is configured.
    pub fn report_url(&self) -> Option<String> {
        self.downstream.url(REPORT_PATH)
    }

    /// Deliver a report envelope with a single attempt.
    pub async fn send_report(&self, envelope: &ForwardEnvelope) -> Result<(), DispatchError> {
        self.downstream
            .send_json(Method::POST, REPORT_PATH, envelope)
            .await
    }
}

// ============================================================================
// PluginRegistry
// ============================================================================

/// A registry entry: the plugin's configuration and its client.
#[derive(Debug, Clone)]
pub struct RegisteredPlugin {
    pub config: PluginConfig,
    pub client: PluginClient,
}

impl RegisteredPlugin {
    pub fn id(&self) -> &str {
        self.config.id.as_str()
    }

    pub fn is_insecure(&self) -> bool {
        self.config.insecure
    }
}

/// Registry mapping plugin ids to enabled plugins.
///
/// Disabled plugins are never inserted, so a lookup cannot tell a disabled
/// plugin from an unknown one.
///
/// # Examples
///
/// ```rust
/// use swingletree_gate_api::plugin_registry::PluginRegistry;
///
/// let registry = PluginRegistry::new();
/// assert!(!registry.contains("sonar")); // nothing registered yet
/// ```
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    plugins: HashMap<String, RegisteredPlugin>,
}

impl PluginRegistry {
    /// Create a new, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from the configured plugin entries.
    pub fn from_entries(entries: &PluginEntries, http: &reqwest::Client) -> Self {
        let mut registry = Self::new();
        registry.register_all(entries, http);
        registry
    }

    /// Register a plugin if it is enabled.
    ///
    /// An existing entry with the same id is replaced. Returns `true` when
    /// the plugin was inserted.
    pub fn register(&mut self, config: PluginConfig, http: reqwest::Client) -> bool {
        if !config.enabled {
            info!(plugin_id = %config.id, "Plugin is disabled, skipping registration");
            return false;
        }

        if config.base_url.is_none() {
            warn!(
                plugin_id = %config.id,
                "Plugin has no base URL; reports for it will fail to dispatch"
            );
        }

        let client = PluginClient::new(&config, http);
        info!(
            plugin_id = %config.id,
            base_url = config.base_url.as_deref().unwrap_or("<none>"),
            insecure = config.insecure,
            "Registered plugin"
        );

        let id = config.id.as_str().to_string();
        if self.plugins.contains_key(&id) {
            warn!(plugin_id = %id, "Duplicate plugin id, the last configured entry wins");
        }
        self.plugins.insert(id, RegisteredPlugin { config, client });

        true
    }

    /// Register every configured plugin.
    ///
    /// Entries with a missing or invalid id are logged and skipped.
    #[instrument(skip_all, fields(configured = entries.len()))]
    pub fn register_all(&mut self, entries: &PluginEntries, http: &reqwest::Client) {
        for (id, settings) in entries.entries() {
            let Some(id) = id else {
                error!("Plugin configuration entry has no id, skipping");
                continue;
            };

            let plugin_id = match PluginId::new(id) {
                Ok(plugin_id) => plugin_id,
                Err(e) => {
                    error!(plugin_id = %id, error = %e, "Invalid plugin id, skipping");
                    continue;
                }
            };

            self.register(PluginConfig::from_settings(plugin_id, settings), http.clone());
        }

        info!(registered = self.plugins.len(), "Plugin registry initialised");
    }

    /// Look up an enabled plugin by id.
    pub fn get(&self, plugin_id: &str) -> Option<&RegisteredPlugin> {
        self.plugins.get(plugin_id)
    }

    /// Check whether an enabled plugin is registered under `plugin_id`.
    pub fn contains(&self, plugin_id: &str) -> bool {
        self.plugins.contains_key(plugin_id)
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "plugin_registry_tests.rs"]
mod tests;
