//! # Swingletree Gate Service
//!
//! Binary entry point for the Swingletree gate.
//!
//! This executable:
//! - Loads configuration from `swingletree.conf.yaml` and the environment
//! - Initializes logging
//! - Builds the plugin registry and the installation service client
//! - Starts the HTTP server from swingletree-gate-api

mod settings;

use std::error::Error as _;
use std::sync::Arc;
use swingletree_gate_api::{
    build_http_client, config::LoggingConfig, start_server, AppState, ConfigError, GateSettings,
    InstallationClient, PluginRegistry, ServiceError,
};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %error_chain(&e), "Swingletree Gate terminated");
        std::process::exit(e.exit_code());
    }
}

async fn run() -> Result<(), ServiceError> {
    let settings = match settings::load_settings() {
        Ok(settings) => settings,
        Err(e) => {
            init_tracing(&LoggingConfig::default());
            return Err(e.into());
        }
    };

    init_tracing(&settings.log);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Swingletree Gate");

    warn_on_missing_settings(&settings);

    let state = build_state(settings)?;

    info!(
        host = %state.settings.gate.host,
        port = state.settings.gate.port,
        plugins = state.plugins.len(),
        "Starting HTTP server"
    );

    start_server(state).await
}

/// Build the registry and clients in dependency order.
fn build_state(settings: GateSettings) -> Result<AppState, ConfigError> {
    let http = build_http_client().map_err(|e| ConfigError::HttpClient {
        message: e.to_string(),
    })?;

    let plugins = PluginRegistry::from_entries(&settings.gate.plugins, &http);

    let installations = Arc::new(InstallationClient::new(
        http,
        settings.urls.scotty().map(str::to_string),
    ));

    Ok(AppState::new(settings, plugins, installations))
}

/// Render an error with its sources, outermost first.
fn error_chain(error: &ServiceError) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

fn warn_on_missing_settings(settings: &GateSettings) {
    if settings.gate.api.token().is_none() {
        warn!(
            "gate.api.token is not configured; report endpoints will accept \
             requests without authentication"
        );
    }

    if settings.gate.github.secret().is_none() {
        warn!(
            "gate.github.secret is not configured; GitHub webhook signatures \
             will not be verified"
        );
    }

    if settings.urls.scotty().is_none() {
        warn!("urls.scotty is not configured; installation events cannot be forwarded");
    }
}

/// Initialize logging. `RUST_LOG` wins over the configured level.
fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "swingletree_gate_service={level},swingletree_gate_api={level},tower_http={level}",
            level = config.level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);

    if config.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
