//! Loading of [`GateSettings`] from file and environment.
//!
//! Sources (applied in order, later sources override earlier ones):
//!  1. `./swingletree.conf.yaml`, or the file named by `SWINGLETREE_CONFIG_FILE`
//!  2. Environment variables prefixed `GATE_` and `LOG_`, `_` as separator,
//!     e.g. `GATE_API_TOKEN` sets `gate.api.token` and `LOG_LEVEL` sets
//!     `log.level`
//!
//! The default file is optional; a file named explicitly must exist.

use std::collections::HashMap;
use std::path::Path;
use swingletree_gate_api::{ConfigError, GateSettings};
use tracing::info;

/// Default configuration file, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "swingletree.conf.yaml";

/// Environment variable naming an explicit configuration file
pub const CONFIG_FILE_ENV: &str = "SWINGLETREE_CONFIG_FILE";

const ENV_PREFIXES: [&str; 2] = ["GATE", "LOG"];

/// Load settings from the process environment and configuration file.
pub fn load_settings() -> Result<GateSettings, ConfigError> {
    let explicit_path = std::env::var(CONFIG_FILE_ENV)
        .ok()
        .filter(|path| !path.trim().is_empty());

    build_settings(explicit_path.as_deref(), None)
}

/// Build settings from an optional explicit file and environment.
///
/// `environment` replaces the process environment when given.
pub fn build_settings(
    explicit_path: Option<&str>,
    environment: Option<HashMap<String, String>>,
) -> Result<GateSettings, ConfigError> {
    let (path, required) = match explicit_path {
        Some(path) => {
            info!(path = %path, "Loading configuration from explicit path");
            (path, true)
        }
        None => (DEFAULT_CONFIG_FILE, false),
    };

    let mut builder = config::Config::builder().add_source(
        config::File::from(Path::new(path))
            .format(config::FileFormat::Yaml)
            .required(required),
    );

    for prefix in ENV_PREFIXES {
        builder = builder.add_source(
            config::Environment::with_prefix(prefix)
                .keep_prefix(true)
                .separator("_")
                .source(environment.clone()),
        );
    }

    let settings: GateSettings = builder
        .build()
        .and_then(|config| config.try_deserialize())
        .map_err(|e| ConfigError::Load {
            message: e.to_string(),
        })?;

    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
