//! Plugin identifiers and configuration.
//!
//! Plugin settings arrive from loosely typed configuration sources (YAML files
//! and environment variables), so the `enabled` and `insecure` switches may be
//! booleans, strings in any case, or missing entirely. [`LooseFlag`] applies the
//! one coercion rule used everywhere: only the text `true` (case-insensitive)
//! turns a switch on.

use crate::ValidationError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ============================================================================
// PluginId
// ============================================================================

/// Identifier of a downstream plugin, used as the `{plugin_id}` path segment of
/// `POST /report/{plugin_id}`.
///
/// Any non-empty value is accepted as long as it can appear as a single URL
/// path segment: slashes, whitespace and control characters are rejected.
///
/// # Examples
///
/// ```rust
/// use swingletree_gate_core::PluginId;
///
/// let id = PluginId::new("sonarqube").unwrap();
/// assert_eq!(id.as_str(), "sonarqube");
///
/// assert!(PluginId::new("testPlugin").is_ok());
/// assert!(PluginId::new("").is_err());
/// assert!(PluginId::new("../escape").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PluginId(String);

impl PluginId {
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.is_empty() {
            return Err(ValidationError::Required {
                field: "plugin_id".to_string(),
            });
        }
        if s
            .chars()
            .any(|c| c == '/' || c.is_whitespace() || c.is_control())
        {
            return Err(ValidationError::InvalidCharacters {
                field: "plugin_id".to_string(),
                invalid_chars: "slash, whitespace or control character".to_string(),
            });
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PluginId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// LooseFlag
// ============================================================================

/// Boolean switch parsed from a loosely typed configuration value.
///
/// | Input                          | Result  |
/// |--------------------------------|---------|
/// | `true`, `"true"`, `"TRUE"`     | `true`  |
/// | `false`, `"false"`, `"yes"`    | `false` |
/// | numbers, null, absent          | `false` |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LooseFlag(bool);

impl LooseFlag {
    pub const fn new(value: bool) -> Self {
        Self(value)
    }

    /// Apply the coercion rule to a textual value.
    pub fn parse(value: &str) -> Self {
        Self(value.eq_ignore_ascii_case("true"))
    }

    pub fn get(self) -> bool {
        self.0
    }
}

impl From<bool> for LooseFlag {
    fn from(value: bool) -> Self {
        Self(value)
    }
}

impl From<LooseFlag> for bool {
    fn from(flag: LooseFlag) -> Self {
        flag.0
    }
}

impl Serialize for LooseFlag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(self.0)
    }
}

impl<'de> Deserialize<'de> for LooseFlag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(LooseFlagVisitor)
    }
}

struct LooseFlagVisitor;

impl<'de> de::Visitor<'de> for LooseFlagVisitor {
    type Value = LooseFlag;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a boolean or a string")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<LooseFlag, E> {
        Ok(LooseFlag(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<LooseFlag, E> {
        Ok(LooseFlag::parse(v))
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<LooseFlag, E> {
        Ok(LooseFlag(false))
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<LooseFlag, E> {
        Ok(LooseFlag(false))
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<LooseFlag, E> {
        Ok(LooseFlag(false))
    }

    fn visit_unit<E: de::Error>(self) -> Result<LooseFlag, E> {
        Ok(LooseFlag(false))
    }

    fn visit_none<E: de::Error>(self) -> Result<LooseFlag, E> {
        Ok(LooseFlag(false))
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<LooseFlag, D::Error> {
        deserializer.deserialize_any(self)
    }
}

// ============================================================================
// PluginSettings / PluginConfig
// ============================================================================

/// One plugin entry as written in configuration.
///
/// `id` is only present when plugins are configured as a list; in the map form
/// the key supplies it. `base` may be missing: such plugins are still
/// registered and fail when a report is dispatched to them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, alias = "baseUrl", alias = "base_url")]
    pub base: Option<String>,

    #[serde(default)]
    pub enabled: LooseFlag,

    #[serde(default)]
    pub insecure: LooseFlag,
}

/// Parsed, immutable configuration of a single plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginConfig {
    pub id: PluginId,

    /// Base URL reports are posted under (`<base_url>/report`)
    pub base_url: Option<String>,

    pub enabled: bool,

    /// Skip shared-secret authentication for this plugin
    pub insecure: bool,
}

impl PluginConfig {
    /// Build the parsed configuration from raw settings.
    ///
    /// Blank base URLs are treated as missing.
    pub fn from_settings(id: PluginId, settings: &PluginSettings) -> Self {
        let base_url = settings
            .base
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Self {
            id,
            base_url,
            enabled: settings.enabled.get(),
            insecure: settings.insecure.get(),
        }
    }
}

#[cfg(test)]
#[path = "plugin_tests.rs"]
mod tests;
