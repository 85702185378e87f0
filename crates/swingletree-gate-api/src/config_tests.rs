//! Tests for [`GateSettings`] and [`PluginEntries`].

use super::*;

fn settings_from_json(value: serde_json::Value) -> GateSettings {
    serde_json::from_value(value).unwrap()
}

// ============================================================================
// Defaults
// ============================================================================

mod defaults_tests {
    use super::*;

    /// Verify that an empty document produces usable defaults.
    #[test]
    fn test_empty_document_uses_defaults() {
        let settings = settings_from_json(serde_json::json!({}));

        assert_eq!(settings.gate.host, "0.0.0.0");
        assert_eq!(settings.gate.port, 3000);
        assert_eq!(settings.gate.max_body_size, 10 * 1024 * 1024);
        assert!(settings.gate.api.token().is_none());
        assert!(settings.gate.github.secret().is_none());
        assert!(settings.gate.plugins.is_empty());
        assert!(settings.urls.scotty().is_none());
        assert_eq!(settings.log.level, "info");
        assert!(!settings.log.json);
        assert!(settings.validate().is_ok());
    }

    /// Verify that blank secrets count as unset.
    #[test]
    fn test_blank_values_are_unset() {
        let settings = settings_from_json(serde_json::json!({
            "gate": { "api": { "token": "   " }, "github": { "secret": "" } },
            "urls": { "scotty": " " }
        }));

        assert!(settings.gate.api.token().is_none());
        assert!(settings.gate.github.secret().is_none());
        assert!(settings.urls.scotty().is_none());
    }

    /// Verify that configured secrets are returned as written.
    #[test]
    fn test_token_returned_verbatim() {
        let settings = settings_from_json(serde_json::json!({
            "gate": { "api": { "token": " padded " } }
        }));

        assert_eq!(settings.gate.api.token(), Some(" padded "));
    }
}

// ============================================================================
// Validation
// ============================================================================

mod validation_tests {
    use super::*;

    #[test]
    fn test_zero_body_size_rejected() {
        let mut settings = GateSettings::default();
        settings.gate.max_body_size = 0;

        assert!(matches!(
            settings.validate(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_empty_host_rejected() {
        let mut settings = GateSettings::default();
        settings.gate.host = " ".to_string();

        assert!(settings.validate().is_err());
    }
}

// ============================================================================
// Plugin entries
// ============================================================================

mod plugin_entries_tests {
    use super::*;

    /// Verify the list layout with explicit ids.
    #[test]
    fn test_list_layout() {
        let settings = settings_from_json(serde_json::json!({
            "gate": { "plugins": [
                { "id": "sonar", "base": "http://sonar", "enabled": "true" },
                { "id": "zap", "base": "http://zap", "enabled": "false", "insecure": "true" }
            ] }
        }));

        let entries = settings.gate.plugins.entries();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, Some("sonar"));
        assert!(entries[0].1.enabled.get());
        assert_eq!(entries[1].0, Some("zap"));
        assert!(!entries[1].1.enabled.get());
        assert!(entries[1].1.insecure.get());
    }

    /// Verify the keyed layout, where the key supplies the id.
    #[test]
    fn test_map_layout() {
        let settings = settings_from_json(serde_json::json!({
            "gate": { "plugins": {
                "testPlugin": { "base": "http://x", "enabled": "TRUE", "insecure": false }
            } }
        }));

        let entries = settings.gate.plugins.entries();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, Some("testPlugin"));
        assert_eq!(entries[0].1.base.as_deref(), Some("http://x"));
        assert!(entries[0].1.enabled.get());
        assert!(!entries[0].1.insecure.get());
    }

    /// Verify that a list entry without an id is surfaced as `None`.
    #[test]
    fn test_list_entry_without_id() {
        let settings = settings_from_json(serde_json::json!({
            "gate": { "plugins": [ { "base": "http://x" } ] }
        }));

        assert_eq!(settings.gate.plugins.entries()[0].0, None);
    }
}

// ============================================================================
// Debug redaction
// ============================================================================

/// Verify that Debug output never contains secrets.
#[test]
fn test_debug_redacts_secrets() {
    let settings = settings_from_json(serde_json::json!({
        "gate": {
            "api": { "token": "super-sensitive-token" },
            "github": { "secret": "super-sensitive-secret" }
        }
    }));

    let debug_str = format!("{:?}", settings);

    assert!(
        !debug_str.contains("super-sensitive"),
        "debug output must not leak secrets: {debug_str}"
    );
    assert!(debug_str.contains("REDACTED"));
}
