//! Tests for settings loading.

use super::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn env(vars: &[(&str, &str)]) -> Option<HashMap<String, String>> {
    Some(
        vars.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

const SAMPLE: &str = r#"
gate:
  port: 3001
  api:
    token: file-token
  github:
    secret: ""
  plugins:
    - id: sonar
      base: http://sonar:3000
      enabled: "true"
    - id: zap
      base: http://zap:3000
      enabled: "false"
      insecure: "true"
urls:
  scotty: http://scotty:3000
log:
  level: debug
"#;

// ============================================================================
// File source
// ============================================================================

mod file_tests {
    use super::*;

    /// Verify that a complete file is loaded with its plugin list.
    #[test]
    fn test_explicit_file_is_loaded() {
        let file = config_file(SAMPLE);

        let settings = build_settings(file.path().to_str(), env(&[])).unwrap();

        assert_eq!(settings.gate.port, 3001);
        assert_eq!(settings.gate.host, "0.0.0.0");
        assert_eq!(settings.gate.api.token(), Some("file-token"));
        assert!(settings.gate.github.secret().is_none());
        assert_eq!(settings.urls.scotty(), Some("http://scotty:3000"));
        assert_eq!(settings.log.level, "debug");

        let entries = settings.gate.plugins.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, Some("sonar"));
        assert!(entries[0].1.enabled.get());
        assert!(!entries[1].1.enabled.get());
        assert!(entries[1].1.insecure.get());
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let result = build_settings(Some("/nonexistent/swingletree.conf.yaml"), env(&[]));

        assert!(matches!(result, Err(ConfigError::Load { .. })));
    }

    /// Verify that without any file the defaults apply.
    #[test]
    fn test_missing_default_file_uses_defaults() {
        let settings = build_settings(None, env(&[])).unwrap();

        assert_eq!(settings.gate.port, 3000);
        assert!(settings.gate.plugins.is_empty());
    }

    #[test]
    fn test_wrong_type_fails() {
        let file = config_file("gate:\n  port: not-a-port\n");

        assert!(build_settings(file.path().to_str(), env(&[])).is_err());
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let file = config_file("gate:\n  max_body_size: 0\n");

        assert!(matches!(
            build_settings(file.path().to_str(), env(&[])),
            Err(ConfigError::Invalid { .. })
        ));
    }
}

// ============================================================================
// Environment source
// ============================================================================

mod environment_tests {
    use super::*;

    /// Verify that environment variables override file values.
    #[test]
    fn test_environment_overrides_file() {
        let file = config_file(SAMPLE);

        let settings = build_settings(
            file.path().to_str(),
            env(&[
                ("GATE_PORT", "8080"),
                ("GATE_API_TOKEN", "env-token"),
                ("LOG_LEVEL", "warn"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.gate.port, 8080);
        assert_eq!(settings.gate.api.token(), Some("env-token"));
        assert_eq!(settings.log.level, "warn");
        assert_eq!(settings.gate.plugins.len(), 2);
    }

    #[test]
    fn test_environment_only() {
        let settings = build_settings(
            None,
            env(&[
                ("GATE_GITHUB_SECRET", "hook"),
                ("URLS_SCOTTY", "http://ignored"),
                ("LOG_JSON", "true"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.gate.github.secret(), Some("hook"));
        assert!(settings.log.json);
        // Only GATE_ and LOG_ variables are read
        assert!(settings.urls.scotty().is_none());
    }

    #[test]
    fn test_blank_environment_token_is_unset() {
        let settings = build_settings(None, env(&[("GATE_API_TOKEN", "")])).unwrap();

        assert!(settings.gate.api.token().is_none());
    }
}
