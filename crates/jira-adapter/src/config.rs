//! Transform configuration.
//!
//! Loaded from a TOML file, then overlaid with `JIRA_RELAY_*` environment
//! variables. Debug mode lives here and is handed to the transformer
//! explicitly.

use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Shortest comment limit that still leaves room for text before the ellipsis.
pub const MIN_COMMENT_LENGTH: usize = 16;

/// Configuration for an `EventTransformer`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Emit diagnostics for ignored and unknown events instead of suppressing them.
    #[serde(default)]
    pub debug: bool,
    /// Maximum number of characters kept from a comment or description body.
    #[serde(default = "default_max_comment_length")]
    pub max_comment_length: usize,
    /// Display name the chat message is posted under.
    #[serde(default = "default_alias")]
    pub alias: String,
    /// Ask the chat platform to resolve `@name` mentions into links.
    #[serde(default = "default_link_names")]
    pub link_names: bool,
}

fn default_max_comment_length() -> usize {
    500
}

fn default_alias() -> String {
    "JIRA".to_string()
}

fn default_link_names() -> bool {
    true
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            debug: false,
            max_comment_length: default_max_comment_length(),
            alias: default_alias(),
            link_names: default_link_names(),
        }
    }
}

impl TransformConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            message: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Override fields from `JIRA_RELAY_*` environment variables.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_vars(|key| env::var(key).ok())
    }

    fn apply_vars<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(debug) = lookup("JIRA_RELAY_DEBUG") {
            self.debug = parse_flag("JIRA_RELAY_DEBUG", &debug)?;
        }

        if let Some(max) = lookup("JIRA_RELAY_MAX_COMMENT_LENGTH") {
            self.max_comment_length =
                max.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: "JIRA_RELAY_MAX_COMMENT_LENGTH".to_string(),
                    reason: format!("'{}' is not a positive integer", max),
                })?;
        }

        if let Some(alias) = lookup("JIRA_RELAY_ALIAS") {
            self.alias = alias;
        }

        if let Some(link_names) = lookup("JIRA_RELAY_LINK_NAMES") {
            self.link_names = parse_flag("JIRA_RELAY_LINK_NAMES", &link_names)?;
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.alias.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "alias".to_string(),
            });
        }

        if self.max_comment_length < MIN_COMMENT_LENGTH {
            return Err(ConfigError::InvalidValue {
                key: "max_comment_length".to_string(),
                reason: format!("Must be at least {}", MIN_COMMENT_LENGTH),
            });
        }

        Ok(())
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            reason: format!("'{}' is not a boolean", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults() {
        let cfg = TransformConfig::default();
        assert!(!cfg.debug);
        assert_eq!(cfg.max_comment_length, 500);
        assert_eq!(cfg.alias, "JIRA");
        assert!(cfg.link_names);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: TransformConfig = toml::from_str("debug = true\nalias = \"Tracker\"").unwrap();
        assert!(cfg.debug);
        assert_eq!(cfg.alias, "Tracker");
        assert_eq!(cfg.max_comment_length, 500);
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.toml");
        std::fs::write(&path, "max_comment_length = 120\nlink_names = false\n").unwrap();

        let cfg = TransformConfig::from_file(&path).unwrap();
        assert_eq!(cfg.max_comment_length, 120);
        assert!(!cfg.link_names);
    }

    #[test]
    fn from_file_missing_is_io_error() {
        let err = TransformConfig::from_file("/nonexistent/relay.toml").unwrap_err();
        assert!(matches!(err, ConfigError::IoError { .. }));
    }

    #[test]
    fn from_file_garbage_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.toml");
        std::fs::write(&path, "debug = \"maybe").unwrap();

        let err = TransformConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn env_overlay() {
        let env = vars(&[
            ("JIRA_RELAY_DEBUG", "yes"),
            ("JIRA_RELAY_MAX_COMMENT_LENGTH", " 80 "),
            ("JIRA_RELAY_ALIAS", "Jira Cloud"),
            ("JIRA_RELAY_LINK_NAMES", "0"),
        ]);
        let mut cfg = TransformConfig::default();
        cfg.apply_vars(|k| env.get(k).cloned()).unwrap();

        assert!(cfg.debug);
        assert_eq!(cfg.max_comment_length, 80);
        assert_eq!(cfg.alias, "Jira Cloud");
        assert!(!cfg.link_names);
    }

    #[test]
    fn env_overlay_rejects_bad_values() {
        let env = vars(&[("JIRA_RELAY_MAX_COMMENT_LENGTH", "lots")]);
        let mut cfg = TransformConfig::default();
        let err = cfg.apply_vars(|k| env.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "JIRA_RELAY_MAX_COMMENT_LENGTH"));

        let env = vars(&[("JIRA_RELAY_DEBUG", "sometimes")]);
        assert!(cfg.apply_vars(|k| env.get(k).cloned()).is_err());
    }

    #[test]
    fn validate_rejects_tiny_limit_and_empty_alias() {
        let cfg = TransformConfig {
            max_comment_length: 4,
            ..TransformConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));

        let cfg = TransformConfig {
            alias: "  ".to_string(),
            ..TransformConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::MissingRequired { .. })
        ));
    }
}
