//! Serializable run configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Engine identity stamped into run bundles.
pub const ENGINE_VERSION: &str = concat!("driftlab-", env!("CARGO_PKG_VERSION"));

/// Parameters for a single pipeline run. Immutable once a run starts: the
/// chain reads it, echoes parts of it into the artifacts, and never writes
/// it back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    /// Rolling window length for volatility and z-score.
    #[serde(default = "default_window")]
    pub window: usize,

    /// Numeric guard for near-zero denominators.
    #[serde(default = "default_eps")]
    pub eps: f64,

    /// Engine identity echoed into the run bundle.
    #[serde(default = "default_version")]
    pub version: String,

    /// Opaque operator label echoed into the promotion record.
    #[serde(default = "default_operator")]
    pub operator_signature: String,

    /// Opaque co-sign label echoed into the promotion record.
    #[serde(default = "default_cosign")]
    pub cosign_signature: String,
}

fn default_window() -> usize {
    20
}

fn default_eps() -> f64 {
    1e-12
}

fn default_version() -> String {
    ENGINE_VERSION.to_string()
}

fn default_operator() -> String {
    "local-operator".to_string()
}

fn default_cosign() -> String {
    "none".to_string()
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            eps: default_eps(),
            version: default_version(),
            operator_signature: default_operator(),
            cosign_signature: default_cosign(),
        }
    }
}

/// Errors raised while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

impl RunConfig {
    /// Load a configuration from a TOML file. Absent keys fall back to
    /// their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = RunConfig::default();
        assert_eq!(config.window, 20);
        assert_eq!(config.eps, 1e-12);
        assert!(config.version.starts_with("driftlab-"));
        assert_eq!(config.operator_signature, "local-operator");
        assert_eq!(config.cosign_signature, "none");
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config = RunConfig::from_toml("window = 5\n").unwrap();
        assert_eq!(config.window, 5);
        assert_eq!(config.eps, 1e-12);
        assert_eq!(config.version, ENGINE_VERSION);
    }

    #[test]
    fn full_toml_overrides_everything() {
        let toml_str = r#"
window = 60
eps = 1e-9
version = "site-build-7"
operator_signature = "ops-alice"
cosign_signature = "ops-bob"
"#;
        let config = RunConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.window, 60);
        assert_eq!(config.eps, 1e-9);
        assert_eq!(config.version, "site-build-7");
        assert_eq!(config.operator_signature, "ops-alice");
        assert_eq!(config.cosign_signature, "ops-bob");
    }

    #[test]
    fn toml_roundtrip() {
        let config = RunConfig {
            window: 7,
            ..RunConfig::default()
        };
        let text = toml::to_string(&config).unwrap();
        let parsed = RunConfig::from_toml(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = RunConfig::from_toml("window = \"not a number\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn from_file_reads_a_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        std::fs::write(&path, "window = 9\n").unwrap();
        let config = RunConfig::from_file(&path).unwrap();
        assert_eq!(config.window, 9);
    }
}
