use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{RootError, RootResult};

/// Configuration for the confidence/policy engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Auto-approval threshold applied when no issuer threshold matches.
    #[serde(default = "default_threshold")]
    pub default_threshold: f64,

    /// Width of the manual-review band below the threshold.
    #[serde(default = "default_review_margin")]
    pub review_margin: f64,
}

fn default_threshold() -> f64 {
    veridoc_engine::DEFAULT_THRESHOLD
}

fn default_review_margin() -> f64 {
    veridoc_engine::REVIEW_MARGIN
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            default_threshold: default_threshold(),
            review_margin: default_review_margin(),
        }
    }
}

impl PolicyConfig {
    pub fn params(&self) -> veridoc_engine::PolicyParams {
        veridoc_engine::PolicyParams {
            default_threshold: self.default_threshold,
            review_margin: self.review_margin,
        }
    }
}

/// Configuration for the signing key store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyConfig {
    /// Maximum active + retired keys retained.
    #[serde(default = "default_retention_count")]
    pub retention_count: usize,

    /// Minimum age in days before an external sweep may prune a retired
    /// key. Enforced by the operator's retention check, not by the store.
    #[serde(default = "default_retention_days")]
    pub retention_days: u64,
}

fn default_retention_count() -> usize {
    veridoc_issuer::DEFAULT_RETENTION
}

fn default_retention_days() -> u64 {
    365
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            retention_count: default_retention_count(),
            retention_days: default_retention_days(),
        }
    }
}

/// Configuration for the external extraction model call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Timeout handed to the model transport; a timed-out call falls back
    /// to the normalizer's failure path.
    #[serde(default = "default_model_timeout_ms")]
    pub model_timeout_ms: u64,
}

fn default_model_timeout_ms() -> u64 {
    30_000
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model_timeout_ms: default_model_timeout_ms(),
        }
    }
}

/// Top-level configuration for the verification engine.
///
/// Loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Issuer identifier stamped into issued credentials.
    #[serde(default = "default_issuer_name")]
    pub issuer_name: String,

    /// Reference to the status-list resource returned in status queries.
    #[serde(default = "default_status_list_ref")]
    pub status_list_ref: String,

    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub keys: KeyConfig,

    #[serde(default)]
    pub extraction: ExtractionConfig,
}

fn default_issuer_name() -> String {
    "veridoc".to_string()
}

fn default_status_list_ref() -> String {
    "urn:veridoc:status-list:1".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            issuer_name: default_issuer_name(),
            status_list_ref: default_status_list_ref(),
            policy: PolicyConfig::default(),
            keys: KeyConfig::default(),
            extraction: ExtractionConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file. If the file does not exist,
    /// returns a default configuration.
    pub fn load(path: &Path) -> RootResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(RootError::Io)?;
        let config: EngineConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> RootResult<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| RootError::Config(format!("TOML serialize error: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(RootError::Io)?;
        }
        std::fs::write(path, contents).map_err(RootError::Io)?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> RootResult<()> {
        if self.policy.default_threshold <= 0.0 || self.policy.default_threshold > 1.0 {
            return Err(RootError::Config(format!(
                "policy.default_threshold must be in (0.0, 1.0], got {}",
                self.policy.default_threshold
            )));
        }
        if self.policy.review_margin < 0.0 || self.policy.review_margin >= self.policy.default_threshold
        {
            return Err(RootError::Config(format!(
                "policy.review_margin must be in [0.0, default_threshold), got {}",
                self.policy.review_margin
            )));
        }
        if self.keys.retention_count == 0 {
            return Err(RootError::Config("keys.retention_count must be > 0".into()));
        }
        if self.keys.retention_days == 0 {
            return Err(RootError::Config("keys.retention_days must be > 0".into()));
        }
        if self.extraction.model_timeout_ms == 0 {
            return Err(RootError::Config(
                "extraction.model_timeout_ms must be > 0".into(),
            ));
        }
        if self.issuer_name.trim().is_empty() {
            return Err(RootError::Config("issuer_name must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.issuer_name, "veridoc");
        assert!((config.policy.default_threshold - 0.9).abs() < f64::EPSILON);
        assert!((config.policy.review_margin - 0.15).abs() < f64::EPSILON);
        assert_eq!(config.keys.retention_count, 3);
        assert_eq!(config.keys.retention_days, 365);
        assert_eq!(config.extraction.model_timeout_ms, 30_000);
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
issuer_name = "registrar"
status_list_ref = "https://registrar.example/status/1"

[policy]
default_threshold = 0.85
review_margin = 0.1

[keys]
retention_count = 5
retention_days = 730

[extraction]
model_timeout_ms = 10000
"#;
        let config: EngineConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.issuer_name, "registrar");
        assert!((config.policy.default_threshold - 0.85).abs() < f64::EPSILON);
        assert_eq!(config.keys.retention_count, 5);
        assert_eq!(config.extraction.model_timeout_ms, 10_000);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: EngineConfig = toml::from_str("issuer_name = \"x\"").unwrap();
        assert_eq!(config.keys.retention_count, 3);
        assert!((config.policy.default_threshold - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_validate_ok() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_bad_threshold() {
        let mut config = EngineConfig::default();
        config.policy.default_threshold = 1.5;
        assert!(config.validate().is_err());

        config.policy.default_threshold = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_margin_wider_than_threshold() {
        let mut config = EngineConfig::default();
        config.policy.review_margin = 0.95;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_retention() {
        let mut config = EngineConfig::default();
        config.keys.retention_count = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_empty_issuer_name() {
        let mut config = EngineConfig::default();
        config.issuer_name = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let config = EngineConfig::load(Path::new("/nonexistent/veridoc.toml")).unwrap();
        assert_eq!(config.issuer_name, "veridoc");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = std::env::temp_dir().join("veridoc-test-config");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("config.toml");

        let mut config = EngineConfig::default();
        config.issuer_name = "registrar".into();
        config.keys.retention_count = 4;

        config.save(&path).unwrap();
        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(loaded.issuer_name, "registrar");
        assert_eq!(loaded.keys.retention_count, 4);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_policy_params_conversion() {
        let mut config = EngineConfig::default();
        config.policy.default_threshold = 0.8;
        let params = config.policy.params();
        assert!((params.default_threshold - 0.8).abs() < f64::EPSILON);
    }
}
