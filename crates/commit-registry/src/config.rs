//! Registry configuration, loadable from TOML.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How the ordering clock treats acceptances that share a time hint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderingMode {
    /// Every timepoint is strictly greater than the previous one.
    #[default]
    Strict,
    /// Timepoints never decrease but may repeat within a tick.
    Weak,
}

/// Which repeated submissions count as duplicates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// A commitment value may be present at most once in the whole store.
    #[default]
    StoreWide,
    /// Each committer may hold a commitment value once; different committers
    /// may hold the same value.
    PerCommitter,
}

impl std::fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DuplicatePolicy::StoreWide => f.write_str("store-wide"),
            DuplicatePolicy::PerCommitter => f.write_str("per-committer"),
        }
    }
}

/// What removing an absent commitment does.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingRemoval {
    /// Fail with `NotFound`.
    #[default]
    Error,
    /// Succeed without effect.
    Ignore,
}

/// Which public entry points are enabled.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterfaceConfig {
    pub minimal: bool,
    pub general: bool,
}

impl Default for InterfaceConfig {
    fn default() -> Self {
        Self {
            minimal: true,
            general: true,
        }
    }
}

/// Configuration for a [`crate::CommitmentRegistry`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Ordering guarantee for timepoints (default: strict)
    pub ordering: OrderingMode,
    /// How far the host time hint may move backward before the clock faults (default: 1000)
    pub max_regression_ticks: u64,
    /// Duplicate-commitment policy (default: store-wide)
    pub duplicate_policy: DuplicatePolicy,
    /// Keep removed commitments reserved against re-submission (default: false)
    pub retain_history: bool,
    /// Behaviour of removing an absent commitment (default: error)
    pub missing_removal: MissingRemoval,
    /// Largest accepted extra data, in bytes (default: 4096)
    pub max_extra_data_len: usize,
    /// Buffered events per subscriber before drops (default: 1024)
    pub subscriber_capacity: usize,
    pub interfaces: InterfaceConfig,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            ordering: OrderingMode::Strict,
            max_regression_ticks: 1000,
            duplicate_policy: DuplicatePolicy::StoreWide,
            retain_history: false,
            missing_removal: MissingRemoval::Error,
            max_extra_data_len: 4096,
            subscriber_capacity: 1024,
            interfaces: InterfaceConfig::default(),
        }
    }
}

impl RegistryConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: RegistryConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.subscriber_capacity == 0 {
            return Err(ConfigError::Invalid(
                "subscriber_capacity must be at least 1".into(),
            ));
        }
        if !self.interfaces.minimal && !self.interfaces.general {
            return Err(ConfigError::Invalid(
                "at least one of interfaces.minimal or interfaces.general must be enabled".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = RegistryConfig::from_toml_str("").unwrap();
        assert_eq!(config, RegistryConfig::default());
        assert_eq!(config.ordering, OrderingMode::Strict);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::StoreWide);
    }

    #[test]
    fn parses_all_fields() {
        let toml = r#"
            ordering = "weak"
            max_regression_ticks = 5
            duplicate_policy = "per-committer"
            retain_history = true
            missing_removal = "ignore"
            max_extra_data_len = 16
            subscriber_capacity = 8

            [interfaces]
            minimal = false
        "#;
        let config = RegistryConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.ordering, OrderingMode::Weak);
        assert_eq!(config.max_regression_ticks, 5);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::PerCommitter);
        assert!(config.retain_history);
        assert_eq!(config.missing_removal, MissingRemoval::Ignore);
        assert_eq!(config.max_extra_data_len, 16);
        assert_eq!(config.subscriber_capacity, 8);
        assert!(!config.interfaces.minimal);
        assert!(config.interfaces.general);
    }

    #[test]
    fn rejects_unknown_enum_value() {
        let err = RegistryConfig::from_toml_str(r#"ordering = "sloppy""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_zero_capacity() {
        let err = RegistryConfig::from_toml_str("subscriber_capacity = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_all_interfaces_disabled() {
        let toml = "[interfaces]\nminimal = false\ngeneral = false\n";
        assert!(matches!(
            RegistryConfig::from_toml_str(toml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn load_from_file_and_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.toml");
        let config = RegistryConfig {
            retain_history: true,
            ..RegistryConfig::default()
        };
        std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();

        let loaded = RegistryConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = RegistryConfig::load("/nonexistent/registry.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
