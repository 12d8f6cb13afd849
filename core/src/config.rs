//! Registry configuration.

use crate::consistency::ConsistencyLevel;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::env;

/// Environment variable for the read consistency level.
pub const READ_CONSISTENCY_ENV: &str = "TICKET_REGISTRY_READ_CONSISTENCY";

/// Environment variable for the write consistency level.
pub const WRITE_CONSISTENCY_ENV: &str = "TICKET_REGISTRY_WRITE_CONSISTENCY";

/// Consistency levels the registry passes to its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Level for point reads and scans.
    ///
    /// Default: `ONE`
    #[serde(default)]
    pub read_consistency: ConsistencyLevel,

    /// Level for writes and deletes.
    ///
    /// Default: `ONE`
    #[serde(default)]
    pub write_consistency: ConsistencyLevel,
}

impl RegistryConfig {
    /// Configuration with both levels at `ONE`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            read_consistency: ConsistencyLevel::One,
            write_consistency: ConsistencyLevel::One,
        }
    }

    /// Load levels from the environment, defaulting unset variables to `ONE`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidConfig`](crate::RegistryError::InvalidConfig)
    /// if a variable is set to an unknown level.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load levels through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();
        if let Some(level) = lookup(READ_CONSISTENCY_ENV) {
            config.read_consistency = level.parse()?;
        }
        if let Some(level) = lookup(WRITE_CONSISTENCY_ENV) {
            config.write_consistency = level.parse()?;
        }
        Ok(config)
    }

    /// Set read consistency.
    #[must_use]
    pub const fn with_read_consistency(mut self, level: ConsistencyLevel) -> Self {
        self.read_consistency = level;
        self
    }

    /// Set write consistency.
    #[must_use]
    pub const fn with_write_consistency(mut self, level: ConsistencyLevel) -> Self {
        self.write_consistency = level;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::RegistryError;

    #[test]
    fn test_registry_config_builder() {
        let config = RegistryConfig::new()
            .with_read_consistency(ConsistencyLevel::LocalQuorum)
            .with_write_consistency(ConsistencyLevel::All);

        assert_eq!(config.read_consistency, ConsistencyLevel::LocalQuorum);
        assert_eq!(config.write_consistency, ConsistencyLevel::All);
    }

    #[test]
    fn test_default_config() {
        assert_eq!(RegistryConfig::default(), RegistryConfig::new());
        assert_eq!(RegistryConfig::new().read_consistency, ConsistencyLevel::One);
    }

    #[test]
    fn test_from_lookup_reads_levels() {
        let config = RegistryConfig::from_lookup(|name| match name {
            READ_CONSISTENCY_ENV => Some("local_quorum".to_string()),
            WRITE_CONSISTENCY_ENV => Some("ALL".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.read_consistency, ConsistencyLevel::LocalQuorum);
        assert_eq!(config.write_consistency, ConsistencyLevel::All);
    }

    #[test]
    fn test_from_lookup_defaults_unset_levels() {
        let config = RegistryConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, RegistryConfig::new());
    }

    #[test]
    fn test_from_lookup_rejects_unknown_level() {
        let error = RegistryConfig::from_lookup(|name| {
            (name == WRITE_CONSISTENCY_ENV).then(|| "MOST".to_string())
        })
        .unwrap_err();

        assert!(matches!(error, RegistryError::InvalidConfig(_)));
    }

    #[test]
    fn test_deserialize_with_missing_fields() {
        let config: RegistryConfig =
            serde_json::from_str(r#"{"write_consistency":"QUORUM"}"#).unwrap();
        assert_eq!(config.read_consistency, ConsistencyLevel::One);
        assert_eq!(config.write_consistency, ConsistencyLevel::Quorum);
    }
}
