//! Redis store configuration.

use std::env;
use std::str::FromStr;
use std::time::Duration;
use ticket_registry_core::{RegistryError, Result};

/// Environment variable for the connection URL.
pub const REDIS_URL_ENV: &str = "TICKET_REGISTRY_REDIS_URL";

/// Environment variable for the key prefix.
pub const KEY_PREFIX_ENV: &str = "TICKET_REGISTRY_KEY_PREFIX";

/// Environment variable for the replica count.
pub const REPLICAS_ENV: &str = "TICKET_REGISTRY_REDIS_REPLICAS";

/// Environment variable for the `WAIT` timeout.
pub const WAIT_TIMEOUT_ENV: &str = "TICKET_REGISTRY_WAIT_TIMEOUT_MS";

/// Environment variable for the `SCAN` batch hint.
pub const SCAN_COUNT_ENV: &str = "TICKET_REGISTRY_SCAN_COUNT";

/// Default connection URL.
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Default key namespace.
pub const DEFAULT_KEY_PREFIX: &str = "cas:ticket:";

/// Upper bound on configured replicas.
pub const MAX_REPLICAS: usize = 1_024;

/// Connection and replication settings for [`RedisTicketStore`](crate::RedisTicketStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisStoreConfig {
    /// Connection URL (e.g., "redis://127.0.0.1:6379").
    pub url: String,

    /// Prepended to every ticket id to form the Redis key.
    ///
    /// Default: `cas:ticket:`
    pub key_prefix: String,

    /// Replicas behind the primary.
    ///
    /// Consistency levels are evaluated against `replicas + 1` nodes.
    ///
    /// Default: 0
    pub replicas: usize,

    /// How long `WAIT` blocks for replica acknowledgements, in milliseconds.
    ///
    /// Default: 1000
    pub wait_timeout_ms: u64,

    /// `COUNT` hint per `SCAN` batch.
    ///
    /// Default: 500
    pub scan_count: usize,
}

impl RedisStoreConfig {
    /// Configuration for `url` with defaults for everything else.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Load settings from the environment, defaulting unset variables.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if a numeric variable does not parse or the
    /// result fails [`validate`](Self::validate).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load settings through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(url) = lookup(REDIS_URL_ENV) {
            config.url = url;
        }
        if let Some(prefix) = lookup(KEY_PREFIX_ENV) {
            config.key_prefix = prefix;
        }
        if let Some(replicas) = parse_var(&lookup, REPLICAS_ENV)? {
            config.replicas = replicas;
        }
        if let Some(timeout) = parse_var(&lookup, WAIT_TIMEOUT_ENV)? {
            config.wait_timeout_ms = timeout;
        }
        if let Some(count) = parse_var(&lookup, SCAN_COUNT_ENV)? {
            config.scan_count = count;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the settings can be used to open a store.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for an empty URL, a zero scan count, a zero
    /// `WAIT` timeout (Redis would block indefinitely) or more than
    /// [`MAX_REPLICAS`] replicas.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(RegistryError::InvalidConfig(
                "Redis URL must not be empty".to_string(),
            ));
        }
        if self.scan_count == 0 {
            return Err(RegistryError::InvalidConfig(
                "scan count must be at least 1".to_string(),
            ));
        }
        if self.wait_timeout_ms == 0 {
            return Err(RegistryError::InvalidConfig(
                "WAIT timeout must be at least 1ms".to_string(),
            ));
        }
        if self.replicas > MAX_REPLICAS {
            return Err(RegistryError::InvalidConfig(format!(
                "{} replicas configured, at most {MAX_REPLICAS} supported",
                self.replicas
            )));
        }
        Ok(())
    }

    /// Set key prefix.
    #[must_use]
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Set replica count.
    #[must_use]
    pub const fn with_replicas(mut self, replicas: usize) -> Self {
        self.replicas = replicas;
        self
    }

    /// Set `WAIT` timeout.
    #[must_use]
    pub const fn with_wait_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.wait_timeout_ms = timeout_ms;
        self
    }

    /// Set `SCAN` batch hint.
    #[must_use]
    pub const fn with_scan_count(mut self, count: usize) -> Self {
        self.scan_count = count;
        self
    }

    /// `WAIT` timeout as a duration.
    #[must_use]
    pub const fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_REDIS_URL.to_string(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            replicas: 0,
            wait_timeout_ms: 1_000,
            scan_count: 500,
        }
    }
}

fn parse_var<F, T>(lookup: &F, name: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(name)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|e| RegistryError::InvalidConfig(format!("{name}={value:?}: {e}")))
        })
        .transpose()
}
