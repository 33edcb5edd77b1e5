//! Configuration Module
//!
//! Builds cache configuration in code or from environment variables.

use std::env;
use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Environment variable holding the default TTL in milliseconds.
pub const DEFAULT_TTL_ENV: &str = "TTLCACHE_DEFAULT_TTL_MS";

/// Cache configuration parameters.
///
/// The default configuration builds an unbounded cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheConfig {
    /// Default TTL for entries; None = unbounded (no expiration)
    pub default_ttl: Option<Duration>,
}

impl CacheConfig {
    /// Creates a configuration for an unbounded cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables TTL mode with the given default TTL.
    pub fn with_default_ttl(mut self, default_ttl: Duration) -> Self {
        self.default_ttl = Some(default_ttl);
        self
    }

    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `TTLCACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds
    ///   (default: unset, unbounded cache)
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] if a variable is set to something
    /// other than a non-negative integer.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let default_ttl = match lookup(DEFAULT_TTL_ENV) {
            Some(raw) if !raw.trim().is_empty() => {
                let millis = raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|source| ConfigError::InvalidValue {
                        var: DEFAULT_TTL_ENV,
                        value: raw.clone(),
                        source,
                    })?;
                Some(Duration::from_millis(millis))
            }
            _ => None,
        };

        Ok(Self { default_ttl })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_ttl(value: &'static str) -> impl Fn(&str) -> Option<String> {
        move |var| (var == DEFAULT_TTL_ENV).then(|| value.to_string())
    }

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.default_ttl, None);
        assert_eq!(config, CacheConfig::new());
    }

    #[test]
    fn test_config_with_default_ttl() {
        let config = CacheConfig::new().with_default_ttl(Duration::from_secs(1));
        assert_eq!(config.default_ttl, Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_config_from_lookup() {
        let config = CacheConfig::from_lookup(lookup_ttl(" 1500 ")).unwrap();
        assert_eq!(config.default_ttl, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_config_zero_ttl_is_valid() {
        let config = CacheConfig::from_lookup(lookup_ttl("0")).unwrap();
        assert_eq!(config.default_ttl, Some(Duration::ZERO));
    }

    #[test]
    fn test_config_empty_value_is_unbounded() {
        let config = CacheConfig::from_lookup(lookup_ttl("  ")).unwrap();
        assert_eq!(config.default_ttl, None);
    }

    #[test]
    fn test_config_invalid_value() {
        let err = CacheConfig::from_lookup(lookup_ttl("-5")).unwrap_err();

        assert!(matches!(
            &err,
            ConfigError::InvalidValue { var: DEFAULT_TTL_ENV, value, .. } if value == "-5"
        ));
        assert!(err.to_string().contains(DEFAULT_TTL_ENV));
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env var to test defaults
        env::remove_var(DEFAULT_TTL_ENV);

        let config = CacheConfig::from_env().unwrap();
        assert_eq!(config.default_ttl, None);
    }
}
