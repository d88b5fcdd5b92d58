//! Configuration Module
//!
//! Handles loading and validating cache configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::cache::DEFAULT_CLEANUP_PERIOD;
use crate::error::{CacheError, Result};

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Minimum time between two sweeps of expired entries
    pub cleanup_period: Duration,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CLEANUP_PERIOD_SECS` - Sweep period in seconds (default: 600)
    pub fn from_env() -> Self {
        Self {
            cleanup_period: env::var("CACHE_CLEANUP_PERIOD_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_CLEANUP_PERIOD),
        }
    }

    /// Checks that the configuration can back a cache.
    pub fn validate(&self) -> Result<()> {
        if self.cleanup_period.is_zero() {
            return Err(CacheError::InvalidConfig(
                "cleanup period must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cleanup_period: DEFAULT_CLEANUP_PERIOD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.cleanup_period, Duration::from_secs(600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_env() {
        // Single test touches the variable to avoid races between test threads
        env::remove_var("CACHE_CLEANUP_PERIOD_SECS");
        assert_eq!(CacheConfig::from_env().cleanup_period, DEFAULT_CLEANUP_PERIOD);

        env::set_var("CACHE_CLEANUP_PERIOD_SECS", "42");
        assert_eq!(CacheConfig::from_env().cleanup_period, Duration::from_secs(42));

        env::set_var("CACHE_CLEANUP_PERIOD_SECS", "not-a-number");
        assert_eq!(CacheConfig::from_env().cleanup_period, DEFAULT_CLEANUP_PERIOD);

        env::remove_var("CACHE_CLEANUP_PERIOD_SECS");
    }

    #[test]
    fn test_config_rejects_zero_period() {
        let config = CacheConfig {
            cleanup_period: Duration::ZERO,
        };
        assert!(matches!(
            config.validate(),
            Err(CacheError::InvalidConfig(_))
        ));
    }
}
