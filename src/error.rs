//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
///
/// Cache operations themselves never fail; supplier failures are returned
/// to the caller in the supplier's own error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Configuration value rejected at construction
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_message() {
        let err = CacheError::InvalidConfig("cleanup period must be non-zero".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid configuration: cleanup period must be non-zero"
        );
    }
}
