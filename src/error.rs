//! Error types for the cache
//!
//! Provides unified error handling using thiserror. Cache operations
//! themselves are total; errors only come from configuration and from
//! explicit consistency checks.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// A configuration value could not be used
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The entry and order maps disagree
    #[error("Inconsistent cache state: {0}")]
    Inconsistent(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
