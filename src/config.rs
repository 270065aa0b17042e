//! Configuration Module
//!
//! Handles loading cache configuration from environment variables.

use std::env;

use tracing::warn;

use crate::error::{CacheError, Result};

/// Environment variable holding the cache capacity.
pub const CAPACITY_ENV: &str = "LRU_CAPACITY";

/// Capacity used when none is configured.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Cache configuration parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold. Zero keeps nothing.
    pub capacity: usize,
}

impl CacheConfig {
    /// Loads the configuration, falling back to defaults when a value is
    /// missing or malformed.
    ///
    /// # Environment Variables
    /// - `LRU_CAPACITY` - Maximum cache entries (default: 1000)
    pub fn from_env() -> Self {
        match Self::try_from_env() {
            Ok(config) => config,
            Err(err) => {
                warn!(error = %err, "falling back to default cache configuration");
                Self::default()
            }
        }
    }

    /// Loads the configuration, rejecting malformed values.
    ///
    /// A missing variable still yields the default.
    pub fn try_from_env() -> Result<Self> {
        match env::var(CAPACITY_ENV) {
            Ok(raw) => Self::parse_capacity(&raw).map(|capacity| Self { capacity }),
            Err(env::VarError::NotPresent) => Ok(Self::default()),
            Err(env::VarError::NotUnicode(_)) => Err(CacheError::InvalidConfig(format!(
                "{} is not valid unicode",
                CAPACITY_ENV
            ))),
        }
    }

    fn parse_capacity(raw: &str) -> Result<usize> {
        raw.trim().parse().map_err(|_| {
            CacheError::InvalidConfig(format!(
                "{} must be a non-negative integer, got {:?}",
                CAPACITY_ENV, raw
            ))
        })
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}
