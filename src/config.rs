//! Coordinator configuration.
//!
//! Loaded from JSON. Missing fields fall back to their defaults, and every
//! loaded configuration goes through [`CoordinatorConfig::validate`].
//!
//! ```json
//! {
//!   "network_id": 1454675179895816119,
//!   "pow_worker_count": 4,
//!   "signing": { "retry_amount": 10, "retry_timeout": { "secs": 2, "nanos": 0 } },
//!   "cache": { "size": 1000, "eviction_size": 100 }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::CacheConfig;
use crate::signing::SigningRetryConfig;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings of the milestone issuance engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Network id stamped on every issued message
    pub network_id: u64,
    /// Workers handed to the proof-of-work engine
    pub pow_worker_count: usize,
    /// Signing retry policy
    pub signing: SigningRetryConfig,
    /// Milestone cache sizing
    pub cache: CacheConfig,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            network_id: 0,
            pow_worker_count: 1,
            signing: SigningRetryConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl CoordinatorConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.pow_worker_count == 0 {
            return Err("Proof of work worker count cannot be 0".into());
        }

        self.cache.validate()
    }
}
