/*!
# Error Module

Crate-level error type aggregating the per-module errors.

## Classification

- [`Error::is_fatal`]: the error halts the coordinator. Only persistence
  failures of the milestone cache are fatal, because the affected milestones
  exist nowhere but in memory.
- [`Error::Unpersisted`] carries a milestone that was sealed and cached even
  though the cache failed to persist an older batch. The driver still owns
  broadcasting it; see [`Error::unpersisted_bundle`].
- [`Error::is_retryable`]: a fresh issuance attempt may succeed. Transient
  signing and proof-of-work failures qualify; quorum and structural failures
  do not, and neither does anything after a halt.
*/

use thiserror::Error;

use crate::builder::IssuanceError;
use crate::cache::{Bundle, CacheError, StoreError};
use crate::config::ConfigError;
use crate::message::MessageError;

/// Core coordinator error type
#[derive(Error, Debug)]
pub enum Error {
    /// Checkpoint or milestone construction failed
    #[error("Issuance error: {0}")]
    Issuance(#[from] IssuanceError),

    /// Milestone cache error
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Milestone was issued and cached, but the cache failed to persist an
    /// eviction batch
    #[error("Milestone {} cached but eviction failed: {source}", bundle.index())]
    Unpersisted {
        bundle: Box<Bundle>,
        #[source]
        source: CacheError,
    },

    /// Durable store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Message error outside of issuance
    #[error("Message error: {0}")]
    Message(#[from] MessageError),

    /// Issuance stopped after a fatal error
    #[error("Issuance halted: {0}")]
    Halted(String),
}

impl Error {
    /// Check if the error must stop further issuance
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::Cache(e) | Error::Unpersisted { source: e, .. } => e.is_fatal(),
            Error::Halted(_) => true,
            _ => false,
        }
    }

    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Issuance(e) => e.is_retryable(),
            Error::Store(StoreError::Io(_)) => true,
            Error::Store(_) => false,
            Error::Cache(_) | Error::Unpersisted { .. } => false,
            Error::Config(_) => false,
            Error::Message(_) => false,
            Error::Halted(_) => false,
        }
    }

    /// Milestone that was issued despite the error, if any
    pub fn unpersisted_bundle(&self) -> Option<&Bundle> {
        match self {
            Error::Unpersisted { bundle, .. } => Some(&**bundle),
            _ => None,
        }
    }
}
