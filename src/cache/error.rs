use thiserror::Error;

use super::store::StoreError;

/// Write-back cache errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// Cache configuration rejected
    #[error("Invalid cache configuration: {0}")]
    InvalidConfig(String),

    /// An evicted or flushed batch could not be made durable. The batch is
    /// still cached; issuance must halt.
    #[error("Failed to persist batch of {batch_size} entries: {source}")]
    PersistenceFailed {
        batch_size: usize,
        #[source]
        source: StoreError,
    },
}

impl CacheError {
    /// Whether the error must stop further issuance
    pub fn is_fatal(&self) -> bool {
        matches!(self, CacheError::PersistenceFailed { .. })
    }
}
