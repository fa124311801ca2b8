//! # Milestone Cache
//!
//! Bounded write-back cache of issued milestones.
//!
//! Entries live in memory until the cache overflows, at which point the least
//! recently used batch is persisted to the [`MilestoneStore`] and dropped.
//! Reads refresh recency. Persistence failures leave the batch cached and are
//! reported as fatal, since dropping an unpersisted milestone loses it.
//!
//! ```
//! use std::sync::Arc;
//! use milestone_coordinator::cache::{CacheConfig, InMemoryMilestoneStore, MilestoneCache};
//!
//! let store = Arc::new(InMemoryMilestoneStore::new());
//! let cache = MilestoneCache::new(CacheConfig::default(), Arc::clone(&store)).unwrap();
//! assert!(cache.is_empty());
//! ```

mod bundle;
mod error;
mod store;
mod write_back;

pub use bundle::{Bundle, MilestoneCache};
pub use error::CacheError;
pub use store::{InMemoryMilestoneStore, MilestoneStore, PersistBatch, StoreError};
pub use write_back::WriteBackCache;

use serde::{Deserialize, Serialize};

/// Cache sizing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached entries
    pub size: usize,
    /// Number of entries persisted and removed per eviction
    pub eviction_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            size: 1000,
            eviction_size: 100,
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.size == 0 {
            return Err("Cache size must be greater than 0".into());
        }
        if self.eviction_size == 0 {
            return Err("Eviction size must be greater than 0".into());
        }
        if self.eviction_size > self.size {
            return Err(format!(
                "Eviction size {} exceeds cache size {}",
                self.eviction_size, self.size
            ));
        }
        Ok(())
    }
}

/// Cache counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evicted_batches: u64,
    pub evicted_entries: u64,
    pub flushed: u64,
    pub discarded: u64,
    pub persist_failures: u64,
}
