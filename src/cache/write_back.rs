use std::hash::Hash;

use lru::LruCache;
use metrics::{counter, gauge};
use parking_lot::Mutex;
use tracing::{debug, error, info};

use super::error::CacheError;
use super::store::PersistBatch;
use super::{CacheConfig, CacheStats};

struct Entries<K: Hash + Eq, V> {
    lru: LruCache<K, V>,
    stats: CacheStats,
}

/// Bounded LRU cache that writes entries back to durable storage when they
/// leave it.
///
/// Every removal except [`discard_without_persist`](Self::discard_without_persist)
/// hands the removed values to the persister first, and only drops them once
/// the persister reports success. A single lock covers selection, persistence
/// and removal, so no other mutation observes a half-evicted batch.
pub struct WriteBackCache<K: Hash + Eq, V, P> {
    entries: Mutex<Entries<K, V>>,
    config: CacheConfig,
    persister: P,
}

impl<K, V, P> WriteBackCache<K, V, P>
where
    K: Hash + Eq + Clone,
    V: Clone,
    P: PersistBatch<V>,
{
    pub fn new(config: CacheConfig, persister: P) -> Result<Self, CacheError> {
        config.validate().map_err(CacheError::InvalidConfig)?;

        gauge!("write_back_cache.capacity", config.size as f64);
        gauge!("write_back_cache.entries", 0.0);

        Ok(Self {
            entries: Mutex::new(Entries {
                lru: LruCache::unbounded(),
                stats: CacheStats {
                    capacity: config.size,
                    ..Default::default()
                },
            }),
            config,
            persister,
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Insert or update an entry, making it the most recently used.
    ///
    /// If the cache then exceeds its capacity, the least recently used batch
    /// is persisted and removed before this call returns. On persistence
    /// failure the batch stays cached and the error is returned.
    pub fn put(&self, key: K, value: V) -> Result<Option<V>, CacheError> {
        let mut entries = self.entries.lock();
        let previous = entries.lru.put(key, value);
        let evicted = self.evict_overflow(&mut entries);
        gauge!("write_back_cache.entries", entries.lru.len() as f64);
        evicted.map(|()| previous)
    }

    /// Look up an entry and mark it as most recently used
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock();
        let value = entries.lru.get(key).cloned();
        match value {
            Some(_) => entries.stats.hits += 1,
            None => entries.stats.misses += 1,
        }
        value
    }

    /// Look up an entry without touching its recency
    pub fn peek(&self, key: &K) -> Option<V> {
        self.entries.lock().lru.peek(key).cloned()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.lock().lru.contains(key)
    }

    /// Remove an entry without persisting it
    pub fn discard_without_persist(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock();
        let removed = entries.lru.pop(key);
        if removed.is_some() {
            entries.stats.discarded += 1;
            gauge!("write_back_cache.entries", entries.lru.len() as f64);
        }
        removed
    }

    /// Persist and remove every entry, least recently used first, in batches
    /// of the configured eviction size.
    ///
    /// Returns the number of flushed entries. If a batch fails to persist, it
    /// and everything more recent stays cached.
    pub fn flush_all(&self) -> Result<usize, CacheError> {
        let mut entries = self.entries.lock();
        let mut flushed = 0;

        while !entries.lru.is_empty() {
            let batch = lru_batch(&entries.lru, self.config.eviction_size);
            let result = self.persist_then_remove(&mut entries, batch);
            gauge!("write_back_cache.entries", entries.lru.len() as f64);

            // counted per batch so earlier batches survive a later failure
            let persisted = result?;
            entries.stats.flushed += persisted as u64;
            flushed += persisted;
        }

        info!(flushed, "write-back cache flushed");
        Ok(flushed)
    }

    /// Keys from least to most recently used
    pub fn keys(&self) -> Vec<K> {
        self.entries
            .lock()
            .lru
            .iter()
            .rev()
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().lru.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.config.size
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock();
        CacheStats {
            entries: entries.lru.len(),
            ..entries.stats.clone()
        }
    }

    fn evict_overflow(&self, entries: &mut Entries<K, V>) -> Result<(), CacheError> {
        while entries.lru.len() > self.config.size {
            let batch = lru_batch(&entries.lru, self.config.eviction_size);
            let evicted = self.persist_then_remove(entries, batch)?;
            entries.stats.evicted_batches += 1;
            entries.stats.evicted_entries += evicted as u64;
            counter!("write_back_cache.evicted", evicted as u64);
            debug!(evicted, remaining = entries.lru.len(), "evicted batch from write-back cache");
        }
        Ok(())
    }

    fn persist_then_remove(
        &self,
        entries: &mut Entries<K, V>,
        batch: Vec<(K, V)>,
    ) -> Result<usize, CacheError> {
        let (keys, values): (Vec<K>, Vec<V>) = batch.into_iter().unzip();

        if let Err(source) = self.persister.persist(&values) {
            entries.stats.persist_failures += 1;
            counter!("write_back_cache.persist_failures", 1);
            error!(
                batch_size = values.len(),
                error = %source,
                "failed to persist batch, entries stay cached"
            );
            return Err(CacheError::PersistenceFailed {
                batch_size: values.len(),
                source,
            });
        }

        for key in &keys {
            entries.lru.pop(key);
        }
        Ok(keys.len())
    }
}

/// Up to `size` least recently used entries, oldest first
fn lru_batch<K, V>(lru: &LruCache<K, V>, size: usize) -> Vec<(K, V)>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    lru.iter()
        .rev()
        .take(size)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
