use std::sync::Arc;

use milestone_coordinator::cache::{
    Bundle, CacheConfig, CacheError, MilestoneCache, PersistBatch, StoreError, WriteBackCache,
};
use milestone_coordinator::message::MilestoneIndex;
use mockall::{mock, Sequence};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::common::{self, RecordingStore};

mock! {
    pub Persister {}

    impl PersistBatch<Bundle> for Persister {
        fn persist(&self, batch: &[Bundle]) -> Result<(), StoreError>;
    }
}

fn indices(batch: &[Bundle]) -> Vec<u32> {
    batch.iter().map(|bundle| bundle.index().get()).collect()
}

fn config(size: usize, eviction_size: usize) -> CacheConfig {
    CacheConfig { size, eviction_size }
}

#[test]
fn test_overflow_persists_oldest_entry_once() {
    common::init_logging();

    let mut persister = MockPersister::new();
    persister
        .expect_persist()
        .withf(|batch| indices(batch) == vec![1])
        .times(1)
        .returning(|_| Ok(()));

    let cache = MilestoneCache::new(config(2, 1), persister).unwrap();
    for index in 1..=3 {
        cache.put(MilestoneIndex(index), common::bundle(index)).unwrap();
    }

    assert_eq!(cache.keys(), vec![MilestoneIndex(2), MilestoneIndex(3)]);
    assert!(!cache.contains(&MilestoneIndex(1)));
}

#[test]
fn test_batches_follow_lru_order() {
    let mut persister = MockPersister::new();
    let mut seq = Sequence::new();
    for expected in [vec![1, 2], vec![3, 4]] {
        persister
            .expect_persist()
            .withf(move |batch| indices(batch) == expected)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
    }

    let cache = MilestoneCache::new(config(3, 2), persister).unwrap();
    for index in 1..=6 {
        cache.put(MilestoneIndex(index), common::bundle(index)).unwrap();
    }

    assert_eq!(
        cache.keys(),
        vec![MilestoneIndex(5), MilestoneIndex(6)]
    );
    assert_eq!(cache.stats().evicted_entries, 4);
}

#[test]
fn test_discard_never_persists() {
    let mut persister = MockPersister::new();
    persister
        .expect_persist()
        .withf(|batch| !indices(batch).contains(&2))
        .returning(|_| Ok(()));

    let cache = MilestoneCache::new(config(2, 1), persister).unwrap();
    cache.put(MilestoneIndex(1), common::bundle(1)).unwrap();
    cache.put(MilestoneIndex(2), common::bundle(2)).unwrap();

    let discarded = cache.discard_without_persist(&MilestoneIndex(2)).unwrap();
    assert_eq!(discarded.index(), MilestoneIndex(2));
    assert!(cache.discard_without_persist(&MilestoneIndex(2)).is_none());

    for index in 3..=5 {
        cache.put(MilestoneIndex(index), common::bundle(index)).unwrap();
    }
    cache.flush_all().unwrap();
    assert_eq!(cache.stats().discarded, 1);
}

#[test]
fn test_failed_eviction_keeps_batch_cached() {
    let store = Arc::new(RecordingStore::new());
    let cache = MilestoneCache::new(config(2, 1), Arc::clone(&store)).unwrap();

    cache.put(MilestoneIndex(1), common::bundle(1)).unwrap();
    cache.put(MilestoneIndex(2), common::bundle(2)).unwrap();

    store.set_failing(true);
    let err = cache.put(MilestoneIndex(3), common::bundle(3)).unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err, CacheError::PersistenceFailed { batch_size: 1, .. }));
    assert_eq!(cache.len(), 3);
    assert!(cache.contains(&MilestoneIndex(1)));
    assert_eq!(cache.stats().persist_failures, 1);

    store.set_failing(false);
    cache.put(MilestoneIndex(4), common::bundle(4)).unwrap();
    assert_eq!(store.batches(), vec![vec![1], vec![2]]);
    assert_eq!(cache.keys(), vec![MilestoneIndex(3), MilestoneIndex(4)]);
}

#[test]
fn test_flush_all_persists_everything_in_lru_order() {
    let store = Arc::new(RecordingStore::new());
    let cache = MilestoneCache::new(config(5, 2), Arc::clone(&store)).unwrap();

    for index in 1..=5 {
        cache.put(MilestoneIndex(index), common::bundle(index)).unwrap();
    }
    cache.get(&MilestoneIndex(1));

    assert_eq!(cache.flush_all().unwrap(), 5);
    assert!(cache.is_empty());
    assert_eq!(store.batches(), vec![vec![2, 3], vec![4, 5], vec![1]]);
    assert_eq!(store.inner().len(), 5);
}

#[test]
fn test_reads_track_hits_and_misses() {
    let store = Arc::new(RecordingStore::new());
    let cache = MilestoneCache::new(config(4, 1), store).unwrap();
    cache.put(MilestoneIndex(1), common::bundle(1)).unwrap();

    assert!(cache.get(&MilestoneIndex(1)).is_some());
    assert!(cache.get(&MilestoneIndex(2)).is_none());
    assert!(cache.peek(&MilestoneIndex(1)).is_some());

    let stats = cache.stats();
    assert_eq!((stats.hits, stats.misses), (1, 1));
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.capacity, 4);
}

#[derive(Default)]
struct Recorder {
    batches: Mutex<Vec<Vec<u32>>>,
}

impl PersistBatch<u32> for Recorder {
    fn persist(&self, batch: &[u32]) -> Result<(), StoreError> {
        self.batches.lock().push(batch.to_vec());
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Op {
    Put(u32),
    Get(u32),
    Peek(u32),
    Discard(u32),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u32..24).prop_map(Op::Put),
        2 => (0u32..24).prop_map(Op::Get),
        1 => (0u32..24).prop_map(Op::Peek),
        1 => (0u32..24).prop_map(Op::Discard),
    ]
}

proptest! {
    #[test]
    fn prop_matches_lru_model(
        size in 1usize..8,
        eviction_ratio in 0.0f64..1.0,
        ops in prop::collection::vec(op(), 0..120),
    ) {
        let eviction_size = 1 + ((size - 1) as f64 * eviction_ratio) as usize;
        let recorder = Arc::new(Recorder::default());
        let cache =
            WriteBackCache::new(config(size, eviction_size), Arc::clone(&recorder)).unwrap();

        // least recently used first
        let mut model: Vec<u32> = Vec::new();
        let mut expected_batches: Vec<Vec<u32>> = Vec::new();

        for op in ops {
            match op {
                Op::Put(key) => {
                    model.retain(|k| *k != key);
                    model.push(key);
                    while model.len() > size {
                        let take = eviction_size.min(model.len());
                        expected_batches.push(model.drain(..take).collect());
                    }
                    cache.put(key, key).unwrap();
                }
                Op::Get(key) => {
                    if let Some(pos) = model.iter().position(|k| *k == key) {
                        let k = model.remove(pos);
                        model.push(k);
                    }
                    prop_assert_eq!(cache.get(&key).is_some(), model.contains(&key));
                }
                Op::Peek(key) => {
                    prop_assert_eq!(cache.peek(&key), model.contains(&key).then_some(key));
                }
                Op::Discard(key) => {
                    model.retain(|k| *k != key);
                    cache.discard_without_persist(&key);
                }
            }
        }

        prop_assert_eq!(cache.keys(), model);
        prop_assert!(expected_batches.iter().all(|batch| batch.len() == eviction_size));
        prop_assert_eq!(recorder.batches.lock().clone(), expected_batches);
    }
}
