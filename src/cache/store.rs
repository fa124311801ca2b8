use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;
use tracing::trace;

use crate::message::{DeserializationMode, MilestoneIndex, SealedMessage};
use super::bundle::Bundle;

/// Durable storage errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying storage IO failed
    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Storage engine rejected the write
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Stored bytes no longer decode
    #[error("Corrupted entry for milestone {index}: {reason}")]
    Corrupted { index: MilestoneIndex, reason: String },
}

/// Durable sink for evicted cache batches.
///
/// `persist` returns only once the whole batch is durable.
pub trait PersistBatch<V>: Send + Sync {
    fn persist(&self, batch: &[V]) -> Result<(), StoreError>;
}

impl<V, P> PersistBatch<V> for Arc<P>
where
    P: PersistBatch<V> + ?Sized,
{
    fn persist(&self, batch: &[V]) -> Result<(), StoreError> {
        (**self).persist(batch)
    }
}

/// Durable milestone storage
pub trait MilestoneStore: PersistBatch<Bundle> {
    fn load_milestone(&self, index: MilestoneIndex) -> Result<Option<Bundle>, StoreError>;
}

impl<S> MilestoneStore for Arc<S>
where
    S: MilestoneStore + ?Sized,
{
    fn load_milestone(&self, index: MilestoneIndex) -> Result<Option<Bundle>, StoreError> {
        (**self).load_milestone(index)
    }
}

/// Milestone store keeping wire bytes in memory
#[derive(Debug, Default)]
pub struct InMemoryMilestoneStore {
    milestones: RwLock<BTreeMap<MilestoneIndex, Vec<u8>>>,
}

impl InMemoryMilestoneStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.milestones.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.milestones.read().is_empty()
    }

    pub fn contains(&self, index: MilestoneIndex) -> bool {
        self.milestones.read().contains_key(&index)
    }

    /// Stored indices in ascending order
    pub fn indices(&self) -> Vec<MilestoneIndex> {
        self.milestones.read().keys().copied().collect()
    }
}

impl PersistBatch<Bundle> for InMemoryMilestoneStore {
    fn persist(&self, batch: &[Bundle]) -> Result<(), StoreError> {
        let mut milestones = self.milestones.write();
        for bundle in batch {
            trace!(index = %bundle.index(), "storing milestone");
            milestones.insert(bundle.index(), bundle.message().bytes().to_vec());
        }
        Ok(())
    }
}

impl MilestoneStore for InMemoryMilestoneStore {
    fn load_milestone(&self, index: MilestoneIndex) -> Result<Option<Bundle>, StoreError> {
        let Some(bytes) = self.milestones.read().get(&index).cloned() else {
            return Ok(None);
        };

        let corrupted = |reason: String| StoreError::Corrupted { index, reason };
        let message = SealedMessage::from_bytes(bytes, DeserializationMode::NoValidation)
            .map_err(|e| corrupted(e.to_string()))?;
        let bundle = Bundle::from_milestone(message).map_err(|e| corrupted(e.to_string()))?;
        if bundle.index() != index {
            return Err(corrupted(format!("entry holds milestone {}", bundle.index())));
        }

        Ok(Some(bundle))
    }
}
