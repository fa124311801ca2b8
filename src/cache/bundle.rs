use std::sync::Arc;

use crate::message::{MessageError, MessageId, MilestoneIndex, SealedMessage};
use super::write_back::WriteBackCache;

/// Issued milestone as cached and stored, keyed by its index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    index: MilestoneIndex,
    message: Arc<SealedMessage>,
}

impl Bundle {
    /// Wrap a sealed milestone message
    pub fn from_milestone(message: SealedMessage) -> Result<Self, MessageError> {
        let index = message.milestone_index().ok_or(MessageError::NotAMilestone)?;
        Ok(Self {
            index,
            message: Arc::new(message),
        })
    }

    pub fn index(&self) -> MilestoneIndex {
        self.index
    }

    pub fn message(&self) -> &SealedMessage {
        &self.message
    }

    pub fn message_id(&self) -> MessageId {
        self.message.id()
    }
}

/// Write-back cache of issued milestones
pub type MilestoneCache<P> = WriteBackCache<MilestoneIndex, Bundle, P>;
