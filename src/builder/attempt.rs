use std::fmt;
use std::time::Instant;

use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::message::{MilestoneIndex, SealedMessage};
use super::error::IssuanceError;

/// Stages of a single issuance attempt.
///
/// Milestones go `Building → Signing → Verifying → SealingPow → Sealed`,
/// checkpoints skip straight from `Building` to `SealingPow`. Any
/// non-terminal stage may fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssuanceStage {
    Building,
    Signing,
    Verifying,
    SealingPow,
    Sealed,
    Failed,
}

impl IssuanceStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, IssuanceStage::Sealed | IssuanceStage::Failed)
    }

    /// Whether `next` is a legal forward transition from this stage
    pub fn can_advance_to(self, next: IssuanceStage) -> bool {
        use IssuanceStage::*;

        match (self, next) {
            (from, Failed) => !from.is_terminal(),
            (Building, Signing) | (Building, SealingPow) => true,
            (Signing, Verifying) => true,
            (Verifying, SealingPow) => true,
            (SealingPow, Sealed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for IssuanceStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IssuanceStage::Building => "building",
            IssuanceStage::Signing => "signing",
            IssuanceStage::Verifying => "verifying",
            IssuanceStage::SealingPow => "sealing_pow",
            IssuanceStage::Sealed => "sealed",
            IssuanceStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What an attempt issues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssuanceKind {
    Checkpoint,
    Milestone(MilestoneIndex),
}

impl fmt::Display for IssuanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssuanceKind::Checkpoint => f.write_str("checkpoint"),
            IssuanceKind::Milestone(index) => write!(f, "milestone {}", index),
        }
    }
}

/// Tracks one attempt through its stages
#[derive(Debug)]
pub(crate) struct IssuanceAttempt {
    id: Uuid,
    kind: IssuanceKind,
    stage: IssuanceStage,
    started: Instant,
}

impl IssuanceAttempt {
    pub(crate) fn new(kind: IssuanceKind) -> Self {
        let id = Uuid::new_v4();
        debug!(attempt = %id, %kind, "issuance attempt started");
        Self {
            id,
            kind,
            stage: IssuanceStage::Building,
            started: Instant::now(),
        }
    }

    pub(crate) fn stage(&self) -> IssuanceStage {
        self.stage
    }

    pub(crate) fn advance(&mut self, next: IssuanceStage) {
        debug_assert!(
            self.stage.can_advance_to(next),
            "illegal issuance transition {} -> {}",
            self.stage,
            next
        );
        trace!(
            attempt = %self.id,
            kind = %self.kind,
            from = %self.stage,
            to = %next,
            "issuance stage"
        );
        self.stage = next;
    }

    pub(crate) fn fail(&mut self, error: IssuanceError) -> IssuanceError {
        warn!(
            attempt = %self.id,
            kind = %self.kind,
            stage = %self.stage,
            error = %error,
            "issuance attempt failed"
        );
        self.advance(IssuanceStage::Failed);
        error
    }

    pub(crate) fn seal(&mut self, message: &SealedMessage) {
        self.advance(IssuanceStage::Sealed);
        info!(
            attempt = %self.id,
            kind = %self.kind,
            message_id = %message.id(),
            nonce = message.message().nonce,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "issued message"
        );
    }
}
