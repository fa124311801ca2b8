use thiserror::Error;

use crate::message::{MessageError, MilestoneIndex};
use crate::pow::PowError;
use crate::signing::{QuorumError, SignerError, SigningError};
use super::attempt::IssuanceStage;

/// Reasons an issuance attempt ended in `Failed`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IssuanceError {
    /// Signer provider had no signer for the index
    #[error("No signer for milestone {index}: {source}")]
    Signer {
        index: MilestoneIndex,
        #[source]
        source: SignerError,
    },

    /// System clock reads earlier than the unix epoch
    #[error("System clock is before the unix epoch by {0:?}")]
    Clock(std::time::Duration),

    /// Assembled payload violates the structural rules before signing
    #[error("Invalid milestone payload: {0}")]
    Payload(#[source] MessageError),

    /// Signing failed after the retry budget was spent
    #[error("Milestone signing failed: {0}")]
    Signing(#[source] SigningError),

    /// Collected signatures did not reach the quorum
    #[error("Milestone signature verification failed: {0}")]
    Quorum(#[source] QuorumError),

    /// Proof-of-work engine returned an error
    #[error("Proof of work failed: {0}")]
    ProofOfWork(#[source] PowError),

    /// Proof-of-work task never reported back
    #[error("Proof of work task aborted: {0}")]
    PowAborted(String),

    /// Sealed message failed structural validation
    #[error("Message validation failed: {0}")]
    Validation(#[source] MessageError),
}

impl IssuanceError {
    /// Stage the attempt was in when it failed
    pub fn stage(&self) -> IssuanceStage {
        match self {
            IssuanceError::Signer { .. } | IssuanceError::Clock(_) | IssuanceError::Payload(_) => {
                IssuanceStage::Building
            }
            IssuanceError::Signing(_) => IssuanceStage::Signing,
            IssuanceError::Quorum(_) => IssuanceStage::Verifying,
            IssuanceError::ProofOfWork(_)
            | IssuanceError::PowAborted(_)
            | IssuanceError::Validation(_) => IssuanceStage::SealingPow,
        }
    }

    /// Whether the driver may re-attempt the whole issuance
    pub fn is_retryable(&self) -> bool {
        match self {
            IssuanceError::Signer { source, .. } => matches!(source, SignerError::Provider(_)),
            IssuanceError::Signing(e) => e.is_retryable(),
            IssuanceError::ProofOfWork(_) | IssuanceError::PowAborted(_) => true,
            IssuanceError::Clock(_)
            | IssuanceError::Payload(_)
            | IssuanceError::Quorum(_)
            | IssuanceError::Validation(_) => false,
        }
    }
}
