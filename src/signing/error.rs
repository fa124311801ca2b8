use thiserror::Error;

use crate::message::MilestoneIndex;

/// Failures of a single signing attempt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SigningError {
    /// Signing backend rejected or failed the request
    #[error("Signing backend error: {0}")]
    Backend(String),

    /// Signing backend could not be reached
    #[error("Signing backend unavailable: {0}")]
    Unavailable(String),

    /// Backend returned a partial or oversized signature set
    #[error("Expected {expected} signatures, got {actual}")]
    SignatureCountMismatch { expected: usize, actual: usize },
}

impl SigningError {
    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, SigningError::Backend(_) | SigningError::Unavailable(_))
    }
}

/// Failures obtaining the signer bound to a milestone index
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignerError {
    /// No key range covers the index
    #[error("No signer configured for milestone {0}")]
    NoSignerForIndex(MilestoneIndex),

    /// Signer provider failed
    #[error("Signer provider error: {0}")]
    Provider(String),
}

/// Quorum verification failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuorumError {
    /// A quorum needs at least one signature
    #[error("Required signature count must be greater than zero")]
    InvalidThreshold,

    /// Nothing to verify
    #[error("Milestone carries no signatures")]
    NoSignatures,

    /// Too few signatures validated against the expected keys
    #[error("Only {valid} of {required} required signatures are valid ({rejected} rejected)")]
    InsufficientSignatures {
        required: usize,
        valid: usize,
        rejected: usize,
    },
}
