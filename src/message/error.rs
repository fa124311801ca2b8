use thiserror::Error;

/// Message codec and structural validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    /// Encoded message exceeds the protocol size limit
    #[error("Message is {size} bytes, maximum is {max}")]
    MessageTooLarge { size: usize, max: usize },

    /// Bytes could not be decoded into a message
    #[error("Failed to decode message: {0}")]
    Decode(String),

    /// Parent count outside of the allowed range
    #[error("Parent count {count} outside of {min}..={max}")]
    InvalidParentCount { count: usize, min: usize, max: usize },

    /// Parents are not lexically sorted or contain duplicates
    #[error("Parents must be sorted in ascending order and unique")]
    ParentsNotSortedUnique,

    /// Milestone parents differ from the parents of the carrying message
    #[error("Milestone parents do not match message parents")]
    MilestoneParentsMismatch,

    /// Public key count outside of the allowed range
    #[error("Public key count {count} outside of {min}..={max}")]
    InvalidPublicKeyCount { count: usize, min: usize, max: usize },

    /// Public keys are not lexically sorted or contain duplicates
    #[error("Public keys must be sorted in ascending order and unique")]
    PublicKeysNotSortedUnique,

    /// Number of signatures differs from the number of public keys
    #[error("Signature count {signatures} does not match public key count {public_keys}")]
    SignatureCountMismatch { signatures: usize, public_keys: usize },

    /// Receipt violates the migration rules
    #[error("Invalid receipt: {0}")]
    InvalidReceipt(String),

    /// Message was expected to carry a milestone payload
    #[error("Message does not carry a milestone payload")]
    NotAMilestone,
}
