//! Structural validation of messages and milestone payloads.
//!
//! These are the syntactic rules every peer applies when it deserializes a
//! message. A message built by this crate that fails them points at a builder
//! defect, never at a transient condition.

use tracing::debug;

use super::error::MessageError;
use super::types::{Message, MessageId, MilestoneEssence, MilestonePayload, Payload, Receipt};

/// Maximum size of an encoded message
pub const MAX_MESSAGE_LENGTH: usize = 32 * 1024;
/// Minimum number of parents of a message
pub const MIN_PARENTS: usize = 1;
/// Maximum number of parents of a message
pub const MAX_PARENTS: usize = 8;
/// Minimum number of public keys (and signatures) in a milestone
pub const MIN_PUBLIC_KEYS: usize = 1;
/// Maximum number of public keys (and signatures) in a milestone
pub const MAX_PUBLIC_KEYS: usize = 255;
/// Minimum number of migrated funds entries in a receipt
pub const MIN_MIGRATED_FUNDS_ENTRIES: usize = 1;
/// Maximum number of migrated funds entries in a receipt
pub const MAX_MIGRATED_FUNDS_ENTRIES: usize = 127;
/// Smallest deposit a migrated funds entry may carry
pub const MIN_MIGRATED_FUNDS_DEPOSIT: u64 = 1_000_000;

/// Decoding mode used when turning raw bytes into a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeserializationMode {
    /// Decode only
    NoValidation,
    /// Decode and enforce every structural rule
    PerformValidation,
}

impl DeserializationMode {
    pub fn validates(self) -> bool {
        matches!(self, DeserializationMode::PerformValidation)
    }
}

/// Validate a complete message, including its payload
pub fn validate_message(message: &Message) -> Result<(), MessageError> {
    validate_parents(&message.parents)?;

    match &message.payload {
        None => Ok(()),
        Some(Payload::Milestone(milestone)) => validate_milestone(milestone, &message.parents),
    }
}

/// Validate the parent list of a message
pub fn validate_parents(parents: &[MessageId]) -> Result<(), MessageError> {
    if !(MIN_PARENTS..=MAX_PARENTS).contains(&parents.len()) {
        return Err(MessageError::InvalidParentCount {
            count: parents.len(),
            min: MIN_PARENTS,
            max: MAX_PARENTS,
        });
    }

    if !is_sorted_unique(parents) {
        return Err(MessageError::ParentsNotSortedUnique);
    }

    Ok(())
}

/// Validate the signed part of a milestone before it is signed
pub fn validate_essence(essence: &MilestoneEssence) -> Result<(), MessageError> {
    validate_parents(&essence.parents)?;

    let count = essence.public_keys.len();
    if !(MIN_PUBLIC_KEYS..=MAX_PUBLIC_KEYS).contains(&count) {
        return Err(MessageError::InvalidPublicKeyCount {
            count,
            min: MIN_PUBLIC_KEYS,
            max: MAX_PUBLIC_KEYS,
        });
    }

    if !is_sorted_unique(&essence.public_keys) {
        return Err(MessageError::PublicKeysNotSortedUnique);
    }

    if let Some(receipt) = &essence.receipt {
        validate_receipt(receipt)?;
    }

    Ok(())
}

/// Validate a signed milestone carried by a message with the given parents
pub fn validate_milestone(
    milestone: &MilestonePayload,
    message_parents: &[MessageId],
) -> Result<(), MessageError> {
    validate_essence(&milestone.essence)?;

    if milestone.essence.parents != message_parents {
        return Err(MessageError::MilestoneParentsMismatch);
    }

    if milestone.signatures.len() != milestone.essence.public_keys.len() {
        debug!(
            index = %milestone.index(),
            signatures = milestone.signatures.len(),
            public_keys = milestone.essence.public_keys.len(),
            "milestone signature count mismatch"
        );
        return Err(MessageError::SignatureCountMismatch {
            signatures: milestone.signatures.len(),
            public_keys: milestone.essence.public_keys.len(),
        });
    }

    Ok(())
}

/// Validate a migration receipt
pub fn validate_receipt(receipt: &Receipt) -> Result<(), MessageError> {
    let count = receipt.funds.len();
    if !(MIN_MIGRATED_FUNDS_ENTRIES..=MAX_MIGRATED_FUNDS_ENTRIES).contains(&count) {
        return Err(MessageError::InvalidReceipt(format!(
            "{} migrated funds entries, expected {}..={}",
            count, MIN_MIGRATED_FUNDS_ENTRIES, MAX_MIGRATED_FUNDS_ENTRIES
        )));
    }

    if let Some(entry) = receipt
        .funds
        .iter()
        .find(|entry| entry.deposit < MIN_MIGRATED_FUNDS_DEPOSIT)
    {
        return Err(MessageError::InvalidReceipt(format!(
            "deposit {} below minimum {}",
            entry.deposit, MIN_MIGRATED_FUNDS_DEPOSIT
        )));
    }

    let sorted = receipt
        .funds
        .windows(2)
        .all(|pair| pair[0].tail_transaction_hash < pair[1].tail_transaction_hash);
    if !sorted {
        return Err(MessageError::InvalidReceipt(
            "migrated funds must be sorted by tail transaction hash and unique".into(),
        ));
    }

    Ok(())
}

fn is_sorted_unique<T: Ord>(items: &[T]) -> bool {
    items.windows(2).all(|pair| pair[0] < pair[1])
}
