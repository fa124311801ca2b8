//! # Messages
//!
//! Wire types of the coordinator: checkpoint and milestone messages, the
//! milestone payload with its signed essence, and migration receipts.
//!
//! Messages are encoded with SCALE. A message's id is the SHA-256 digest of
//! its encoding. [`SealedMessage`] pairs a message with its bytes and id and is
//! the only form in which issued messages leave the builder.
//!
//! ## Structural rules
//!
//! - 1..=8 parents, sorted ascending and unique
//! - 1..=255 milestone public keys, sorted ascending and unique
//! - exactly one signature per milestone public key
//! - milestone parents equal the parents of the carrying message
//! - receipts carry 1..=127 sorted funds entries of at least 1Mi each
//!
//! ```rust
//! use milestone_coordinator::message::{DeserializationMode, SealedMessage};
//!
//! fn load(bytes: Vec<u8>) -> Option<SealedMessage> {
//!     SealedMessage::from_bytes(bytes, DeserializationMode::PerformValidation).ok()
//! }
//! ```

mod error;
mod sealed;
mod types;
pub mod validation;

pub use error::MessageError;
pub use sealed::{message_id, SealedMessage};
pub use types::{
    Message, MessageId, MerkleRoot, MigratedFundsEntry, MilestoneEssence, MilestoneIndex,
    MilestonePayload, MilestonePublicKey, MilestoneSignature, Payload, Receipt,
    MERKLE_ROOT_LENGTH, MESSAGE_ID_LENGTH, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH,
    TAIL_TRANSACTION_HASH_LENGTH,
};
pub use validation::DeserializationMode;
