use std::fmt;

use parity_scale_codec::{Decode, Encode};
use scale_info::TypeInfo;
use serde::{Deserialize, Serialize};

/// Length of a message identifier in bytes
pub const MESSAGE_ID_LENGTH: usize = 32;
/// Length of the white-flag inclusion merkle root
pub const MERKLE_ROOT_LENGTH: usize = 32;
/// Length of an ed25519 public key
pub const PUBLIC_KEY_LENGTH: usize = 32;
/// Length of an ed25519 signature
pub const SIGNATURE_LENGTH: usize = 64;
/// Length of a legacy tail transaction hash referenced by a receipt
pub const TAIL_TRANSACTION_HASH_LENGTH: usize = 49;

/// Milestone index. Successive milestones carry strictly increasing indices.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
    Encode, Decode, TypeInfo, Serialize, Deserialize,
)]
pub struct MilestoneIndex(pub u32);

impl MilestoneIndex {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    /// Index following this one, `None` on overflow
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl From<u32> for MilestoneIndex {
    fn from(index: u32) -> Self {
        Self(index)
    }
}

impl fmt::Display for MilestoneIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a message: the SHA-256 digest of its wire bytes
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
    Encode, Decode, TypeInfo, Serialize, Deserialize,
)]
pub struct MessageId(pub [u8; MESSAGE_ID_LENGTH]);

impl MessageId {
    pub const fn new(bytes: [u8; MESSAGE_ID_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; MESSAGE_ID_LENGTH] {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// White-flag inclusion merkle root, computed outside of this crate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Encode, Decode, TypeInfo)]
pub struct MerkleRoot(pub [u8; MERKLE_ROOT_LENGTH]);

impl fmt::Display for MerkleRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Ed25519 public key of a quorum member
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
    Encode, Decode, TypeInfo,
)]
pub struct MilestonePublicKey(pub [u8; PUBLIC_KEY_LENGTH]);

impl MilestonePublicKey {
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.0
    }
}

impl fmt::Display for MilestonePublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Signature share over a milestone essence, tagged with the signing key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, TypeInfo)]
pub struct MilestoneSignature {
    /// Key that produced the signature
    pub public_key: MilestonePublicKey,
    /// Raw ed25519 signature bytes
    pub signature: [u8; SIGNATURE_LENGTH],
}

impl MilestoneSignature {
    pub fn new(public_key: MilestonePublicKey, signature: [u8; SIGNATURE_LENGTH]) -> Self {
        Self { public_key, signature }
    }
}

/// Funds migrated from the legacy network, listed in a receipt
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, TypeInfo)]
pub struct MigratedFundsEntry {
    /// Tail transaction hash of the legacy bundle
    pub tail_transaction_hash: [u8; TAIL_TRANSACTION_HASH_LENGTH],
    /// Ed25519 address receiving the funds
    pub address: [u8; 32],
    /// Migrated amount
    pub deposit: u64,
}

/// Receipt of legacy funds migration carried by a milestone
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, TypeInfo)]
pub struct Receipt {
    /// Legacy milestone index the funds were migrated at
    pub migrated_at: MilestoneIndex,
    /// Whether this is the last receipt for `migrated_at`
    pub last: bool,
    /// Migrated funds, ordered by tail transaction hash
    pub funds: Vec<MigratedFundsEntry>,
}

/// Signed part of a milestone payload
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, TypeInfo)]
pub struct MilestoneEssence {
    /// Milestone index
    pub index: MilestoneIndex,
    /// Issuance time in unix seconds
    pub timestamp: u64,
    /// Parents of the message carrying the milestone
    pub parents: Vec<MessageId>,
    /// White-flag inclusion merkle root
    pub inclusion_merkle_root: MerkleRoot,
    /// Public keys expected to sign, in signing order
    pub public_keys: Vec<MilestonePublicKey>,
    /// Optional migration receipt
    pub receipt: Option<Receipt>,
}

impl MilestoneEssence {
    /// Bytes covered by the milestone signatures
    pub fn signing_bytes(&self) -> Vec<u8> {
        self.encode()
    }
}

/// Milestone payload: essence plus the collected signatures
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, TypeInfo)]
pub struct MilestonePayload {
    pub essence: MilestoneEssence,
    pub signatures: Vec<MilestoneSignature>,
}

impl MilestonePayload {
    /// Create an unsigned milestone payload
    pub fn new(
        index: MilestoneIndex,
        timestamp: u64,
        parents: Vec<MessageId>,
        inclusion_merkle_root: MerkleRoot,
        public_keys: Vec<MilestonePublicKey>,
        receipt: Option<Receipt>,
    ) -> Self {
        Self {
            essence: MilestoneEssence {
                index,
                timestamp,
                parents,
                inclusion_merkle_root,
                public_keys,
                receipt,
            },
            signatures: Vec::new(),
        }
    }

    pub fn index(&self) -> MilestoneIndex {
        self.essence.index
    }

    pub fn is_signed(&self) -> bool {
        !self.signatures.is_empty()
    }
}

/// Payloads a message can carry
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, TypeInfo)]
pub enum Payload {
    #[codec(index = 1)]
    Milestone(MilestonePayload),
}

/// Network message. Checkpoints carry no payload.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, TypeInfo)]
pub struct Message {
    /// Network the message belongs to
    pub network_id: u64,
    /// Referenced parent messages
    pub parents: Vec<MessageId>,
    /// Optional payload
    pub payload: Option<Payload>,
    /// Proof-of-work nonce
    pub nonce: u64,
}

impl Message {
    /// Create a message skeleton with an unset nonce
    pub fn new(network_id: u64, parents: Vec<MessageId>, payload: Option<Payload>) -> Self {
        Self {
            network_id,
            parents,
            payload,
            nonce: 0,
        }
    }

    pub fn milestone(&self) -> Option<&MilestonePayload> {
        match &self.payload {
            Some(Payload::Milestone(milestone)) => Some(milestone),
            None => None,
        }
    }

    pub fn is_checkpoint(&self) -> bool {
        self.payload.is_none()
    }
}
