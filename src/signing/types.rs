use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use async_trait::async_trait;

use crate::message::{MilestoneIndex, MilestonePublicKey, MilestoneSignature};
use super::error::{SignerError, SigningError};

/// Set of public keys a quorum accepts
pub type PublicKeySet = HashSet<MilestonePublicKey>;

/// Membership test over the keys a quorum expects
pub trait KeyPredicate: Send + Sync {
    fn is_expected(&self, key: &MilestonePublicKey) -> bool;
}

impl KeyPredicate for HashSet<MilestonePublicKey> {
    fn is_expected(&self, key: &MilestonePublicKey) -> bool {
        self.contains(key)
    }
}

impl KeyPredicate for BTreeSet<MilestonePublicKey> {
    fn is_expected(&self, key: &MilestonePublicKey) -> bool {
        self.contains(key)
    }
}

impl KeyPredicate for Vec<MilestonePublicKey> {
    fn is_expected(&self, key: &MilestonePublicKey) -> bool {
        self.contains(key)
    }
}

/// Single-attempt signing primitive.
///
/// Returns one signature per public key, in the order of `public_keys`.
#[async_trait]
pub trait MilestoneSigningFunc: Send + Sync {
    async fn sign(
        &self,
        public_keys: &[MilestonePublicKey],
        essence: &[u8],
    ) -> Result<Vec<MilestoneSignature>, SigningError>;
}

/// Quorum signer bound to one milestone index
pub trait MilestoneIndexSigner: Send + Sync {
    /// Index this signer was created for
    fn index(&self) -> MilestoneIndex;

    /// Public keys that sign the milestone, sorted ascending
    fn public_keys(&self) -> Vec<MilestonePublicKey>;

    /// Keys whose signatures count toward the quorum
    fn expected_keys(&self) -> &dyn KeyPredicate;

    /// Minimum number of valid signatures
    fn required_signatures(&self) -> usize;

    /// Base signing function, without retries
    fn signing_func(&self) -> Arc<dyn MilestoneSigningFunc>;
}

/// Source of per-index quorum signers. Quorum membership may change between
/// indices.
pub trait SignerProvider: Send + Sync {
    fn signer_for_index(
        &self,
        index: MilestoneIndex,
    ) -> Result<Arc<dyn MilestoneIndexSigner>, SignerError>;
}
