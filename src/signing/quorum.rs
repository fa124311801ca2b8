use std::collections::HashSet;

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use tracing::debug;

use crate::message::{MilestonePayload, MilestonePublicKey, MilestoneSignature};
use super::error::QuorumError;
use super::types::KeyPredicate;

/// Why a signature did not count toward the quorum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Signer is not part of the expected key set
    UnexpectedKey,
    /// Signer already contributed a counted signature
    DuplicateKey,
    /// Key bytes are not a valid ed25519 point
    MalformedKey,
    /// Signature does not verify over the essence
    InvalidSignature,
}

/// Outcome of a successful quorum check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuorumReport {
    /// Signatures that counted toward the quorum
    pub valid: usize,
    /// Signatures that were ignored, with the reason
    pub rejected: Vec<(MilestonePublicKey, Rejection)>,
}

/// Check that at least `required` signatures over `essence` are valid and
/// come from distinct expected keys.
///
/// Signatures from unexpected or repeated signers never count, so a faulty
/// partial signer set cannot fill the quorum.
pub fn verify_quorum(
    essence: &[u8],
    signatures: &[MilestoneSignature],
    required: usize,
    expected: &dyn KeyPredicate,
) -> Result<QuorumReport, QuorumError> {
    if required == 0 {
        return Err(QuorumError::InvalidThreshold);
    }
    if signatures.is_empty() {
        return Err(QuorumError::NoSignatures);
    }

    let mut counted = HashSet::with_capacity(signatures.len());
    let mut rejected = Vec::new();

    for share in signatures {
        match check_share(essence, share, expected, &counted) {
            Ok(()) => {
                counted.insert(share.public_key);
            }
            Err(reason) => {
                debug!(public_key = %share.public_key, ?reason, "signature rejected from quorum");
                rejected.push((share.public_key, reason));
            }
        }
    }

    if counted.len() < required {
        return Err(QuorumError::InsufficientSignatures {
            required,
            valid: counted.len(),
            rejected: rejected.len(),
        });
    }

    Ok(QuorumReport {
        valid: counted.len(),
        rejected,
    })
}

/// Verify the signatures of a milestone payload over its own essence
pub fn verify_payload(
    payload: &MilestonePayload,
    required: usize,
    expected: &dyn KeyPredicate,
) -> Result<QuorumReport, QuorumError> {
    verify_quorum(
        &payload.essence.signing_bytes(),
        &payload.signatures,
        required,
        expected,
    )
}

fn check_share(
    essence: &[u8],
    share: &MilestoneSignature,
    expected: &dyn KeyPredicate,
    counted: &HashSet<MilestonePublicKey>,
) -> Result<(), Rejection> {
    if !expected.is_expected(&share.public_key) {
        return Err(Rejection::UnexpectedKey);
    }
    if counted.contains(&share.public_key) {
        return Err(Rejection::DuplicateKey);
    }

    let key = VerifyingKey::from_bytes(share.public_key.as_bytes())
        .map_err(|_| Rejection::MalformedKey)?;
    let signature = Signature::from_bytes(&share.signature);

    key.verify(essence, &signature)
        .map_err(|_| Rejection::InvalidSignature)
}
