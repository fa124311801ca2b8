//! # Message Builder
//!
//! Builds checkpoint and milestone messages for the coordinator.
//!
//! A milestone attempt runs these steps strictly in order:
//!
//! 1. fetch the quorum signer bound to the target index
//! 2. assemble the payload (index, timestamp, parents, merkle root, keys, receipt)
//! 3. sign the essence through the [`SigningRetrier`]
//! 4. verify the signature set against the signer's quorum
//! 5. run proof of work on a detached, non-cancelable task
//! 6. seal the message through structural validation
//!
//! A failed quorum check ends the attempt before any proof of work is spent.
//! Nothing is retried at this layer beyond what the retrier does internally;
//! the driver decides whether to re-attempt a whole issuance.
//!
//! Milestone indices must strictly increase across calls. The builder trusts
//! its driver on this and does not track previous indices.

mod attempt;
mod error;

pub use attempt::{IssuanceKind, IssuanceStage};
pub use error::IssuanceError;

use std::sync::Arc;
use std::time::SystemTime;

use tracing::debug;

use crate::config::CoordinatorConfig;
use crate::message::validation::{self, DeserializationMode};
use crate::message::{
    MerkleRoot, Message, MessageId, MilestoneIndex, MilestonePayload, Payload, Receipt,
    SealedMessage,
};
use crate::pow::{self, PowOutcome, ProofOfWork};
use crate::signing::{
    verify_quorum, MilestoneSigningFunc, RetryMetrics, SignerProvider, SigningError,
    SigningRetrier,
};
use attempt::IssuanceAttempt;

/// Builds sealed checkpoint and milestone messages
pub struct MessageBuilder {
    network_id: u64,
    pow_worker_count: usize,
    signer_provider: Arc<dyn SignerProvider>,
    pow: Arc<dyn ProofOfWork>,
    retrier: SigningRetrier,
}

impl MessageBuilder {
    pub fn new(
        config: &CoordinatorConfig,
        signer_provider: Arc<dyn SignerProvider>,
        pow: Arc<dyn ProofOfWork>,
    ) -> Self {
        Self {
            network_id: config.network_id,
            pow_worker_count: config.pow_worker_count,
            signer_provider,
            pow,
            retrier: SigningRetrier::new(config.signing.clone()),
        }
    }

    pub fn network_id(&self) -> u64 {
        self.network_id
    }

    /// Counters of the signing retrier
    pub fn retry_metrics(&self) -> RetryMetrics {
        self.retrier.metrics()
    }

    /// Create a proof-of-work sealed checkpoint referencing `parents`.
    ///
    /// Parent order is kept as given.
    pub async fn create_checkpoint(
        &self,
        parents: Vec<MessageId>,
    ) -> Result<SealedMessage, IssuanceError> {
        let mut attempt = IssuanceAttempt::new(IssuanceKind::Checkpoint);

        let message = Message::new(self.network_id, parents, None);
        attempt.advance(IssuanceStage::SealingPow);

        match self.seal(message).await {
            Ok(sealed) => {
                attempt.seal(&sealed);
                Ok(sealed)
            }
            Err(err) => Err(attempt.fail(err)),
        }
    }

    /// Create a signed, quorum-verified and proof-of-work sealed milestone
    pub async fn create_milestone(
        &self,
        index: MilestoneIndex,
        parents: Vec<MessageId>,
        receipt: Option<Receipt>,
        inclusion_merkle_root: MerkleRoot,
    ) -> Result<SealedMessage, IssuanceError> {
        let mut attempt = IssuanceAttempt::new(IssuanceKind::Milestone(index));

        let result = self
            .build_milestone(&mut attempt, index, parents, receipt, inclusion_merkle_root)
            .await;

        match result {
            Ok(sealed) => {
                attempt.seal(&sealed);
                Ok(sealed)
            }
            Err(err) => {
                debug_assert_eq!(attempt.stage(), err.stage());
                Err(attempt.fail(err))
            }
        }
    }

    async fn build_milestone(
        &self,
        attempt: &mut IssuanceAttempt,
        index: MilestoneIndex,
        parents: Vec<MessageId>,
        receipt: Option<Receipt>,
        inclusion_merkle_root: MerkleRoot,
    ) -> Result<SealedMessage, IssuanceError> {
        let signer = self
            .signer_provider
            .signer_for_index(index)
            .map_err(|source| IssuanceError::Signer { index, source })?;

        let timestamp = unix_timestamp(SystemTime::now())?;
        let mut payload = MilestonePayload::new(
            index,
            timestamp,
            parents.clone(),
            inclusion_merkle_root,
            signer.public_keys(),
            receipt,
        );
        validation::validate_essence(&payload.essence).map_err(IssuanceError::Payload)?;
        let essence = payload.essence.signing_bytes();

        attempt.advance(IssuanceStage::Signing);
        let signing_func = self.retrier.wrap(signer.signing_func());
        let signatures = signing_func
            .sign(&payload.essence.public_keys, &essence)
            .await
            .map_err(IssuanceError::Signing)?;
        if signatures.len() != payload.essence.public_keys.len() {
            return Err(IssuanceError::Signing(SigningError::SignatureCountMismatch {
                expected: payload.essence.public_keys.len(),
                actual: signatures.len(),
            }));
        }
        payload.signatures = signatures;

        attempt.advance(IssuanceStage::Verifying);
        let required = signer.required_signatures();
        let report = verify_quorum(&essence, &payload.signatures, required, signer.expected_keys())
            .map_err(IssuanceError::Quorum)?;
        debug!(
            %index,
            valid = report.valid,
            required,
            rejected = report.rejected.len(),
            "milestone quorum verified"
        );

        attempt.advance(IssuanceStage::SealingPow);
        let message = Message::new(
            self.network_id,
            parents,
            Some(Payload::Milestone(payload)),
        );
        self.seal(message).await
    }

    /// Proof of work followed by structural validation
    async fn seal(&self, message: Message) -> Result<SealedMessage, IssuanceError> {
        let outcome =
            pow::run_detached(Arc::clone(&self.pow), message, self.pow_worker_count).await;
        let message = match outcome {
            PowOutcome::Done(message) => message,
            PowOutcome::Failed(err) => return Err(IssuanceError::ProofOfWork(err)),
            PowOutcome::Aborted(reason) => return Err(IssuanceError::PowAborted(reason)),
        };

        SealedMessage::seal(message, DeserializationMode::PerformValidation)
            .map_err(IssuanceError::Validation)
    }
}

fn unix_timestamp(now: SystemTime) -> Result<u64, IssuanceError> {
    now.duration_since(SystemTime::UNIX_EPOCH)
        .map(|since_epoch| since_epoch.as_secs())
        .map_err(|err| IssuanceError::Clock(err.duration()))
}
