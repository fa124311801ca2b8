#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};
use parity_scale_codec::Encode;
use parking_lot::Mutex;

use milestone_coordinator::{
    cache::{Bundle, InMemoryMilestoneStore, MilestoneStore, PersistBatch, StoreError},
    message::{
        DeserializationMode, MerkleRoot, Message, MessageId, MilestoneIndex, MilestonePayload,
        MilestonePublicKey, MilestoneSignature, Payload, SealedMessage,
    },
    pow::{PowContext, PowError, ProofOfWork},
    signing::{
        KeyPredicate, MilestoneIndexSigner, MilestoneSigningFunc, PublicKeySet, SignerError,
        SignerProvider, SigningError,
    },
};

pub const NETWORK_ID: u64 = 1454675179895816119;

pub fn init_logging() {
    milestone_coordinator::logging::init_tracing("trace");
}

/// `n` sorted, distinct parent ids
pub fn parents(n: u8) -> Vec<MessageId> {
    (1..=n).map(|byte| MessageId([byte; 32])).collect()
}

pub fn merkle_root() -> MerkleRoot {
    MerkleRoot([0xab; 32])
}

/// `n` deterministic signing keys, ordered by public key
pub fn signing_keys(n: u8) -> Vec<SigningKey> {
    let mut keys: Vec<_> = (1..=n).map(|seed| SigningKey::from_bytes(&[seed; 32])).collect();
    keys.sort_by_key(|key| key.verifying_key().to_bytes());
    keys
}

pub fn public_key(key: &SigningKey) -> MilestonePublicKey {
    MilestonePublicKey(key.verifying_key().to_bytes())
}

/// Signs with in-process ed25519 keys. Keys listed in `forged` sign a
/// different message, producing signatures that do not verify.
pub struct Ed25519SigningFunc {
    keys: BTreeMap<MilestonePublicKey, SigningKey>,
    forged: HashSet<MilestonePublicKey>,
    calls: AtomicUsize,
}

impl Ed25519SigningFunc {
    pub fn new(keys: &[SigningKey]) -> Self {
        Self {
            keys: keys.iter().map(|key| (public_key(key), key.clone())).collect(),
            forged: HashSet::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn forging(mut self, forged: impl IntoIterator<Item = MilestonePublicKey>) -> Self {
        self.forged.extend(forged);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MilestoneSigningFunc for Ed25519SigningFunc {
    async fn sign(
        &self,
        public_keys: &[MilestonePublicKey],
        essence: &[u8],
    ) -> Result<Vec<MilestoneSignature>, SigningError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        public_keys
            .iter()
            .map(|public_key| -> Result<MilestoneSignature, SigningError> {
                let key = self
                    .keys
                    .get(public_key)
                    .ok_or_else(|| SigningError::Backend(format!("unknown key {}", public_key)))?;
                let signature = if self.forged.contains(public_key) {
                    key.sign(b"not the essence")
                } else {
                    key.sign(essence)
                };
                Ok(MilestoneSignature::new(*public_key, signature.to_bytes()))
            })
            .collect()
    }
}

/// Fails the first `failures` calls, then delegates
pub struct FlakySigningFunc<F> {
    inner: F,
    failures: usize,
    calls: AtomicUsize,
}

impl<F> FlakySigningFunc<F> {
    pub fn new(inner: F, failures: usize) -> Self {
        Self {
            inner,
            failures,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<F: MilestoneSigningFunc> MilestoneSigningFunc for FlakySigningFunc<F> {
    async fn sign(
        &self,
        public_keys: &[MilestonePublicKey],
        essence: &[u8],
    ) -> Result<Vec<MilestoneSignature>, SigningError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures {
            return Err(SigningError::Unavailable(format!("call {}", call)));
        }
        self.inner.sign(public_keys, essence).await
    }
}

/// Quorum signer over a fixed key set
pub struct TestSigner {
    index: MilestoneIndex,
    public_keys: Vec<MilestonePublicKey>,
    expected: PublicKeySet,
    required: usize,
    func: Arc<dyn MilestoneSigningFunc>,
}

impl TestSigner {
    pub fn new(
        index: MilestoneIndex,
        keys: &[SigningKey],
        required: usize,
        func: Arc<dyn MilestoneSigningFunc>,
    ) -> Self {
        let public_keys: Vec<_> = keys.iter().map(public_key).collect();
        Self {
            index,
            expected: public_keys.iter().copied().collect(),
            public_keys,
            required,
            func,
        }
    }
}

impl MilestoneIndexSigner for TestSigner {
    fn index(&self) -> MilestoneIndex {
        self.index
    }

    fn public_keys(&self) -> Vec<MilestonePublicKey> {
        self.public_keys.clone()
    }

    fn expected_keys(&self) -> &dyn KeyPredicate {
        &self.expected
    }

    fn required_signatures(&self) -> usize {
        self.required
    }

    fn signing_func(&self) -> Arc<dyn MilestoneSigningFunc> {
        Arc::clone(&self.func)
    }
}

/// Hands out one quorum for every index
pub struct StaticSignerProvider {
    keys: Vec<SigningKey>,
    required: usize,
    func: Arc<dyn MilestoneSigningFunc>,
}

impl StaticSignerProvider {
    pub fn new(
        keys: Vec<SigningKey>,
        required: usize,
        func: Arc<dyn MilestoneSigningFunc>,
    ) -> Self {
        Self { keys, required, func }
    }

    /// `n`-of-`n` quorum with honest signers
    pub fn honest(n: u8) -> Self {
        let keys = signing_keys(n);
        let func = Arc::new(Ed25519SigningFunc::new(&keys));
        Self::new(keys, n as usize, func)
    }
}

impl SignerProvider for StaticSignerProvider {
    fn signer_for_index(
        &self,
        index: MilestoneIndex,
    ) -> Result<Arc<dyn MilestoneIndexSigner>, SignerError> {
        Ok(Arc::new(TestSigner::new(
            index,
            &self.keys,
            self.required,
            Arc::clone(&self.func),
        )))
    }
}

/// Proof-of-work fake that counts calls and sets a non-zero nonce
#[derive(Default)]
pub struct CountingPow {
    calls: AtomicUsize,
    cancelable_seen: AtomicBool,
    next_nonce: AtomicU64,
    fail: AtomicBool,
    delay: Option<Duration>,
}

impl CountingPow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        let pow = Self::default();
        pow.fail.store(true, Ordering::SeqCst);
        pow
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Runs that finished and set a nonce
    pub fn completed(&self) -> u64 {
        self.next_nonce.load(Ordering::SeqCst)
    }

    pub fn saw_cancelable_context(&self) -> bool {
        self.cancelable_seen.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProofOfWork for CountingPow {
    async fn do_pow(
        &self,
        ctx: &PowContext,
        message: &mut Message,
        worker_count: usize,
    ) -> Result<(), PowError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if ctx.is_cancelable() {
            self.cancelable_seen.store(true, Ordering::SeqCst);
        }
        if worker_count == 0 {
            return Err(PowError::InvalidWorkerCount(worker_count));
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(PowError::Failed("no nonce found".into()));
        }
        message.nonce = 1000 + self.next_nonce.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// In-memory store that records every persisted batch by index
#[derive(Default)]
pub struct RecordingStore {
    inner: InMemoryMilestoneStore,
    batches: Mutex<Vec<Vec<u32>>>,
    fail: AtomicBool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn batches(&self) -> Vec<Vec<u32>> {
        self.batches.lock().clone()
    }

    pub fn persisted(&self) -> Vec<u32> {
        self.batches.lock().iter().flatten().copied().collect()
    }

    pub fn inner(&self) -> &InMemoryMilestoneStore {
        &self.inner
    }
}

impl PersistBatch<Bundle> for RecordingStore {
    fn persist(&self, batch: &[Bundle]) -> Result<(), StoreError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("database closed".into()));
        }
        self.inner.persist(batch)?;
        self.batches
            .lock()
            .push(batch.iter().map(|bundle| bundle.index().get()).collect());
        Ok(())
    }
}

impl MilestoneStore for RecordingStore {
    fn load_milestone(&self, index: MilestoneIndex) -> Result<Option<Bundle>, StoreError> {
        self.inner.load_milestone(index)
    }
}

/// Signed milestone message that skipped the builder, for cache fixtures
pub fn milestone_message(index: u32) -> Message {
    let keys = signing_keys(1);
    let parents = parents(2);
    let mut payload = MilestonePayload::new(
        MilestoneIndex(index),
        1_600_000_000 + index as u64,
        parents.clone(),
        merkle_root(),
        vec![public_key(&keys[0])],
        None,
    );
    let signature = keys[0].sign(&payload.essence.signing_bytes());
    payload.signatures = vec![MilestoneSignature::new(public_key(&keys[0]), signature.to_bytes())];

    let mut message = Message::new(NETWORK_ID, parents, Some(Payload::Milestone(payload)));
    message.nonce = index as u64;
    message
}

pub fn bundle(index: u32) -> Bundle {
    let sealed = SealedMessage::from_bytes(
        milestone_message(index).encode(),
        DeserializationMode::PerformValidation,
    )
    .expect("fixture milestone is valid");
    Bundle::from_milestone(sealed).expect("fixture is a milestone")
}
