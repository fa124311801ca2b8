//! # Quorum Signing
//!
//! Ports and policies around milestone signatures:
//!
//! - [`SignerProvider`] hands out a [`MilestoneIndexSigner`] per milestone
//!   index. The signer exposes the quorum's public keys, the expected-key
//!   predicate, the required signature count and a base signing function.
//! - [`SigningRetrier`] wraps any single-attempt operation, typically a
//!   [`MilestoneSigningFunc`], with a bounded number of attempts and a fixed
//!   delay between them.
//! - [`verify_quorum`] counts the signatures that verify against distinct
//!   expected keys and checks the count against the required threshold.
//!
//! ## Signing contract
//!
//! The base signing function is called once per attempt with the full, sorted
//! key list and must return exactly one signature per key. A partial set is
//! not merged across attempts: every retry starts a fresh collection.
//!
//! ```rust
//! use std::time::Duration;
//! use milestone_coordinator::signing::{SigningRetrier, SigningRetryConfig};
//!
//! # async fn example() {
//! let retrier = SigningRetrier::new(SigningRetryConfig {
//!     retry_amount: 3,
//!     retry_timeout: Duration::from_millis(10),
//! });
//! let value: Result<u32, String> = retrier.run(|_attempt| async { Ok(7) }).await;
//! assert_eq!(value, Ok(7));
//! # }
//! ```

mod error;
pub mod quorum;
pub mod retry;
mod types;

pub use error::{QuorumError, SignerError, SigningError};
pub use quorum::{verify_payload, verify_quorum, QuorumReport, Rejection};
pub use retry::{RetryMetrics, RetryingSigningFunc, SigningRetrier, SigningRetryConfig};
pub use types::{
    KeyPredicate, MilestoneIndexSigner, MilestoneSigningFunc, PublicKeySet, SignerProvider,
};
