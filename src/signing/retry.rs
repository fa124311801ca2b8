use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::message::{MilestonePublicKey, MilestoneSignature};
use super::error::SigningError;
use super::types::MilestoneSigningFunc;

/// Retry configuration for milestone signing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningRetryConfig {
    /// Attempts per signing call. 0 disables retries and delays.
    pub retry_amount: u32,
    /// Wait between two attempts
    pub retry_timeout: Duration,
}

impl Default for SigningRetryConfig {
    fn default() -> Self {
        Self {
            retry_amount: 10,
            retry_timeout: Duration::from_secs(2),
        }
    }
}

/// Retry counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryMetrics {
    /// Invocations of the wrapped operation
    pub total_attempts: u64,
    /// Delays slept between attempts
    pub delays: u64,
    /// Calls that succeeded after at least one failure
    pub successful_retries: u64,
    /// Calls that failed on every attempt
    pub budget_exhaustions: u64,
}

/// Bounded retry policy with a fixed delay.
///
/// Cloning shares the counters.
#[derive(Debug, Clone)]
pub struct SigningRetrier {
    config: SigningRetryConfig,
    metrics: Arc<RwLock<RetryMetrics>>,
}

impl SigningRetrier {
    pub fn new(config: SigningRetryConfig) -> Self {
        Self {
            config,
            metrics: Arc::new(RwLock::new(RetryMetrics::default())),
        }
    }

    pub fn config(&self) -> &SigningRetryConfig {
        &self.config
    }

    pub fn metrics(&self) -> RetryMetrics {
        self.metrics.read().clone()
    }

    /// Run `operation` under this policy.
    ///
    /// The closure receives the 1-based attempt number. The first success is
    /// returned as is; after the last failed attempt its error is returned.
    pub async fn run<T, E, F, Fut>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let retry_amount = self.config.retry_amount;
        if retry_amount == 0 {
            self.metrics.write().total_attempts += 1;
            return operation(1).await;
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            self.metrics.write().total_attempts += 1;

            match operation(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        self.metrics.write().successful_retries += 1;
                    }
                    return Ok(value);
                }
                Err(err) if attempt < retry_amount => {
                    warn!(
                        attempt,
                        retries_left = retry_amount - attempt,
                        delay = ?self.config.retry_timeout,
                        error = %err,
                        "signing attempt failed, retrying"
                    );
                    self.metrics.write().delays += 1;
                    tokio::time::sleep(self.config.retry_timeout).await;
                }
                Err(err) => {
                    warn!(attempts = attempt, error = %err, "signing failed after all attempts");
                    self.metrics.write().budget_exhaustions += 1;
                    return Err(err);
                }
            }
        }
    }

    /// Wrap a base signing function into one with the same shape that
    /// retries under this policy
    pub fn wrap(&self, inner: Arc<dyn MilestoneSigningFunc>) -> RetryingSigningFunc {
        RetryingSigningFunc {
            retrier: self.clone(),
            inner,
        }
    }
}

/// Signing function retried by a [`SigningRetrier`]
pub struct RetryingSigningFunc {
    retrier: SigningRetrier,
    inner: Arc<dyn MilestoneSigningFunc>,
}

#[async_trait]
impl MilestoneSigningFunc for RetryingSigningFunc {
    async fn sign(
        &self,
        public_keys: &[MilestonePublicKey],
        essence: &[u8],
    ) -> Result<Vec<MilestoneSignature>, SigningError> {
        let inner = self.inner.as_ref();
        self.retrier
            .run(move |_| inner.sign(public_keys, essence))
            .await
    }
}
