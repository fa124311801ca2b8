//! Proof-of-work port.
//!
//! The compute engine lives outside this crate. The builder always hands it a
//! [`PowContext::background`] context and drives it from a detached task, so
//! proof of work on a checkpoint or milestone is never interrupted halfway,
//! not even at shutdown.
//!
//! Engines still receive a [`PowContext`] and are expected to poll
//! [`PowContext::is_cancelled`] between nonce batches, returning
//! [`PowError::Cancelled`] once it turns true. Hosts that run an engine for
//! other messages can build a cancelable context with
//! [`PowContext::with_shutdown`].

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;
use tracing::trace;

use crate::message::Message;

/// Proof-of-work engine failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PowError {
    /// Engine failed to find a nonce
    #[error("Proof of work failed: {0}")]
    Failed(String),

    /// Engine observed a cancelled context
    #[error("Proof of work cancelled")]
    Cancelled,

    /// Worker count rejected by the engine
    #[error("Invalid worker count: {0}")]
    InvalidWorkerCount(usize),
}

/// Execution context handed to the proof-of-work engine
#[derive(Debug, Clone, Default)]
pub struct PowContext {
    shutdown: Option<watch::Receiver<bool>>,
}

impl PowContext {
    /// Context that never reports cancellation
    pub fn background() -> Self {
        Self { shutdown: None }
    }

    /// Context cancelled once `shutdown` turns true.
    ///
    /// ```
    /// use milestone_coordinator::pow::PowContext;
    /// use tokio::sync::watch;
    ///
    /// let (shutdown, rx) = watch::channel(false);
    /// let ctx = PowContext::with_shutdown(rx);
    /// shutdown.send_replace(true);
    /// assert!(ctx.is_cancelled());
    /// ```
    pub fn with_shutdown(shutdown: watch::Receiver<bool>) -> Self {
        Self {
            shutdown: Some(shutdown),
        }
    }

    pub fn is_cancelable(&self) -> bool {
        self.shutdown.is_some()
    }

    /// Polled by engines between units of work. Always false for a
    /// background context.
    pub fn is_cancelled(&self) -> bool {
        self.shutdown
            .as_ref()
            .map(|shutdown| *shutdown.borrow())
            .unwrap_or(false)
    }
}

/// External proof-of-work engine
#[async_trait]
pub trait ProofOfWork: Send + Sync + 'static {
    /// Find a nonce for `message` and store it in place
    async fn do_pow(
        &self,
        ctx: &PowContext,
        message: &mut Message,
        worker_count: usize,
    ) -> Result<(), PowError>;
}

/// Outcome of a detached proof-of-work run
#[derive(Debug)]
pub(crate) enum PowOutcome {
    Done(Message),
    Failed(PowError),
    /// The task panicked or its runtime went away
    Aborted(String),
}

/// Run proof of work on a detached task.
///
/// Dropping the returned future does not stop the engine; the task runs to
/// completion on its own.
pub(crate) async fn run_detached(
    pow: Arc<dyn ProofOfWork>,
    message: Message,
    worker_count: usize,
) -> PowOutcome {
    let task = tokio::spawn(async move {
        let mut message = message;
        let ctx = PowContext::background();
        pow.do_pow(&ctx, &mut message, worker_count)
            .await
            .map(|()| message)
    });

    match task.await {
        Ok(Ok(message)) => {
            trace!(nonce = message.nonce, "proof of work done");
            PowOutcome::Done(message)
        }
        Ok(Err(err)) => PowOutcome::Failed(err),
        Err(join_error) => PowOutcome::Aborted(join_error.to_string()),
    }
}
