use tokio::sync::watch;
use tracing::error;

use crate::error::Error;

/// Tracks whether issuance may continue.
///
/// A halt is permanent and only the first reason is kept. Subscribers see the
/// halt through a `watch` channel.
#[derive(Debug)]
pub struct IssuanceSupervisor {
    halt: watch::Sender<Option<String>>,
}

impl Default for IssuanceSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl IssuanceSupervisor {
    pub fn new() -> Self {
        let (halt, _) = watch::channel(None);
        Self { halt }
    }

    /// Stop all further issuance. Returns false if already halted.
    pub fn halt(&self, reason: impl Into<String>) -> bool {
        let reason = reason.into();
        let halted = self.halt.send_if_modified(|state| {
            if state.is_some() {
                return false;
            }
            *state = Some(reason.clone());
            true
        });
        if halted {
            error!(%reason, "milestone issuance halted");
        }
        halted
    }

    pub fn is_halted(&self) -> bool {
        self.halt.borrow().is_some()
    }

    pub fn halt_reason(&self) -> Option<String> {
        self.halt.borrow().clone()
    }

    /// `Err(Error::Halted)` once halted
    pub fn ensure_running(&self) -> Result<(), Error> {
        match self.halt_reason() {
            Some(reason) => Err(Error::Halted(reason)),
            None => Ok(()),
        }
    }

    /// Receiver that changes when issuance halts
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.halt.subscribe()
    }

    /// Halt on fatal errors and pass the result through
    pub fn observe<T>(&self, result: Result<T, Error>) -> Result<T, Error> {
        if let Err(err) = &result {
            if err.is_fatal() {
                self.halt(err.to_string());
            }
        }
        result
    }
}
