//! Pending readiness signals
//!
//! A [`PendingSignal`] is a single-assignment deferred value: it starts
//! pending, settles exactly once to fulfilled (the context announced
//! readiness) or rejected (the context failed to load), and never
//! transitions again. Any number of waiters may observe the settlement;
//! each wait has its own receiver, so abandoning one wait never disturbs
//! the others or the signal itself.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

use crate::error::HandshakeError;

/// Readiness payload a remote context announces once loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hello {
    /// Domain the remote context loaded from
    pub domain: String,
}

/// Lifecycle of a pending signal
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SignalState {
    /// No settlement yet
    #[default]
    Pending,
    /// The context announced readiness
    Fulfilled(Hello),
    /// The context failed to load
    Rejected(String),
}

impl SignalState {
    /// True until the signal settles
    pub fn is_pending(&self) -> bool {
        matches!(self, SignalState::Pending)
    }
}

/// Single-assignment deferred readiness value
///
/// Cheap to clone; all clones observe the same settlement. First settlement
/// wins: `fulfill`/`reject` on an already-settled signal are no-ops.
#[derive(Clone)]
pub struct PendingSignal {
    tx: Arc<watch::Sender<SignalState>>,
}

impl PendingSignal {
    /// Create a signal in the pending state
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SignalState::Pending);
        Self { tx: Arc::new(tx) }
    }

    /// Settle to fulfilled. Returns false (and changes nothing) when the
    /// signal was already settled.
    pub fn fulfill(&self, hello: Hello) -> bool {
        self.settle(SignalState::Fulfilled(hello))
    }

    /// Settle to rejected. Returns false (and changes nothing) when the
    /// signal was already settled.
    pub fn reject(&self, reason: impl Into<String>) -> bool {
        self.settle(SignalState::Rejected(reason.into()))
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SignalState {
        self.tx.borrow().clone()
    }

    /// Wait until the signal settles
    ///
    /// Consumes this handle so the wait itself cannot keep the signal alive.
    /// Resolves with the hello payload on fulfillment, [`HandshakeError::LoadFailed`]
    /// on rejection, or [`HandshakeError::WindowGone`] when every other
    /// handle dropped while the signal was still pending.
    pub async fn wait(self) -> Result<Hello, HandshakeError> {
        let mut rx = self.tx.subscribe();
        drop(self);

        let settled = rx
            .wait_for(|state| !state.is_pending())
            .await
            .map_err(|_| HandshakeError::WindowGone)?;

        match &*settled {
            SignalState::Fulfilled(hello) => Ok(hello.clone()),
            SignalState::Rejected(reason) => Err(HandshakeError::LoadFailed {
                reason: reason.clone(),
            }),
            SignalState::Pending => unreachable!("wait_for yielded a pending state"),
        }
    }

    fn settle(&self, next: SignalState) -> bool {
        let settled = self.tx.send_if_modified(|state| {
            if state.is_pending() {
                *state = next;
                true
            } else {
                false
            }
        });
        if !settled {
            debug!("ignoring settle on an already-settled signal");
        }
        settled
    }
}

impl Default for PendingSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PendingSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingSignal").field("state", &self.state()).finish()
    }
}
