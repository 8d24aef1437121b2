//! Handshake error taxonomy
//!
//! Every failure surfaces to the caller that initiated the wait or lookup;
//! nothing is retried automatically.

use thiserror::Error;

/// Errors from handshake waits and window lookups
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// A wait exceeded its deadline. Only the waiting relationship failed;
    /// the shared signal stays pending and may still settle later.
    #[error("{label} did not load after {timeout_ms}ms")]
    Timeout { label: String, timeout_ms: u64 },

    /// The remote context reported a load failure instead of readiness
    #[error("window failed to load: {reason}")]
    LoadFailed { reason: String },

    /// Every handle to the context disappeared before it announced readiness
    #[error("window closed before announcing readiness")]
    WindowGone,

    /// A window handle was requested before it was registered
    #[error("not all windows available: missing {}", .missing.join(", "))]
    NotReady { missing: Vec<String> },

    /// The launcher could not create the requested context
    #[error("failed to launch {name}: {reason}")]
    LaunchFailed { name: String, reason: String },
}
