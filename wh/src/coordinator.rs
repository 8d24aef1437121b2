//! Handshake coordination over pending signals
//!
//! The coordinator tracks one pending readiness signal per remote context,
//! races waits against a configurable deadline, and aggregates several waits
//! into a single fail-fast gate. It owns no state of its own: signals live
//! in the process-global window store, so every coordinator instance in the
//! process observes the same handshakes.

use std::time::Duration;

use futures::future::try_join_all;
use tracing::{debug, warn};
use winstore::{WindowIdentity, WindowScopedStore, window_store};

use crate::config::HandshakeConfig;
use crate::error::HandshakeError;
use crate::signal::{Hello, PendingSignal};

/// Name of the process-global window store holding pending signals
const SIGNAL_STORE: &str = "pending-signals";

/// Coordinates readiness handshakes from remote browsing contexts
#[derive(Clone, Debug)]
pub struct HandshakeCoordinator {
    config: HandshakeConfig,
}

impl HandshakeCoordinator {
    /// Create a coordinator with default configuration
    pub fn new() -> Self {
        Self::with_config(HandshakeConfig::default())
    }

    /// Create a coordinator with the given configuration
    pub fn with_config(config: HandshakeConfig) -> Self {
        Self { config }
    }

    /// The configured default deadline for a single wait
    pub fn hello_timeout(&self) -> Duration {
        self.config.hello_timeout()
    }

    /// Fetch-or-create the pending signal for a context
    ///
    /// The first call for a given identity creates a fresh pending signal;
    /// later calls return the same one, whatever its state.
    pub fn request_signal(&self, win: &WindowIdentity) -> PendingSignal {
        self.signals().get_or_set(win, PendingSignal::new)
    }

    /// Announce a context's readiness. Called by remote bootstrap code
    /// exactly once per context; an announcement for an already-settled
    /// signal is a harmless no-op (returns false).
    pub fn signal_ready(&self, win: &WindowIdentity, domain: impl Into<String>) -> bool {
        let domain = domain.into();
        let fulfilled = self.request_signal(win).fulfill(Hello {
            domain: domain.clone(),
        });
        if fulfilled {
            debug!(window = win.serial(), %domain, "window announced readiness");
        } else {
            warn!(window = win.serial(), %domain, "ignoring hello for settled signal");
        }
        fulfilled
    }

    /// Record that a context failed to load instead of announcing readiness.
    /// A no-op (returns false) when the signal already settled.
    pub fn signal_failed(&self, win: &WindowIdentity, reason: impl Into<String>) -> bool {
        let reason = reason.into();
        let rejected = self.request_signal(win).reject(reason.clone());
        if rejected {
            warn!(window = win.serial(), %reason, "window reported load failure");
        }
        rejected
    }

    /// Wait for a context's readiness, optionally bounded by a deadline
    ///
    /// `None` waits indefinitely. When the deadline elapses first, only this
    /// wait fails: the shared signal is not settled, a later `signal_ready`
    /// still fulfills it for other or future waiters, and a waiter that
    /// already timed out never observes that result.
    pub async fn await_ready(
        &self,
        win: &WindowIdentity,
        timeout: Option<Duration>,
        label: &str,
    ) -> Result<Hello, HandshakeError> {
        let signal = self.request_signal(win);
        debug!(window = win.serial(), ?timeout, label, "awaiting readiness");

        match timeout {
            None => signal.wait().await,
            Some(deadline) => match tokio::time::timeout(deadline, signal.wait()).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    let timeout_ms = deadline.as_millis() as u64;
                    warn!(window = win.serial(), label, timeout_ms, "readiness wait timed out");
                    Err(HandshakeError::Timeout {
                        label: label.to_string(),
                        timeout_ms,
                    })
                }
            },
        }
    }

    /// Wait for a context with the configured default deadline and label
    pub async fn await_hello(&self, win: &WindowIdentity) -> Result<Hello, HandshakeError> {
        self.await_ready(win, Some(self.config.hello_timeout()), &self.config.default_label)
            .await
    }

    /// Readiness gate over several contexts
    ///
    /// Issues one wait per window concurrently; resolves with every payload
    /// in input order once all succeed, or fails fast on the first timeout
    /// or load failure. Abandoned sibling waits give up only their waiting
    /// relationship, never the signals themselves.
    pub async fn await_all(
        &self,
        wins: &[WindowIdentity],
        timeout: Option<Duration>,
        label: &str,
    ) -> Result<Vec<Hello>, HandshakeError> {
        debug!(count = wins.len(), ?timeout, label, "awaiting readiness gate");
        try_join_all(wins.iter().map(|win| self.await_ready(win, timeout, label))).await
    }

    fn signals(&self) -> WindowScopedStore<PendingSignal> {
        window_store(SIGNAL_STORE)
    }
}

impl Default for HandshakeCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for a single window's hello with default deadline and label
pub async fn await_window_hello(win: &WindowIdentity) -> Result<Hello, HandshakeError> {
    HandshakeCoordinator::new().await_hello(win).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_request_signal_returns_same_signal_per_window() {
        let coordinator = HandshakeCoordinator::new();
        let win = WindowIdentity::new();

        let first = coordinator.request_signal(&win);
        first.fulfill(Hello {
            domain: "mock://same.com".to_string(),
        });

        let second = coordinator.request_signal(&win);
        assert!(!second.state().is_pending());
    }

    #[tokio::test]
    async fn test_await_ready_resolves_after_signal() {
        let coordinator = HandshakeCoordinator::new();
        let win = WindowIdentity::new();

        let waiter = coordinator.clone();
        let waited = win.clone();
        let handle =
            tokio::spawn(async move { waiter.await_ready(&waited, Some(Duration::from_secs(5)), "Window").await });

        coordinator.signal_ready(&win, "mock://child.com");

        let hello = handle.await.unwrap().unwrap();
        assert_eq!(hello.domain, "mock://child.com");
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_ready_times_out_with_label_and_duration() {
        let coordinator = HandshakeCoordinator::new();
        let win = WindowIdentity::new();

        let err = coordinator
            .await_ready(&win, Some(Duration::from_millis(5000)), "ChildFrame")
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("ChildFrame"), "message should name the label: {message}");
        assert!(message.contains("5000ms"), "message should name the deadline: {message}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_wait_never_times_out() {
        let coordinator = HandshakeCoordinator::new();
        let win = WindowIdentity::new();

        let waiter = coordinator.clone();
        let waited = win.clone();
        let handle = tokio::spawn(async move { waiter.await_ready(&waited, None, "Window").await });

        // Far past any configured deadline; the wait must still be pending.
        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert!(!handle.is_finished());

        coordinator.signal_ready(&win, "mock://eventually.com");
        let hello = handle.await.unwrap().unwrap();
        assert_eq!(hello.domain, "mock://eventually.com");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_does_not_settle_the_shared_signal() {
        let coordinator = HandshakeCoordinator::new();
        let win = WindowIdentity::new();

        let err = coordinator
            .await_ready(&win, Some(Duration::from_millis(100)), "Window")
            .await
            .unwrap_err();
        assert!(matches!(err, HandshakeError::Timeout { .. }));

        // The signal survived the timed-out waiter; a late hello still lands.
        assert!(coordinator.signal_ready(&win, "mock://late.com"));

        let hello = coordinator
            .await_ready(&win, Some(Duration::from_millis(100)), "Window")
            .await
            .unwrap();
        assert_eq!(hello.domain, "mock://late.com");
    }

    #[tokio::test]
    async fn test_duplicate_hello_is_a_noop() {
        let coordinator = HandshakeCoordinator::new();
        let win = WindowIdentity::new();

        assert!(coordinator.signal_ready(&win, "mock://first.com"));
        assert!(!coordinator.signal_ready(&win, "mock://second.com"));

        let hello = coordinator.await_hello(&win).await.unwrap();
        assert_eq!(hello.domain, "mock://first.com");
    }

    #[tokio::test]
    async fn test_signal_failed_rejects_waiters() {
        let coordinator = HandshakeCoordinator::new();
        let win = WindowIdentity::new();

        assert!(coordinator.signal_failed(&win, "document error"));

        let err = coordinator.await_hello(&win).await.unwrap_err();
        assert!(matches!(err, HandshakeError::LoadFailed { reason } if reason == "document error"));
    }

    #[tokio::test]
    async fn test_await_all_resolves_in_input_order() {
        let coordinator = HandshakeCoordinator::new();
        let wins: Vec<WindowIdentity> = (0..3).map(|_| WindowIdentity::new()).collect();

        // Settle out of order; results must follow input order.
        coordinator.signal_ready(&wins[2], "mock://c.com");
        coordinator.signal_ready(&wins[0], "mock://a.com");
        coordinator.signal_ready(&wins[1], "mock://b.com");

        let hellos = coordinator
            .await_all(&wins, Some(Duration::from_secs(5)), "Window")
            .await
            .unwrap();

        let domains: Vec<&str> = hellos.iter().map(|h| h.domain.as_str()).collect();
        assert_eq!(domains, vec!["mock://a.com", "mock://b.com", "mock://c.com"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_all_fails_fast_on_first_failure() {
        let coordinator = HandshakeCoordinator::new();
        let ready = WindowIdentity::new();
        let silent = WindowIdentity::new();

        coordinator.signal_ready(&ready, "mock://ready.com");

        let started = tokio::time::Instant::now();
        let err = coordinator
            .await_all(
                &[ready.clone(), silent.clone()],
                Some(Duration::from_millis(5000)),
                "ChildFrame",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, HandshakeError::Timeout { .. }));
        // Failed at the deadline, not after waiting out anything else.
        let elapsed = started.elapsed();
        assert!(
            elapsed >= Duration::from_millis(5000) && elapsed < Duration::from_millis(5100),
            "gate should fail at the deadline, took {elapsed:?}"
        );
    }

    #[tokio::test]
    async fn test_coordinators_share_process_global_signals() {
        let win = WindowIdentity::new();

        HandshakeCoordinator::new().signal_ready(&win, "mock://shared.com");

        let hello = await_window_hello(&win).await.unwrap();
        assert_eq!(hello.domain, "mock://shared.com");
    }
}
