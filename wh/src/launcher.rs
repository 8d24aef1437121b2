//! Context creation seam and the simulated launcher
//!
//! The real popup/frame creation facility lives outside this crate; the
//! [`WindowLauncher`] trait is the seam implementations adapt it through.
//! [`SimLauncher`] is the in-process stand-in: each launch mints an identity
//! and spawns a bootstrap task that announces readiness after a delay, the
//! way a real context's bootstrap script would once its document loads.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;
use winstore::WindowIdentity;

use crate::coordinator::HandshakeCoordinator;
use crate::error::HandshakeError;

/// Kind of remote browsing context to create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowKind {
    /// A separate top-level window
    Popup,
    /// A nested frame inside the host document
    Frame,
}

/// Descriptor for one remote context the rig should create
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowSpec {
    /// Handle name the rig registers the context under
    pub name: String,
    /// What kind of context to create
    pub kind: WindowKind,
}

impl WindowSpec {
    /// Describe a popup context
    pub fn popup(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: WindowKind::Popup,
        }
    }

    /// Describe a nested-frame context
    pub fn frame(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: WindowKind::Frame,
        }
    }

    /// Unique name to create the context under: a fresh uuid prefix plus the
    /// handle name with runs of non-alphanumerics collapsed to underscores
    pub fn context_name(&self) -> String {
        let mut sanitized = String::with_capacity(self.name.len());
        let mut gap = false;
        for c in self.name.chars() {
            if c.is_ascii_alphanumeric() {
                sanitized.push(c);
                gap = false;
            } else if !gap {
                sanitized.push('_');
                gap = true;
            }
        }
        format!("{}_{}", Uuid::now_v7(), sanitized)
    }
}

/// Creates remote browsing contexts
///
/// Implementations return a [`WindowIdentity`] for a freshly created context
/// and arrange for that context's bootstrap code to call
/// [`HandshakeCoordinator::signal_ready`] once it finishes loading.
#[async_trait]
pub trait WindowLauncher: Send + Sync {
    /// Create the context described by `spec`
    async fn launch(&self, spec: &WindowSpec) -> Result<WindowIdentity, HandshakeError>;
}

/// In-process simulated launcher
///
/// Plays both sides of the handshake: launches mint identities locally, and
/// a spawned task stands in for the remote bootstrap, announcing readiness
/// with the configured domain after the configured delay. Windows named in
/// the silent set never announce; windows in the failing set announce a load
/// failure instead.
pub struct SimLauncher {
    coordinator: HandshakeCoordinator,
    delay: Duration,
    domain: String,
    silent: HashSet<String>,
    failing: HashSet<String>,
}

impl SimLauncher {
    /// Create a launcher announcing `domain` after `delay`
    pub fn new(coordinator: HandshakeCoordinator, delay: Duration, domain: impl Into<String>) -> Self {
        Self {
            coordinator,
            delay,
            domain: domain.into(),
            silent: HashSet::new(),
            failing: HashSet::new(),
        }
    }

    /// Mark a window name as never announcing readiness
    pub fn with_silent(mut self, name: impl Into<String>) -> Self {
        self.silent.insert(name.into());
        self
    }

    /// Mark a window name as announcing a load failure
    pub fn with_load_failure(mut self, name: impl Into<String>) -> Self {
        self.failing.insert(name.into());
        self
    }
}

#[async_trait]
impl WindowLauncher for SimLauncher {
    async fn launch(&self, spec: &WindowSpec) -> Result<WindowIdentity, HandshakeError> {
        let win = WindowIdentity::new();
        let context_name = spec.context_name();
        debug!(
            window = win.serial(),
            name = %spec.name,
            kind = ?spec.kind,
            %context_name,
            "launching simulated context"
        );

        if self.silent.contains(&spec.name) {
            debug!(name = %spec.name, "simulated context will stay silent");
            return Ok(win);
        }

        let coordinator = self.coordinator.clone();
        let bootstrap = win.clone();
        let delay = self.delay;
        let fail = self.failing.contains(&spec.name);
        let domain = self.domain.clone();

        // Stand-in for the remote bootstrap script.
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if fail {
                coordinator.signal_failed(&bootstrap, "simulated load failure");
            } else {
                coordinator.signal_ready(&bootstrap, domain);
            }
        });

        Ok(win)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_name_is_unique_and_sanitized() {
        let spec = WindowSpec::frame("child frame #2");

        let first = spec.context_name();
        let second = spec.context_name();

        assert!(first.ends_with("_child_frame_2"));
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_sim_launch_announces_readiness() {
        let coordinator = HandshakeCoordinator::new();
        let launcher = SimLauncher::new(coordinator.clone(), Duration::from_millis(10), "mock://sim.com");

        let win = launcher.launch(&WindowSpec::popup("child-window")).await.unwrap();

        let hello = coordinator.await_hello(&win).await.unwrap();
        assert_eq!(hello.domain, "mock://sim.com");
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_window_never_announces() {
        let coordinator = HandshakeCoordinator::new();
        let launcher = SimLauncher::new(coordinator.clone(), Duration::from_millis(10), "mock://sim.com")
            .with_silent("child-frame");

        let win = launcher.launch(&WindowSpec::frame("child-frame")).await.unwrap();

        let err = coordinator
            .await_ready(&win, Some(Duration::from_millis(5000)), "ChildFrame")
            .await
            .unwrap_err();
        assert!(matches!(err, HandshakeError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_failing_window_rejects() {
        let coordinator = HandshakeCoordinator::new();
        let launcher = SimLauncher::new(coordinator.clone(), Duration::from_millis(10), "mock://sim.com")
            .with_load_failure("child-frame");

        let win = launcher.launch(&WindowSpec::frame("child-frame")).await.unwrap();

        let err = coordinator.await_hello(&win).await.unwrap_err();
        assert!(matches!(err, HandshakeError::LoadFailed { .. }));
    }
}
