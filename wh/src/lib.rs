//! WinHello - cross-window handshake harness core
//!
//! Before a cross-window test suite runs, every remote browsing context it
//! depends on (popups, nested frames) must announce readiness. WinHello
//! tracks one pending signal per context, races each wait against a
//! configurable deadline, and aggregates the waits into a single fail-fast
//! readiness gate.
//!
//! # Core Concepts
//!
//! - **One signal per context**: a single-assignment deferred `{domain}`
//!   value, created lazily on first request and shared by every waiter
//! - **First settlement wins**: duplicate or late announcements are
//!   harmless no-ops
//! - **Timeouts cancel waits, not signals**: a timed-out waiter fails alone;
//!   the shared signal can still settle for everyone else
//! - **Weak window keying**: signals are keyed by window identity through
//!   [`winstore`], so tracking a context never keeps it alive
//!
//! # Modules
//!
//! - [`signal`] - pending readiness signals
//! - [`coordinator`] - wait/timeout/aggregate protocol over the signals
//! - [`launcher`] - context creation seam and the simulated launcher
//! - [`rig`] - named window registration and the setup gate
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod cli;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod launcher;
pub mod rig;
pub mod signal;

pub use config::{Config, HandshakeConfig, RigConfig};
pub use coordinator::{HandshakeCoordinator, await_window_hello};
pub use error::HandshakeError;
pub use launcher::{SimLauncher, WindowKind, WindowLauncher, WindowSpec};
pub use rig::WindowRig;
pub use signal::{Hello, PendingSignal, SignalState};

// Store primitives re-exported alongside the handshake surface
pub use winstore::{KeyedStore, WindowIdentity, WindowScopedStore, global_store, window_store};
