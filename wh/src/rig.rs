//! Named window rig for harness setup
//!
//! The rig owns the launcher and the list of contexts a suite expects.
//! `launch_all` creates every context and registers its handle by name;
//! `windows` hands the named handles back, failing loudly when any expected
//! handle is missing; `await_all_ready` runs the readiness gate over all of
//! them before the suite proceeds.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, info};
use winstore::{KeyedStore, WindowIdentity};

use crate::coordinator::HandshakeCoordinator;
use crate::error::HandshakeError;
use crate::launcher::{WindowLauncher, WindowSpec};
use crate::signal::Hello;

/// Launches and tracks the named remote contexts a suite depends on
pub struct WindowRig {
    launcher: Arc<dyn WindowLauncher>,
    expected: Vec<WindowSpec>,
    handles: KeyedStore<WindowIdentity>,
}

impl WindowRig {
    /// Create a rig expecting the given contexts
    pub fn new(launcher: Arc<dyn WindowLauncher>, expected: Vec<WindowSpec>) -> Self {
        Self {
            launcher,
            expected,
            handles: KeyedStore::new(),
        }
    }

    /// The contexts this rig expects, in launch order
    pub fn expected(&self) -> &[WindowSpec] {
        &self.expected
    }

    /// Register a handle under a name (for contexts created elsewhere)
    pub fn register(&self, name: impl Into<String>, win: WindowIdentity) {
        let name = name.into();
        debug!(%name, window = win.serial(), "registering window handle");
        self.handles.set(name, win);
    }

    /// Launch every expected context and register its handle
    pub async fn launch_all(&self) -> Result<(), HandshakeError> {
        for spec in &self.expected {
            let win = self.launcher.launch(spec).await?;
            info!(name = %spec.name, window = win.serial(), kind = ?spec.kind, "window launched");
            self.handles.set(spec.name.clone(), win);
        }
        Ok(())
    }

    /// Look up a single registered handle by name
    pub fn window(&self, name: &str) -> Result<WindowIdentity, HandshakeError> {
        self.handles.get(name).ok_or_else(|| HandshakeError::NotReady {
            missing: vec![name.to_string()],
        })
    }

    /// Every expected handle by name
    ///
    /// Fails with [`HandshakeError::NotReady`] naming each missing handle,
    /// rather than returning a partial map.
    pub fn windows(&self) -> Result<HashMap<String, WindowIdentity>, HandshakeError> {
        let mut out = HashMap::new();
        let mut missing = Vec::new();

        for spec in &self.expected {
            match self.handles.get(&spec.name) {
                Some(win) => {
                    out.insert(spec.name.clone(), win);
                }
                None => missing.push(spec.name.clone()),
            }
        }

        if !missing.is_empty() {
            return Err(HandshakeError::NotReady { missing });
        }
        Ok(out)
    }

    /// Readiness gate over every expected window
    ///
    /// Waits on each context concurrently with the coordinator's default
    /// deadline, labeling each wait with the window's name so a failure
    /// identifies which context never loaded. Fails fast on the first
    /// timeout or load failure; succeeds with (name, hello) pairs in launch
    /// order once all contexts announce.
    pub async fn await_all_ready(
        &self,
        coordinator: &HandshakeCoordinator,
    ) -> Result<Vec<(String, Hello)>, HandshakeError> {
        let windows = self.windows()?;
        let timeout = Some(coordinator.hello_timeout());

        let waits = self.expected.iter().map(|spec| {
            let win = windows[&spec.name].clone();
            let name = spec.name.clone();
            async move {
                let hello = coordinator.await_ready(&win, timeout, &name).await?;
                Ok::<_, HandshakeError>((name, hello))
            }
        });

        let ready = try_join_all(waits).await?;
        info!(count = ready.len(), "all windows announced readiness");
        Ok(ready)
    }
}

impl std::fmt::Debug for WindowRig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowRig")
            .field("expected", &self.expected.len())
            .field("registered", &self.handles.len())
            .finish()
    }
}
