//! Window identities and window-scoped stores
//!
//! A [`WindowIdentity`] is an opaque handle denoting one remote browsing
//! context. A [`WindowScopedStore`] associates values to identities through
//! a weak side table: the store holds no strong reference, so it can never
//! be the reason a context stays reachable. Slots whose identity has been
//! dropped everywhere else are reclaimed on the next store operation.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tracing::debug;

use crate::registry::global_store;

/// Registry namespace under which window-scoped stores are memoized by name
const WINDOW_STORE_NAMESPACE: &str = "windowStore";

static NEXT_WINDOW_SERIAL: AtomicU64 = AtomicU64::new(1);

/// The shared allocation behind a window identity. Serials are process-unique
/// and never reused, so serial equality coincides with allocation identity.
struct WindowCell {
    serial: u64,
    created_at: i64,
}

/// Opaque handle to one distinct remote browsing context
///
/// Handles are cheap to clone; all clones denote the same context. Equality
/// is reference identity on the underlying allocation, never structural:
/// two independently created identities are never equal, regardless of any
/// metadata they carry or where the handle came from.
#[derive(Clone)]
pub struct WindowIdentity {
    cell: Arc<WindowCell>,
}

impl WindowIdentity {
    /// Mint a fresh identity denoting a new remote context
    pub fn new() -> Self {
        let serial = NEXT_WINDOW_SERIAL.fetch_add(1, Ordering::Relaxed);
        debug!(serial, "minting window identity");
        Self {
            cell: Arc::new(WindowCell {
                serial,
                created_at: chrono::Utc::now().timestamp_millis(),
            }),
        }
    }

    /// Process-unique serial for this context
    pub fn serial(&self) -> u64 {
        self.cell.serial
    }

    /// Creation timestamp (unix ms)
    pub fn created_at(&self) -> i64 {
        self.cell.created_at
    }

    /// True when both handles denote the same context
    pub fn same_window(&self, other: &WindowIdentity) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }

    fn downgrade(&self) -> Weak<WindowCell> {
        Arc::downgrade(&self.cell)
    }
}

impl Default for WindowIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for WindowIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.same_window(other)
    }
}

impl Eq for WindowIdentity {}

impl Hash for WindowIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.cell.serial.hash(state);
    }
}

impl fmt::Debug for WindowIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WindowIdentity(#{})", self.cell.serial)
    }
}

/// Per-identity slot: a weak back-reference plus the sub-keyed values
struct WindowSlot<T> {
    window: Weak<WindowCell>,
    values: HashMap<String, T>,
}

/// Factory producing the initial per-identity container
type SlotSeedFn<T> = Arc<dyn Fn() -> HashMap<String, T> + Send + Sync>;

/// Mapping from [`WindowIdentity`] to `T`, held via weak association
///
/// Values for one identity live in a sub-keyed container (sub-key = store
/// name), so independently-named window-scoped stores keep distinct values
/// for the same identity. The slot table holds only [`Weak`] references to
/// identities; dead slots are purged on every operation.
pub struct WindowScopedStore<T> {
    name: String,
    slots: Arc<Mutex<HashMap<u64, WindowSlot<T>>>>,
    seed: Option<SlotSeedFn<T>>,
}

impl<T> Clone for WindowScopedStore<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            slots: Arc::clone(&self.slots),
            seed: self.seed.clone(),
        }
    }
}

impl<T: Clone> WindowScopedStore<T> {
    /// Create a store with the given sub-key name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slots: Arc::new(Mutex::new(HashMap::new())),
            seed: None,
        }
    }

    /// Create a store whose per-identity containers start as `seed()`
    pub fn with_seed<F>(name: impl Into<String>, seed: F) -> Self
    where
        F: Fn() -> HashMap<String, T> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            slots: Arc::new(Mutex::new(HashMap::new())),
            seed: Some(Arc::new(seed)),
        }
    }

    /// The sub-key this store uses inside per-identity containers
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check whether a value is present for this identity
    pub fn has(&self, win: &WindowIdentity) -> bool {
        self.with_slot(win, |values, name| values.contains_key(name))
    }

    /// Get the value for this identity, or `None` if absent
    pub fn get(&self, win: &WindowIdentity) -> Option<T> {
        self.with_slot(win, |values, name| values.get(name).cloned())
    }

    /// Get the value for this identity, or the supplied default if absent
    pub fn get_or(&self, win: &WindowIdentity, default: T) -> T {
        self.get(win).unwrap_or(default)
    }

    /// Set the value for this identity, replacing any previous value
    pub fn set(&self, win: &WindowIdentity, value: T) {
        self.with_slot(win, |values, name| {
            values.insert(name.to_string(), value);
        });
    }

    /// Delete the value for this identity; a no-op if absent
    pub fn del(&self, win: &WindowIdentity) {
        self.with_slot(win, |values, name| {
            values.remove(name);
        });
    }

    /// Return the value for this identity, constructing it on first use
    ///
    /// The factory is synchronous and runs at most once per identity until
    /// an intervening `del` (or the identity itself is dropped).
    pub fn get_or_set(&self, win: &WindowIdentity, factory: impl FnOnce() -> T) -> T {
        self.with_slot(win, |values, name| {
            if let Some(existing) = values.get(name) {
                return existing.clone();
            }
            debug!(store = name, window = win.serial(), "constructing window entry");
            let value = factory();
            values.insert(name.to_string(), value.clone());
            value
        })
    }

    /// Drop every slot whose identity is no longer reachable elsewhere;
    /// returns how many were reclaimed
    pub fn purge(&self) -> usize {
        let mut slots = self.lock();
        Self::purge_locked(&mut slots)
    }

    /// Number of identities with a live slot
    pub fn window_count(&self) -> usize {
        let mut slots = self.lock();
        Self::purge_locked(&mut slots);
        slots.len()
    }

    /// Resolve (get-or-create) the per-identity container, then run `op`
    /// on it. Dead slots are reclaimed first, on every operation.
    fn with_slot<R>(&self, win: &WindowIdentity, op: impl FnOnce(&mut HashMap<String, T>, &str) -> R) -> R {
        let mut slots = self.lock();
        Self::purge_locked(&mut slots);

        let slot = slots.entry(win.serial()).or_insert_with(|| WindowSlot {
            window: win.downgrade(),
            values: match &self.seed {
                Some(seed) => seed(),
                None => HashMap::new(),
            },
        });

        op(&mut slot.values, &self.name)
    }

    fn purge_locked(slots: &mut HashMap<u64, WindowSlot<T>>) -> usize {
        let before = slots.len();
        slots.retain(|_, slot| slot.window.upgrade().is_some());
        let reclaimed = before - slots.len();
        if reclaimed > 0 {
            debug!(reclaimed, "reclaimed dead window slots");
        }
        reclaimed
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, WindowSlot<T>>> {
        self.slots.lock().expect("winstore lock poisoned")
    }
}

impl<T> fmt::Debug for WindowScopedStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.slots.lock().map(|m| m.len()).unwrap_or(0);
        f.debug_struct("WindowScopedStore")
            .field("name", &self.name)
            .field("slots", &len)
            .finish()
    }
}

/// Get or create the process-wide window-scoped store named `name`
///
/// Stores are memoized by name (and value type) in the global registry, so
/// repeat calls return handles to the same store and its single weak table.
pub fn window_store<T>(name: &str) -> WindowScopedStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    global_store::<WindowScopedStore<T>>(WINDOW_STORE_NAMESPACE)
        .get_or_set(name, || WindowScopedStore::new(name))
}

/// Like [`window_store`], but the first call installs `seed` as the
/// per-identity container factory
pub fn window_store_with<T, F>(name: &str, seed: F) -> WindowScopedStore<T>
where
    T: Clone + Send + Sync + 'static,
    F: Fn() -> HashMap<String, T> + Send + Sync + 'static,
{
    global_store::<WindowScopedStore<T>>(WINDOW_STORE_NAMESPACE)
        .get_or_set(name, || WindowScopedStore::with_seed(name, seed))
}
