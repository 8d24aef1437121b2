//! Generic keyed store with lazy construction
//!
//! A [`KeyedStore`] is a cheaply-cloneable handle to a shared `String -> T`
//! mapping. Absent keys never error: reads yield `None` or a caller-supplied
//! default, and `get_or_set` constructs the value exactly once.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

/// Factory that produces the initial backing map for a store
type SeedFn<T> = Arc<dyn Fn() -> HashMap<String, T> + Send + Sync>;

/// Cheaply-cloneable keyed store handle
///
/// All clones share one backing map. Mutations are synchronous critical
/// sections: the backing lock is held for the whole operation, including the
/// `get_or_set` factory call, so no caller can observe a partially
/// constructed value or trigger a second construction for the same key.
pub struct KeyedStore<T> {
    inner: Arc<Mutex<HashMap<String, T>>>,
    seed: Option<SeedFn<T>>,
}

impl<T> Clone for KeyedStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            seed: self.seed.clone(),
        }
    }
}

impl<T: Clone> KeyedStore<T> {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            seed: None,
        }
    }

    /// Create a store whose backing map starts as `seed()` and is replaced
    /// by a fresh `seed()` result on every [`reset`](Self::reset)
    pub fn with_seed<F>(seed: F) -> Self
    where
        F: Fn() -> HashMap<String, T> + Send + Sync + 'static,
    {
        let seed: SeedFn<T> = Arc::new(seed);
        Self {
            inner: Arc::new(Mutex::new(seed())),
            seed: Some(seed),
        }
    }

    /// Check whether a key is present
    pub fn has(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    /// Get the value for a key, or `None` if absent
    pub fn get(&self, key: &str) -> Option<T> {
        self.lock().get(key).cloned()
    }

    /// Get the value for a key, or the supplied default if absent
    ///
    /// The default is returned, not stored; a later `get` for the same key
    /// still sees the store as empty.
    pub fn get_or(&self, key: &str, default: T) -> T {
        self.lock().get(key).cloned().unwrap_or(default)
    }

    /// Set a key to a value, replacing any previous value
    pub fn set(&self, key: impl Into<String>, value: T) {
        self.lock().insert(key.into(), value);
    }

    /// Delete a key; a no-op if absent
    pub fn del(&self, key: &str) {
        self.lock().remove(key);
    }

    /// Return the value for a key, constructing it via `factory` on first use
    ///
    /// If the key exists the stored value is returned and `factory` is never
    /// invoked. Otherwise `factory` runs exactly once, its result is stored
    /// under the key, and a clone is returned. The factory is synchronous and
    /// runs to completion before any other operation on this store executes.
    pub fn get_or_set(&self, key: &str, factory: impl FnOnce() -> T) -> T {
        let mut map = self.lock();
        if let Some(existing) = map.get(key) {
            return existing.clone();
        }
        debug!(key, "constructing store entry");
        let value = factory();
        map.insert(key.to_string(), value.clone());
        value
    }

    /// Discard every key, atomically replacing the backing map
    ///
    /// Stores built with [`with_seed`](Self::with_seed) reinstall a fresh
    /// seed map; others become empty.
    pub fn reset(&self) {
        let fresh = match &self.seed {
            Some(seed) => seed(),
            None => HashMap::new(),
        };
        debug!(seeded = self.seed.is_some(), "resetting store");
        *self.lock() = fresh;
    }

    /// Snapshot of the current keys, in no particular order
    pub fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Number of keys currently present
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when no keys are present
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, T>> {
        self.inner.lock().expect("winstore lock poisoned")
    }
}

impl<T: Clone> Default for KeyedStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for KeyedStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let len = self.inner.lock().map(|m| m.len()).unwrap_or(0);
        f.debug_struct("KeyedStore").field("len", &len).finish()
    }
}
