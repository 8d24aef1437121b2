//! Process-wide registry of named stores
//!
//! Unrelated modules rendezvous on the same store by name without explicit
//! wiring. The registry is intentionally shared mutable state scoped to the
//! whole process: it is created lazily on first access, lives for the
//! process lifetime, and has no teardown. The only clearing mechanism is
//! `reset()` on an individual store.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use tracing::debug;

use crate::store::KeyedStore;

/// Store name used when callers do not pick one
pub const DEFAULT_STORE_NAME: &str = "store";

/// Registry entries are scoped by name and value type. A name reused at a
/// different type gets a sibling store instead of a downcast failure.
type RegistryKey = (String, TypeId);

static REGISTRY: OnceLock<Mutex<HashMap<RegistryKey, Box<dyn Any + Send + Sync>>>> = OnceLock::new();

fn registry() -> &'static Mutex<HashMap<RegistryKey, Box<dyn Any + Send + Sync>>> {
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Get or create the process-wide store registered under `name`
///
/// The first call for a given name and value type constructs an empty
/// [`KeyedStore`] and remembers it for the process lifetime; every later
/// call returns a handle to that same store.
pub fn global_store<T>(name: &str) -> KeyedStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    global_store_with(name, HashMap::new)
}

/// Like [`global_store`], but the first call seeds the store via `seed`
///
/// The seed also becomes the store's `reset()` baseline. If the store
/// already exists the seed is ignored; construction happens once.
pub fn global_store_with<T, F>(name: &str, seed: F) -> KeyedStore<T>
where
    T: Clone + Send + Sync + 'static,
    F: Fn() -> HashMap<String, T> + Send + Sync + 'static,
{
    let key = (name.to_string(), TypeId::of::<KeyedStore<T>>());
    let mut reg = registry().lock().expect("registry lock poisoned");

    let entry = reg.entry(key).or_insert_with(|| {
        debug!(name, "registering global store");
        Box::new(KeyedStore::with_seed(seed))
    });

    entry
        .downcast_ref::<KeyedStore<T>>()
        .expect("registry entry keyed by TypeId")
        .clone()
}
