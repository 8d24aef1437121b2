//! WinStore - keyed stores for cross-window test harnesses
//!
//! Provides the storage primitives a multi-context harness rendezvouses on:
//! process-wide named stores and per-window stores whose entries never keep
//! an unreachable browsing context alive.
//!
//! # Architecture
//!
//! ```text
//! process registry (lives for the process)
//! ├── "store" / T            -> KeyedStore<T>
//! └── "windowStore" / T      -> KeyedStore<WindowScopedStore<T>>
//!                                └── per-identity weak slots
//!                                    └── sub-keyed values (by store name)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use winstore::{global_store, window_store, WindowIdentity};
//!
//! let counters = global_store::<u32>("counters");
//! let hits = counters.get_or_set("hits", || 0);
//!
//! let win = WindowIdentity::new();
//! let labels = window_store::<String>("labels");
//! labels.set(&win, "child-frame".to_string());
//! ```

pub mod registry;
pub mod store;
pub mod window;

pub use registry::{DEFAULT_STORE_NAME, global_store, global_store_with};
pub use store::KeyedStore;
pub use window::{WindowIdentity, WindowScopedStore, window_store, window_store_with};
