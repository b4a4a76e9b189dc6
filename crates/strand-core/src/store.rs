//! Thread-safe key/value store.
//!
//! [`Store`] is a small application cache guarded by a reader/writer lock.
//! Individual operations lock for their own duration; [`Store::view`] and
//! [`Store::update`] run a closure inside one read or write transaction.
//!
//! A store is attached to a [`Context`] under either the [`Global`] key
//! (one instance shared by every request) or the [`Local`] key (one
//! instance per request).

use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::context::{Context, ContextKey};
use crate::error::{Error, Result};

/// A value held by the store.
pub type Value = Arc<dyn Any + Send + Sync>;

/// The map exposed to transactions.
pub type Map = HashMap<String, Value>;

/// Thread-safe key/value storage.
///
/// # Example
///
/// ```
/// use strand_core::Store;
///
/// let store = Store::new();
/// store.set("hits", 1_u64);
///
/// store.update(|map| {
///     let hits = map
///         .get("hits")
///         .and_then(|v| v.downcast_ref::<u64>())
///         .copied()
///         .unwrap_or(0);
///     map.insert("hits".to_string(), std::sync::Arc::new(hits + 1));
/// });
///
/// assert_eq!(*store.get::<u64>("hits").unwrap(), 2);
/// ```
#[derive(Default)]
pub struct Store {
    data: RwLock<Map>,
}

impl Store {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a value. Returns `None` if the key is missing or holds another type.
    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        let value = self.data.read().get(key).cloned()?;
        value.downcast::<T>().ok()
    }

    /// Reads a value that must be present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the key is missing or holds another type.
    pub fn must<T: Any + Send + Sync>(&self, key: &str) -> Result<Arc<T>> {
        self.get(key).ok_or_else(|| Error::NotFound(key.to_string()))
    }

    /// Stores a value, replacing any previous value under `key`.
    pub fn set<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) {
        self.data.write().insert(key.into(), Arc::new(value));
    }

    /// Removes a value, returning true if it was present.
    pub fn remove(&self, key: &str) -> bool {
        self.data.write().remove(key).is_some()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Returns true if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Runs `f` inside a shared read transaction.
    ///
    /// Concurrent views may run in parallel. The map is only reachable
    /// through a shared reference here, so it cannot be written.
    pub fn view<R>(&self, f: impl FnOnce(&Map) -> R) -> R {
        f(&self.data.read())
    }

    /// Runs `f` inside an exclusive write transaction.
    pub fn update<R>(&self, f: impl FnOnce(&mut Map) -> R) -> R {
        f(&mut self.data.write())
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data.read();
        let mut keys: Vec<&String> = data.keys().collect();
        keys.sort();
        f.debug_struct("Store").field("keys", &keys).finish()
    }
}

/// Context key for the application-wide store.
pub struct Global;

impl ContextKey for Global {
    type Value = Arc<Store>;
}

/// Context key for the per-request store.
pub struct Local;

impl ContextKey for Local {
    type Value = Arc<Store>;
}

/// Returns the application-wide store bound to `ctx`.
#[must_use]
pub fn global(ctx: &Context) -> Option<Arc<Store>> {
    ctx.get::<Global>().cloned()
}

/// Returns the per-request store bound to `ctx`.
#[must_use]
pub fn local(ctx: &Context) -> Option<Arc<Store>> {
    ctx.get::<Local>().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let store = Store::new();
        store.set("name", "alice".to_string());
        assert_eq!(store.get::<String>("name").unwrap().as_str(), "alice");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_wrong_type_is_absent() {
        let store = Store::new();
        store.set("count", 3_u32);
        assert!(store.get::<String>("count").is_none());
        assert!(store.get::<u32>("missing").is_none());
    }

    #[test]
    fn test_must_reports_not_found() {
        let store = Store::new();
        let err = store.must::<u32>("missing").unwrap_err();
        assert!(matches!(err, Error::NotFound(ref key) if key == "missing"));
    }

    #[test]
    fn test_view_and_update() {
        let store = Store::new();
        store.update(|map| {
            map.insert("a".to_string(), Arc::new(1_i32));
            map.insert("b".to_string(), Arc::new(2_i32));
        });

        let sum: i32 = store.view(|map| {
            map.values()
                .filter_map(|v| v.downcast_ref::<i32>())
                .sum()
        });
        assert_eq!(sum, 3);
    }

    #[test]
    fn test_remove() {
        let store = Store::new();
        store.set("k", 1_u8);
        assert!(store.remove("k"));
        assert!(!store.remove("k"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_concurrent_updates() {
        let store = Arc::new(Store::new());
        store.set("n", 0_u64);

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        store.update(|map| {
                            let n = map
                                .get("n")
                                .and_then(|v| v.downcast_ref::<u64>())
                                .copied()
                                .unwrap_or(0);
                            map.insert("n".to_string(), Arc::new(n + 1));
                        });
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }

        assert_eq!(*store.get::<u64>("n").unwrap(), 800);
    }

    #[test]
    fn test_context_accessors() {
        let shared = Arc::new(Store::new());
        let ctx = Context::new().with::<Global>(Arc::clone(&shared));

        assert!(Arc::ptr_eq(&global(&ctx).unwrap(), &shared));
        assert!(local(&ctx).is_none());
    }
}
