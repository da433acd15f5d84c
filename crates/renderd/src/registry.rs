//! Keyed store of renderable components.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Thread-safe mapping from a string key to a shared component value.
///
/// Registration replaces any previous entry for the key; there is no removal.
/// Values are stored behind [`Arc`] so lookups hand out shared handles rather
/// than copies, and a registration swaps in a complete handle under the write
/// lock so concurrent lookups observe either the old or the new value.
pub struct Registry<T> {
    entries: RwLock<HashMap<String, Arc<T>>>,
}

impl<T> Registry<T> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Stores `component` under `key`, overwriting any existing entry.
    pub fn register(&self, key: impl Into<String>, component: T) {
        let component = Arc::new(component);
        // A panic while holding the lock cannot leave the map half-updated,
        // so a poisoned lock is still safe to use.
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.into(), component);
    }

    /// Returns the component registered under `key`.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<Arc<T>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    /// Whether a component is registered under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.contains_key(key)
    }

    /// Number of registered keys.
    #[must_use]
    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.len()
    }

    /// Whether nothing has been registered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Registry<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Registry")
            .field("len", &self.len())
            .finish()
    }
}
