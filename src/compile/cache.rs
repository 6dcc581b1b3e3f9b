//! Storage for compiled executables.
use super::Executable;
use parking_lot::RwLock;
use std::{collections::HashMap, fmt::Debug, sync::Arc};

/// A key/value store for [`Executable`]s, keyed by template identifier.
///
/// Implementations are shared between concurrent renders. A missing entry is
/// always a cache miss, never an error.
pub trait Cache: Debug + Send + Sync {
    /// Return the [`Executable`] stored under the key.
    fn get(&self, key: &str) -> Option<Arc<Executable>>;

    /// Store the [`Executable`] under the key, replacing any previous entry.
    fn set(&self, key: &str, executable: Arc<Executable>);

    /// Remove every entry.
    fn flush(&self);
}

/// An in-memory [`Cache`] that can be shared across threads.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Arc<Executable>>>,
}

impl MemoryCache {
    /// Create an empty [`MemoryCache`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached executables.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<Arc<Executable>> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, executable: Arc<Executable>) {
        self.entries.write().insert(key.to_owned(), executable);
    }

    fn flush(&self) {
        self.entries.write().clear();
    }
}

/// A [`Cache`] that stores nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCache;

impl Cache for NullCache {
    fn get(&self, _: &str) -> Option<Arc<Executable>> {
        None
    }

    fn set(&self, _: &str, _: Arc<Executable>) {}

    fn flush(&self) {}
}
