//! Key-value storage abstraction for meals and the task → meal index.

use std::sync::RwLock;

use rustc_hash::FxHashMap;

use crate::error::PlannerError;

/// Error types for storage backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A lock guarding the backing map was poisoned by a panicking writer.
    Poisoned,
    /// Backend-specific failure.
    Backend(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Poisoned => write!(f, "Storage lock poisoned"),
            StoreError::Backend(msg) => write!(f, "Storage failure: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<StoreError> for PlannerError {
    fn from(err: StoreError) -> Self {
        PlannerError::Internal(err.to_string())
    }
}

/// Storage keyed by opaque string ids.
pub trait Store<V>: Send + Sync {
    fn get(&self, id: &str) -> Result<Option<V>, StoreError>;
    fn put(&self, id: &str, value: V) -> Result<(), StoreError>;
    fn exists(&self, id: &str) -> Result<bool, StoreError>;
}

/// Volatile in-process store.
#[derive(Debug)]
pub struct InMemoryStore<V> {
    entries: RwLock<FxHashMap<String, V>>,
}

impl<V> Default for InMemoryStore<V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(FxHashMap::default()),
        }
    }
}

impl<V> InMemoryStore<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.entries.read().map_err(|_| StoreError::Poisoned)?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl<V: Clone + Send + Sync> Store<V> for InMemoryStore<V> {
    fn get(&self, id: &str) -> Result<Option<V>, StoreError> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(id).cloned())
    }

    fn put(&self, id: &str, value: V) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        entries.insert(id.to_string(), value);
        Ok(())
    }

    fn exists(&self, id: &str) -> Result<bool, StoreError> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.contains_key(id))
    }
}
