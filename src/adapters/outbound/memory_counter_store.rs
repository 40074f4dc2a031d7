//! In-Memory Counter Store
//!
//! Implements CounterStore using DashMap for lock-free concurrent access.
//! Values live only as long as the process; useful for local runs and tests.

use crate::domain::ports::{CounterStore, StoreError};
use async_trait::async_trait;
use dashmap::DashMap;

/// DashMap-backed counter store.
///
/// Each get and set is individually atomic, but a get followed by a set is
/// not, matching the semantics of the external store.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    values: DashMap<String, u64>,
}

impl MemoryCounterStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            values: DashMap::new(),
        }
    }

    /// Peek at a value without going through the port (for inspection).
    pub fn value(&self, key: &str) -> Option<u64> {
        self.values.get(key).map(|v| *v)
    }

    /// Number of keys held.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn get_integer(&self, key: &str) -> Result<Option<u64>, StoreError> {
        Ok(self.value(key))
    }

    async fn set_integer(&self, key: &str, value: u64) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}
