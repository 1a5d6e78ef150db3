//! Volatile state store for tests and ephemeral runs.

use crate::error::StorageError;
use crate::store::StateStore;
use crate::types::{InstanceKey, LocationKey, OperationName, StateKey};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// In-memory implementation of StateStore
#[derive(Default)]
pub struct MemoryStateStore {
    records: RwLock<HashMap<StateKey, String>>,
    closed: AtomicBool,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    fn ensure_open(&self) -> Result<(), StorageError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StorageError::Closed);
        }
        Ok(())
    }
}

impl StateStore for MemoryStateStore {
    fn get(
        &self,
        location: &LocationKey,
        instance: &InstanceKey,
        operation: &OperationName,
    ) -> Result<String, StorageError> {
        self.ensure_open()?;
        let key = StateKey::new(location, instance, operation);
        Ok(self.records.read().get(&key).cloned().unwrap_or_default())
    }

    fn set(
        &self,
        location: &LocationKey,
        instance: &InstanceKey,
        operation: &OperationName,
        value: &str,
    ) -> Result<(), StorageError> {
        self.ensure_open()?;
        let key = StateKey::new(location, instance, operation);
        self.records.write().insert(key, value.to_string());
        Ok(())
    }

    fn close(&self) -> Result<(), StorageError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
