//! State Store
//!
//! Key-value persistence for operation state, keyed by
//! (LocationKey, InstanceKey, OperationName). Values are opaque strings owned by the
//! operation that wrote them. A missing record reads as the empty string.

pub mod memory;
pub mod persistence;

pub use memory::MemoryStateStore;
pub use persistence::SledStateStore;

use crate::error::StorageError;
use crate::types::{InstanceKey, LocationKey, OperationName};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// State Store interface
///
/// Implementations must be safe to share between threads. Writes are last-write-wins;
/// there is no versioning or optimistic concurrency.
pub trait StateStore: Send + Sync {
    /// Current value, or `""` when nothing was ever stored.
    fn get(
        &self,
        location: &LocationKey,
        instance: &InstanceKey,
        operation: &OperationName,
    ) -> Result<String, StorageError>;

    /// Insert or replace.
    fn set(
        &self,
        location: &LocationKey,
        instance: &InstanceKey,
        operation: &OperationName,
        value: &str,
    ) -> Result<(), StorageError>;

    /// Release backing resources. Later calls fail with [`StorageError::Closed`].
    fn close(&self) -> Result<(), StorageError>;
}

/// Which backend to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateBackend {
    Sled,
    Memory,
}

/// State store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    #[serde(default = "default_backend")]
    pub backend: StateBackend,

    /// Database directory; resolved against the config directory when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Hold the database open for the lifetime of the store instead of per call.
    #[serde(default)]
    pub keep_open: bool,

    /// How long to retry while another process holds the database lock.
    #[serde(default = "default_open_timeout_ms")]
    pub open_timeout_ms: u64,
}

fn default_backend() -> StateBackend {
    StateBackend::Sled
}

fn default_open_timeout_ms() -> u64 {
    2000
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: None,
            keep_open: false,
            open_timeout_ms: default_open_timeout_ms(),
        }
    }
}

impl StateConfig {
    pub fn open_timeout(&self) -> Duration {
        Duration::from_millis(self.open_timeout_ms)
    }
}

/// Open the configured backend. `default_path` is used when the config names none.
pub fn open_state_store(
    config: &StateConfig,
    default_path: PathBuf,
) -> Result<Arc<dyn StateStore>, StorageError> {
    match config.backend {
        StateBackend::Memory => Ok(Arc::new(MemoryStateStore::new())),
        StateBackend::Sled => {
            let path = config.path.clone().unwrap_or(default_path);
            let store = if config.keep_open {
                SledStateStore::open(&path, config.open_timeout())?
            } else {
                SledStateStore::per_call(&path, config.open_timeout())?
            };
            Ok(Arc::new(store))
        }
    }
}
