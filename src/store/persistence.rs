//! Durable state store backed by sled
//!
//! All records live in a single `state` tree whose key is the bincode encoding of the
//! composite (location, instance, operation) key. Every write is flushed before `set`
//! returns so state survives the short-lived CLI process.
//!
//! sled holds an exclusive lock on its directory per process. Opening retries until
//! `open_timeout` elapses, and the per-call mode drops the database after each get or
//! set so concurrent invocations only contend for the duration of one call.

use crate::error::StorageError;
use crate::store::StateStore;
use crate::types::{InstanceKey, LocationKey, OperationName, StateKey};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

const STATE_TREE: &str = "state";
const OPEN_RETRY_INTERVAL: Duration = Duration::from_millis(20);

enum Handle {
    Open(sled::Db),
    PerCall,
    Closed,
}

/// Sled-based implementation of StateStore
pub struct SledStateStore {
    path: PathBuf,
    open_timeout: Duration,
    handle: Mutex<Handle>,
}

impl SledStateStore {
    /// Open and hold the database at `path` until `close` or drop.
    pub fn open<P: AsRef<Path>>(path: P, open_timeout: Duration) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let db = open_db(&path, open_timeout)?;
        Ok(Self {
            path,
            open_timeout,
            handle: Mutex::new(Handle::Open(db)),
        })
    }

    /// Open the database for each call and release it afterwards.
    pub fn per_call<P: AsRef<Path>>(path: P, open_timeout: Duration) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        // Fail early on an unusable path rather than on first use.
        drop(open_db(&path, open_timeout)?);
        Ok(Self {
            path,
            open_timeout,
            handle: Mutex::new(Handle::PerCall),
        })
    }

    fn with_tree<T>(
        &self,
        f: impl FnOnce(&sled::Tree) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let handle = self.handle.lock();
        match &*handle {
            Handle::Open(db) => f(&db.open_tree(STATE_TREE)?),
            Handle::PerCall => {
                let db = open_db(&self.path, self.open_timeout)?;
                f(&db.open_tree(STATE_TREE)?)
            }
            Handle::Closed => Err(StorageError::Closed),
        }
    }
}

fn open_db(path: &Path, open_timeout: Duration) -> Result<sled::Db, StorageError> {
    let deadline = Instant::now() + open_timeout;
    loop {
        match sled::open(path) {
            Ok(db) => return Ok(db),
            // Another process holds the lock; wait for it to finish its call.
            Err(sled::Error::Io(e)) if Instant::now() < deadline => {
                debug!(path = %path.display(), error = %e, "state store busy, retrying");
                thread::sleep(OPEN_RETRY_INTERVAL);
            }
            Err(e) => {
                return Err(StorageError::Open {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })
            }
        }
    }
}

fn encode_key(key: &StateKey) -> Result<Vec<u8>, StorageError> {
    bincode::serialize(&(
        key.location.as_str(),
        key.instance.as_str(),
        key.operation.as_str(),
    ))
    .map_err(|e| StorageError::Backend(format!("Failed to encode state key {}: {}", key, e)))
}

impl StateStore for SledStateStore {
    fn get(
        &self,
        location: &LocationKey,
        instance: &InstanceKey,
        operation: &OperationName,
    ) -> Result<String, StorageError> {
        let key = StateKey::new(location, instance, operation);
        let encoded = encode_key(&key)?;
        let value = self.with_tree(|tree| Ok(tree.get(&encoded)?))?;
        match value {
            Some(bytes) => String::from_utf8(bytes.to_vec()).map_err(|e| StorageError::Corrupt {
                key: key.to_string(),
                message: e.to_string(),
            }),
            None => Ok(String::new()),
        }
    }

    fn set(
        &self,
        location: &LocationKey,
        instance: &InstanceKey,
        operation: &OperationName,
        value: &str,
    ) -> Result<(), StorageError> {
        let key = StateKey::new(location, instance, operation);
        let encoded = encode_key(&key)?;
        self.with_tree(|tree| {
            tree.insert(encoded, value.as_bytes())?;
            tree.flush()?;
            Ok(())
        })
    }

    fn close(&self) -> Result<(), StorageError> {
        let mut handle = self.handle.lock();
        if let Handle::Open(db) = &*handle {
            db.flush()?;
        }
        *handle = Handle::Closed;
        Ok(())
    }
}
