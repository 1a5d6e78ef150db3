//! Integration tests for the state store backends

use paneline::store::{open_state_store, StateBackend, StateConfig};
use paneline::{MemoryStateStore, SledStateStore, StateStore, StorageError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

const TIMEOUT: Duration = Duration::from_secs(2);

fn exercise(store: &dyn StateStore) {
    let (loc, inst, op) = ("pane".into(), "$0.%1".into(), "vim".into());
    assert_eq!(store.get(&loc, &inst, &op).unwrap(), "");

    store.set(&loc, &inst, &op, "INSERT").unwrap();
    store.set(&loc, &inst, &op, "NORMAL").unwrap();
    assert_eq!(store.get(&loc, &inst, &op).unwrap(), "NORMAL");

    // Neighbouring keys are independent.
    assert_eq!(store.get(&loc, &"$0.%2".into(), &op).unwrap(), "");
    assert_eq!(store.get(&"status".into(), &inst, &op).unwrap(), "");

    store.close().unwrap();
    assert!(matches!(
        store.get(&loc, &inst, &op),
        Err(StorageError::Closed)
    ));
}

#[test]
fn test_memory_store_contract() {
    exercise(&MemoryStateStore::new());
}

#[test]
fn test_sled_store_contract() {
    let dir = TempDir::new().unwrap();
    exercise(&SledStateStore::open(dir.path(), TIMEOUT).unwrap());

    let dir = TempDir::new().unwrap();
    exercise(&SledStateStore::per_call(dir.path(), TIMEOUT).unwrap());
}

#[test]
fn test_open_state_store_selects_backend() {
    let dir = TempDir::new().unwrap();
    let config = StateConfig {
        backend: StateBackend::Sled,
        path: Some(dir.path().join("db")),
        keep_open: false,
        open_timeout_ms: 2000,
    };
    let store = open_state_store(&config, dir.path().join("unused")).unwrap();
    store
        .set(&"pane".into(), &"1".into(), &"vim".into(), "x")
        .unwrap();
    assert!(dir.path().join("db").exists());
    assert!(!dir.path().join("unused").exists());

    let memory = StateConfig {
        backend: StateBackend::Memory,
        ..StateConfig::default()
    };
    let store = open_state_store(&memory, dir.path().join("never")).unwrap();
    assert_eq!(
        store
            .get(&"pane".into(), &"1".into(), &"vim".into())
            .unwrap(),
        ""
    );
    assert!(!dir.path().join("never").exists());
}

/// Per-call stores in separate handles share one database without holding its lock.
#[test]
fn test_per_call_handles_interleave() {
    let dir = TempDir::new().unwrap();
    let writers: Vec<_> = (0..4)
        .map(|i| {
            let path = dir.path().to_path_buf();
            thread::spawn(move || {
                let store = SledStateStore::per_call(&path, Duration::from_secs(10)).unwrap();
                for j in 0..5 {
                    store
                        .set(
                            &"pane".into(),
                            &format!("{}", i).into(),
                            &"exit_code".into(),
                            &j.to_string(),
                        )
                        .unwrap();
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    let store = SledStateStore::open(dir.path(), TIMEOUT).unwrap();
    for i in 0..4 {
        assert_eq!(
            store
                .get(&"pane".into(), &format!("{}", i).into(), &"exit_code".into())
                .unwrap(),
            "4"
        );
    }
}

#[test]
fn test_memory_store_shared_across_threads() {
    let store: Arc<dyn StateStore> = Arc::new(MemoryStateStore::new());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                store
                    .set(&"pane".into(), &i.to_string().into(), &"vim".into(), "V")
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    for i in 0..8 {
        assert_eq!(
            store
                .get(&"pane".into(), &i.to_string().into(), &"vim".into())
                .unwrap(),
            "V"
        );
    }
}
