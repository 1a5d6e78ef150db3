//! Shared test utilities for integration tests
//!
//! Environment isolation for config loading, fake capabilities, and small operations
//! used to drive the engines end to end.

use paneline::capability::fake::{FakeCommandRunner, FakeEnv};
use paneline::{Capabilities, Operation, OperationContext, OperationError, OperationName};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Global mutex to serialize environment variable access across all tests
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const ISOLATED_VARS: [&str; 2] = ["HOME", "XDG_CONFIG_HOME"];

/// Point HOME and XDG_CONFIG_HOME into `test_dir` for the duration of `f`.
pub fn with_config_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let saved: Vec<(&str, Option<String>)> = ISOLATED_VARS
        .iter()
        .map(|name| (*name, std::env::var(name).ok()))
        .collect();

    let home = test_dir.path().join("home");
    let config_home = test_dir.path().join("config");
    std::fs::create_dir_all(&home).unwrap();
    std::fs::create_dir_all(&config_home).unwrap();
    std::env::set_var("HOME", &home);
    std::env::set_var("XDG_CONFIG_HOME", &config_home);

    let result = f();

    for (name, value) in saved {
        match value {
            Some(v) => std::env::set_var(name, v),
            None => std::env::remove_var(name),
        }
    }
    result
}

/// Capabilities that never touch the real system.
pub fn fake_capabilities(commands: FakeCommandRunner, env: FakeEnv) -> Capabilities {
    Capabilities::new(Arc::new(commands), Arc::new(env))
}

pub fn empty_capabilities() -> Capabilities {
    fake_capabilities(FakeCommandRunner::new(), FakeEnv::new())
}

/// Reads `{"bar": ...}` from its state and returns `{foo: "foo", bar: <state.bar>}`.
pub struct TestOperation;

impl Operation for TestOperation {
    fn name(&self) -> OperationName {
        OperationName::new("test")
    }

    fn is_async(&self) -> bool {
        false
    }

    fn generate(&self, _: &OperationContext<'_>, state: &str) -> Result<Value, OperationError> {
        let stored: Value = serde_json::from_str(state)
            .map_err(|e| OperationError::InvalidState(e.to_string()))?;
        Ok(json!({ "foo": "foo", "bar": stored["bar"] }))
    }

    fn update(&self, _: &OperationContext<'_>, state: &str) -> Result<String, OperationError> {
        Ok(state.to_string())
    }
}

/// Always returns `{baz: "baz"}`.
pub struct Test2Operation;

impl Operation for Test2Operation {
    fn name(&self) -> OperationName {
        OperationName::new("test2")
    }

    fn is_async(&self) -> bool {
        false
    }

    fn generate(&self, _: &OperationContext<'_>, _: &str) -> Result<Value, OperationError> {
        Ok(json!({ "baz": "baz" }))
    }

    fn update(&self, _: &OperationContext<'_>, state: &str) -> Result<String, OperationError> {
        Ok(state.to_string())
    }
}

/// Counts every generate and update call.
#[derive(Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct CountingOperation(pub CallCounter);

impl Operation for CountingOperation {
    fn name(&self) -> OperationName {
        OperationName::new("counting")
    }

    fn is_async(&self) -> bool {
        true
    }

    fn generate(&self, _: &OperationContext<'_>, state: &str) -> Result<Value, OperationError> {
        (self.0).0.fetch_add(1, Ordering::SeqCst);
        Ok(Value::String(state.to_string()))
    }

    fn update(&self, _: &OperationContext<'_>, state: &str) -> Result<String, OperationError> {
        (self.0).0.fetch_add(1, Ordering::SeqCst);
        Ok(state.to_string())
    }
}
