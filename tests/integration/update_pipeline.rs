//! Integration tests for the update engine and background runner

use crate::integration::test_utils::{
    empty_capabilities, fake_capabilities, CallCounter, CountingOperation,
};
use paneline::capability::fake::{FakeCommandRunner, FakeEnv};
use paneline::registry::Binding;
use paneline::update::{UpdateJob, UpdateRunner};
use paneline::{
    Location, MemoryStateStore, OperationRegistry, SledStateStore, StateStore, Target,
    UpdateEngine,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn read(store: &dyn StateStore, operation: &str) -> String {
    store
        .get(&"pane".into(), &"1".into(), &operation.into())
        .unwrap()
}

/// Pass-through update twice: state after the second run equals the state after the
/// first, which equals the state before either.
#[test]
fn test_pass_through_update_is_idempotent() {
    let counter = CallCounter::default();
    let mut registry = OperationRegistry::with_builtins();
    let handle = counter.clone();
    registry.register_simple("counting", move || CountingOperation(handle.clone()));

    let store = MemoryStateStore::new();
    store
        .set(&"pane".into(), &"1".into(), &"counting".into(), "seed")
        .unwrap();
    store
        .set(&"pane".into(), &"1".into(), &"vim".into(), "INSERT")
        .unwrap();
    let location = Location::new(vec![Binding::new("counting"), Binding::new("vim")], "");
    let target = Target::new("pane", "1", "/tmp");
    let engine = UpdateEngine::new(&registry);

    engine
        .update(&store, &location, &target, &empty_capabilities())
        .unwrap();
    let after_first = (read(&store, "counting"), read(&store, "vim"));
    engine
        .update(&store, &location, &target, &empty_capabilities())
        .unwrap();
    let after_second = (read(&store, "counting"), read(&store, "vim"));

    assert_eq!(after_first, ("seed".to_string(), "INSERT".to_string()));
    assert_eq!(after_first, after_second);
    assert_eq!(counter.count(), 2);
}

#[test]
fn test_update_persists_probes_to_sled() {
    let dir = TempDir::new().unwrap();
    let registry = OperationRegistry::with_builtins();
    let location = Location::new(vec![Binding::new("gcloud")], "");
    let target = Target::new("pane", "1", "/tmp");
    let capabilities = fake_capabilities(
        FakeCommandRunner::new().respond("gcloud config get-value project", "my-project\n"),
        FakeEnv::new(),
    );

    {
        let store = SledStateStore::per_call(dir.path(), Duration::from_secs(2)).unwrap();
        UpdateEngine::new(&registry)
            .update(&store, &location, &target, &capabilities)
            .unwrap();
    }

    let reopened = SledStateStore::open(dir.path(), Duration::from_secs(2)).unwrap();
    assert_eq!(read(&reopened, "gcloud"), "my-project");
}

#[tokio::test]
async fn test_runner_updates_shared_store() {
    let store = Arc::new(MemoryStateStore::new());
    let capabilities = fake_capabilities(
        FakeCommandRunner::new()
            .respond("git rev-parse --abbrev-ref HEAD", "feature\n")
            .respond("git status -s", ""),
        FakeEnv::new(),
    );
    let job = UpdateJob {
        registry: Arc::new(OperationRegistry::with_builtins()),
        store: store.clone(),
        location: Location::new(vec![Binding::new("git")], ""),
        target: Target::new("pane", "1", "/repo"),
        capabilities,
    };

    let report = UpdateRunner::new().spawn(job).wait().await.unwrap();
    assert_eq!(report.updated.len(), 1);
    assert_eq!(
        read(store.as_ref(), "git"),
        r#"{"branch":"feature","status":""}"#
    );
}
