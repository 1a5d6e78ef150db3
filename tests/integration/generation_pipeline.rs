//! Integration tests for config validation feeding the generation engine

use crate::integration::test_utils::{
    empty_capabilities, fake_capabilities, Test2Operation, TestOperation,
};
use paneline::capability::fake::{FakeCommandRunner, FakeEnv};
use paneline::config::{AppConfig, LocationConfig};
use paneline::operation::OperationParams;
use paneline::{
    ApiError, GenerationEngine, MemoryStateStore, OperationRegistry, Stage, StateStore, Target,
    UpdateEngine,
};
use serde_json::{json, Value};

fn operations(entries: Vec<Value>) -> Vec<OperationParams> {
    entries
        .into_iter()
        .filter_map(|v| v.as_object().cloned())
        .collect()
}

fn registry() -> OperationRegistry {
    let mut registry = OperationRegistry::with_builtins();
    registry.register_simple("test", || TestOperation);
    registry.register_simple("test2", || Test2Operation);
    registry
}

fn config(template: &str, entries: Vec<Value>) -> AppConfig {
    let mut config = AppConfig::default();
    config.locations.insert(
        "test".to_string(),
        LocationConfig {
            template: template.to_string(),
            operations: operations(entries),
        },
    );
    config
}

#[test]
fn test_nested_fields_from_two_operations() {
    let registry = registry();
    let validated = config(
        "test > {{.test.foo}} > {{.test.bar}} > {{.test2.baz}}",
        vec![json!({"type": "test"}), json!({"type": "test2"})],
    )
    .validate(&registry)
    .unwrap();
    let location = validated.location(&"test".into()).unwrap();

    let store = MemoryStateStore::new();
    store
        .set(&"test".into(), &"test".into(), &"test".into(), r#"{"bar":"bar"}"#)
        .unwrap();

    let output = GenerationEngine::new(&registry)
        .generate(
            &store,
            location,
            &Target::new("test", "test", "/"),
            &empty_capabilities(),
        )
        .unwrap();
    assert_eq!(output, "test > foo > bar > baz");
}

#[test]
fn test_missing_state_aborts_generation() {
    let registry = registry();
    let validated = config(
        "{{.test2.baz}} {{.test.foo}}",
        vec![json!({"type": "test2"}), json!({"type": "test"})],
    )
    .validate(&registry)
    .unwrap();

    let err = GenerationEngine::new(&registry)
        .generate(
            &MemoryStateStore::new(),
            validated.location(&"test".into()).unwrap(),
            &Target::new("test", "test", "/"),
            &empty_capabilities(),
        )
        .unwrap_err();
    match err {
        ApiError::Operation {
            operation, stage, ..
        } => {
            assert_eq!(operation.as_str(), "test");
            assert_eq!(stage, Stage::Generate);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_generation_is_repeatable() {
    let registry = registry();
    let validated = config(
        "{{ .test.foo }}{{ if .test2 }}!{{ end }}",
        vec![json!({"type": "test"}), json!({"type": "test2"})],
    )
    .validate(&registry)
    .unwrap();
    let location = validated.location(&"test".into()).unwrap();
    let store = MemoryStateStore::new();
    store
        .set(&"test".into(), &"1".into(), &"test".into(), r#"{"bar":1}"#)
        .unwrap();
    let target = Target::new("test", "1", "/");

    let engine = GenerationEngine::new(&registry);
    let first = engine
        .generate(&store, location, &target, &empty_capabilities())
        .unwrap();
    let second = engine
        .generate(&store, location, &target, &empty_capabilities())
        .unwrap();
    assert_eq!(first, "foo!");
    assert_eq!(first, second);
}

#[test]
fn test_builtin_status_line_after_update() {
    let registry = OperationRegistry::with_builtins();
    let validated = config(
        "{{ .git.branch }}{{ if .git.dirty }}*{{ end }} {{ .working_directory }}{{ if .in_tmux }} [{{ .tmux_current_pane }}]{{ end }}",
        vec![
            json!({"type": "git"}),
            json!({"type": "working_directory"}),
            json!({"type": "in_tmux"}),
            json!({"type": "tmux_current_pane"}),
        ],
    )
    .validate(&registry)
    .unwrap();
    let location = validated.location(&"test".into()).unwrap();

    let capabilities = fake_capabilities(
        FakeCommandRunner::new()
            .respond("git rev-parse --abbrev-ref HEAD", "main\n")
            .respond("git status -s", " M src/lib.rs\n"),
        FakeEnv::new()
            .with("HOME", "/home/user")
            .with("TMUX", "/tmp/tmux-1000/default,1234,0"),
    );
    let store = MemoryStateStore::new();
    let target = Target::new("test", "$1.%7", "/home/user/work/paneline");

    UpdateEngine::new(&registry)
        .update(&store, location, &target, &capabilities)
        .unwrap();
    let output = GenerationEngine::new(&registry)
        .generate(&store, location, &target, &capabilities)
        .unwrap();
    assert_eq!(output, "main* ~/work/paneline [%7]");
}
