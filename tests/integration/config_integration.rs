//! Integration tests for layered config loading and validation

use crate::integration::test_utils::{
    empty_capabilities, with_config_env, CallCounter, CountingOperation,
};
use paneline::cli::{Commands, RunContext, TargetArgs};
use paneline::config::ConfigLoader;
use paneline::store::StateBackend;
use paneline::{ApiError, OperationRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

const PANE_CONFIG: &str = r#"
[state]
backend = "memory"

[locations.pane]
template = "{{ .vim }}|{{ .exit_code }}"
operations = [{ type = "vim" }, { type = "exit_code" }]
"#;

#[test]
fn test_global_file_is_discovered() {
    let test_dir = TempDir::new().unwrap();
    with_config_env(&test_dir, || {
        let dir = test_dir.path().join("config").join("paneline");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.toml"), PANE_CONFIG).unwrap();

        assert_eq!(
            ConfigLoader::global_config_path(),
            Some(dir.join("config.toml"))
        );
        let config = ConfigLoader::load().unwrap();
        assert_eq!(config.state.backend, StateBackend::Memory);
        assert!(config.locations.contains_key("pane"));
    });
}

#[test]
fn test_no_global_file_yields_defaults() {
    let test_dir = TempDir::new().unwrap();
    with_config_env(&test_dir, || {
        assert_eq!(ConfigLoader::global_config_path(), None);
        let config = ConfigLoader::load().unwrap();
        assert_eq!(config.state.backend, StateBackend::Sled);
        assert!(config.locations.is_empty());
    });
}

#[test]
fn test_explicit_file_replaces_global_file() {
    let test_dir = TempDir::new().unwrap();
    with_config_env(&test_dir, || {
        let dir = test_dir.path().join("config").join("paneline");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("config.toml"),
            "post_commands = [\"echo global\"]\n",
        )
        .unwrap();

        let explicit = test_dir.path().join("explicit.toml");
        std::fs::write(&explicit, PANE_CONFIG).unwrap();

        let config = ConfigLoader::load_with(Some(explicit.as_path())).unwrap();
        assert!(config.post_commands.is_empty());
        assert!(config.locations.contains_key("pane"));
    });
}

#[test]
fn test_environment_overrides_file() {
    let test_dir = TempDir::new().unwrap();
    with_config_env(&test_dir, || {
        let explicit = test_dir.path().join("explicit.toml");
        std::fs::write(&explicit, PANE_CONFIG).unwrap();

        std::env::set_var("PANELINE__UPDATE__TIMEOUT_MS", "1234");
        let loaded = ConfigLoader::load_from_file(&explicit);
        std::env::remove_var("PANELINE__UPDATE__TIMEOUT_MS");

        assert_eq!(loaded.unwrap().update.timeout_ms, 1234);
    });
}

/// An unknown operation is rejected at validation, before any operation runs.
#[test]
fn test_unknown_operation_fails_before_any_engine_call() {
    let test_dir = TempDir::new().unwrap();
    let explicit = test_dir.path().join("config.toml");
    std::fs::write(
        &explicit,
        r#"
[locations.pane]
template = "{{ .counting }}"
operations = [{ type = "counting" }, { type = "does_not_exist" }]
"#,
    )
    .unwrap();

    let counter = CallCounter::default();
    let handle = counter.clone();
    let mut registry = OperationRegistry::with_builtins();
    registry.register_simple("counting", move || CountingOperation(handle.clone()));

    let config = ConfigLoader::load_from_file(&explicit).unwrap();
    let err = config.validate(&registry).unwrap_err();
    assert!(matches!(err, ApiError::UnknownOperation(name) if name.as_str() == "does_not_exist"));
    assert_eq!(counter.count(), 0);
}

#[test]
fn test_run_context_end_to_end_with_memory_backend() {
    let test_dir = TempDir::new().unwrap();
    let explicit = test_dir.path().join("config.toml");
    std::fs::write(&explicit, PANE_CONFIG).unwrap();

    let config = ConfigLoader::load_from_file(&explicit).unwrap();
    let registry = OperationRegistry::with_builtins();
    let validated = config.validate(&registry).unwrap();
    let context = RunContext::with_parts(
        validated,
        Some(explicit.clone()),
        Arc::new(registry),
        empty_capabilities(),
    );

    for (operation, value) in [("vim", "NORMAL"), ("exit_code", "127")] {
        context
            .execute(&Commands::SetState {
                location: "pane".to_string(),
                instance: "$2.%4".to_string(),
                operation: operation.to_string(),
                value: value.to_string(),
            })
            .unwrap();
    }

    let args = TargetArgs {
        location: "pane".to_string(),
        instance: "$2.%4".to_string(),
        path: PathBuf::from("/"),
    };
    context.execute(&Commands::Update(args.clone())).unwrap();
    let output = context.execute(&Commands::Generate(args)).unwrap();
    assert_eq!(output, "NORMAL|127");
}

#[test]
fn test_mixed_case_location_round_trips_through_cli() {
    let test_dir = TempDir::new().unwrap();
    let explicit = test_dir.path().join("config.toml");
    std::fs::write(
        &explicit,
        r#"
[state]
backend = "memory"

[locations.StatusLeft]
template = "[{{ .vim }}]"
operations = [{ type = "vim" }]
"#,
    )
    .unwrap();

    let registry = OperationRegistry::with_builtins();
    let validated = ConfigLoader::load_from_file(&explicit)
        .unwrap()
        .validate(&registry)
        .unwrap();
    let context = RunContext::with_parts(
        validated,
        Some(explicit.clone()),
        Arc::new(registry),
        empty_capabilities(),
    );

    context
        .execute(&Commands::SetState {
            location: "StatusLeft".to_string(),
            instance: "$1.%3".to_string(),
            operation: "vim".to_string(),
            value: "INSERT".to_string(),
        })
        .unwrap();
    let output = context
        .execute(&Commands::Generate(TargetArgs {
            location: "StatusLeft".to_string(),
            instance: "$1.%3".to_string(),
            path: PathBuf::from("/"),
        }))
        .unwrap();
    assert_eq!(output, "[INSERT]");

    let err = context
        .execute(&Commands::Generate(TargetArgs {
            location: "statusleft".to_string(),
            instance: "$1.%3".to_string(),
            path: PathBuf::from("/"),
        }))
        .unwrap_err();
    assert!(matches!(err, ApiError::LocationNotFound(_)));
}
