//! CLI route: single route table and run context. Dispatches to the engines and presentation.

use crate::capability::Capabilities;
use crate::cli::parse::{Commands, TargetArgs};
use crate::cli::presentation::format_operations;
use crate::cli::{command_name, is_read_only, runs_post_commands};
use crate::config::{AppConfig, ConfigLoader, ValidatedConfig};
use crate::error::ApiError;
use crate::generation::GenerationEngine;
use crate::registry::OperationRegistry;
use crate::store::{open_state_store, StateStore};
use crate::types::{InstanceKey, LocationKey, OperationName};
use crate::update::{UpdateJob, UpdateRunner};
use parking_lot::Mutex;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How long a finished update waits for blocking work it abandoned on timeout.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(100);

/// Runtime context for CLI execution: validated config, registry, capabilities and
/// the lazily opened state store.
pub struct RunContext {
    config: ValidatedConfig,
    config_path: Option<PathBuf>,
    registry: Arc<OperationRegistry>,
    capabilities: Capabilities,
    store: Mutex<Option<Arc<dyn StateStore>>>,
}

impl RunContext {
    /// Load and validate configuration with the built-in registry and system capabilities.
    pub fn new(config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = ConfigLoader::load_with(config_path.as_deref())?;
        Self::from_app_config(&config, config_path)
    }

    /// Validate an already loaded configuration.
    pub fn from_app_config(
        config: &AppConfig,
        config_path: Option<PathBuf>,
    ) -> Result<Self, ApiError> {
        let registry = OperationRegistry::with_builtins();
        let config = config.validate(&registry)?;
        let capabilities = Capabilities::system(config.probe.timeout());
        Ok(Self::with_parts(
            config,
            config_path,
            Arc::new(registry),
            capabilities,
        ))
    }

    /// Assemble from explicit parts.
    pub fn with_parts(
        config: ValidatedConfig,
        config_path: Option<PathBuf>,
        registry: Arc<OperationRegistry>,
        capabilities: Capabilities,
    ) -> Self {
        Self {
            config,
            config_path,
            registry,
            capabilities,
            store: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ValidatedConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let started = Instant::now();
        let name = command_name(command);
        debug!(command = name, "executing");

        let result = self.execute_inner(command);
        let result = match result {
            Ok(output) if runs_post_commands(command) => self.run_post_commands().map(|_| output),
            other => other,
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(_) if is_read_only(command) => {
                debug!(command = name, duration_ms, "command completed")
            }
            Ok(_) => info!(command = name, duration_ms, "command completed"),
            Err(e) => warn!(command = name, duration_ms, error = %e, "command failed"),
        }
        result
    }

    fn execute_inner(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Generate(args) => self.handle_generate(args),
            Commands::Update(args) => self.handle_update(args),
            Commands::StartUpdate(args) => self.handle_start_update(args),
            Commands::SetState {
                location,
                instance,
                operation,
                value,
            } => self.handle_set_state(location, instance, operation, value),
            Commands::GetState {
                location,
                instance,
                operation,
            } => self.handle_get_state(location, instance, operation),
            Commands::Operations { format } => {
                let mut output = format_operations(&self.registry.describe(), format)?;
                output.push('\n');
                Ok(output)
            }
        }
    }

    fn store(&self) -> Result<Arc<dyn StateStore>, ApiError> {
        let mut slot = self.store.lock();
        if let Some(store) = slot.as_ref() {
            return Ok(Arc::clone(store));
        }
        let store = open_state_store(&self.config.state, self.config.state_path())?;
        *slot = Some(Arc::clone(&store));
        Ok(store)
    }

    fn handle_generate(&self, args: &TargetArgs) -> Result<String, ApiError> {
        let target = args.target();
        let location = self.config.location(&target.location_key)?;
        let store = self.store()?;
        GenerationEngine::new(&self.registry).generate(
            store.as_ref(),
            location,
            &target,
            &self.capabilities,
        )
    }

    fn handle_update(&self, args: &TargetArgs) -> Result<String, ApiError> {
        let target = args.target();
        let location = self.config.location(&target.location_key)?.clone();
        let job = UpdateJob {
            registry: Arc::clone(&self.registry),
            store: self.store()?,
            location,
            target,
            capabilities: self.capabilities.clone(),
        };
        let runner = UpdateRunner::with_timeout(self.config.update.timeout());

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        let result = runtime.block_on(async move { runner.spawn(job).wait().await });
        runtime.shutdown_timeout(SHUTDOWN_GRACE);

        let report = result?;
        debug!(updated = report.updated.len(), "update report");
        Ok(String::new())
    }

    fn handle_start_update(&self, args: &TargetArgs) -> Result<String, ApiError> {
        // Fail here rather than in the detached child, where nobody sees the error.
        self.config.location(&LocationKey::new(args.location.as_str()))?;

        let exe = std::env::current_exe()?;
        let child = Command::new(&exe)
            .args(self.update_command_args(args))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        info!(pid = child.id(), location = %args.location, "background update started");
        Ok(String::new())
    }

    /// Arguments for the detached `update` child.
    pub fn update_command_args(&self, args: &TargetArgs) -> Vec<OsString> {
        let mut argv: Vec<OsString> = Vec::new();
        if let Some(path) = &self.config_path {
            argv.push("--config".into());
            argv.push(path.clone().into_os_string());
        }
        argv.push("update".into());
        argv.push(args.location.clone().into());
        argv.push(args.instance.clone().into());
        argv.push(args.path.clone().into_os_string());
        argv
    }

    fn handle_set_state(
        &self,
        location: &str,
        instance: &str,
        operation: &str,
        value: &str,
    ) -> Result<String, ApiError> {
        let operation = OperationName::new(operation);
        self.registry.lookup(&operation)?;
        let store = self.store()?;
        store
            .set(
                &LocationKey::new(location),
                &InstanceKey::new(instance),
                &operation,
                value,
            )
            .map_err(|e| ApiError::state(&operation, e))?;
        Ok(String::new())
    }

    fn handle_get_state(
        &self,
        location: &str,
        instance: &str,
        operation: &str,
    ) -> Result<String, ApiError> {
        let operation = OperationName::new(operation);
        let store = self.store()?;
        let mut value = store
            .get(&LocationKey::new(location), &InstanceKey::new(instance), &operation)
            .map_err(|e| ApiError::state(&operation, e))?;
        value.push('\n');
        Ok(value)
    }

    /// Launch every post command detached. All are attempted; the first failure is returned.
    pub fn run_post_commands(&self) -> Result<(), ApiError> {
        let mut first_error = None;
        for command in &self.config.post_commands {
            let spawned = Command::new("sh")
                .arg("-c")
                .arg(command)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn();
            match spawned {
                Ok(child) => debug!(command = %command, pid = child.id(), "post command started"),
                Err(e) => {
                    warn!(command = %command, error = %e, "post command failed to start");
                    first_error.get_or_insert(ApiError::PostCommand {
                        command: command.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
