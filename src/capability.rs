//! Injected capabilities
//!
//! Operations never spawn processes or read the environment directly. They receive a
//! [`Capabilities`] bundle holding a [`CommandRunner`] and an [`EnvReader`], so the
//! binary can hand them the real system and tests can hand them fakes.

use crate::error::ProbeError;
use std::path::Path;
use std::process::{Output, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Runs an external command synchronously and captures its stdout.
pub trait CommandRunner: Send + Sync {
    fn run(&self, program: &str, args: &[&str], cwd: Option<&Path>) -> Result<String, ProbeError>;
}

/// Reads environment variables and host identity.
pub trait EnvReader: Send + Sync {
    fn var(&self, name: &str) -> Option<String>;

    /// Name of this machine, looked up without spawning a process.
    fn hostname(&self) -> Option<String> {
        None
    }

    /// Set and non-empty.
    fn is_set(&self, name: &str) -> bool {
        self.var(name).map(|v| !v.is_empty()).unwrap_or(false)
    }
}

/// Capability bundle handed to every operation call.
#[derive(Clone)]
pub struct Capabilities {
    pub commands: Arc<dyn CommandRunner>,
    pub env: Arc<dyn EnvReader>,
}

impl Capabilities {
    pub fn new(commands: Arc<dyn CommandRunner>, env: Arc<dyn EnvReader>) -> Self {
        Self { commands, env }
    }

    /// Real process spawning and the real process environment.
    pub fn system(probe_timeout: Duration) -> Self {
        Self::new(
            Arc::new(SystemCommandRunner::new(probe_timeout)),
            Arc::new(ProcessEnv),
        )
    }
}

/// Process runner backed by `tokio::process`. Waiting for the child and reading its
/// output share one deadline; on expiry the child is killed and anything still holding
/// its pipes is abandoned.
///
/// Runs the child on a private current-thread runtime, so it must be called from
/// synchronous code (the engines run on the blocking pool).
pub struct SystemCommandRunner {
    timeout: Duration,
}

impl SystemCommandRunner {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn run_bounded(
        &self,
        program: &str,
        args: &[&str],
        cwd: Option<&Path>,
    ) -> Result<Output, ProbeError> {
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        let child = command.spawn().map_err(|e| spawn_error(program, e))?;
        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output.map_err(|e| spawn_error(program, e)),
            Err(_) => Err(ProbeError::TimedOut {
                program: program.to_string(),
                timeout: self.timeout,
            }),
        }
    }
}

impl Default for SystemCommandRunner {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TIMEOUT)
    }
}

impl CommandRunner for SystemCommandRunner {
    fn run(&self, program: &str, args: &[&str], cwd: Option<&Path>) -> Result<String, ProbeError> {
        debug!(program, ?args, "running probe");
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| spawn_error(program, e))?;
        let output = runtime.block_on(self.run_bounded(program, args, cwd));
        // Do not wait on orphaned readers when the runtime goes away.
        runtime.shutdown_background();
        let output = output?;

        if !output.status.success() {
            return Err(ProbeError::Failed {
                program: program.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn spawn_error(program: &str, e: std::io::Error) -> ProbeError {
    ProbeError::Spawn {
        program: program.to_string(),
        message: e.to_string(),
    }
}

/// The current process environment.
pub struct ProcessEnv;

impl EnvReader for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn hostname(&self) -> Option<String> {
        match whoami::fallible::hostname() {
            Ok(name) => Some(name),
            Err(e) => {
                debug!(error = %e, "hostname lookup failed");
                None
            }
        }
    }
}

/// Scripted capabilities for tests.
pub mod fake {
    use super::{CommandRunner, EnvReader};
    use crate::error::ProbeError;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::path::Path;

    /// Answers commands from a table keyed by the full command line.
    /// Unknown commands fail as if the program were not installed.
    #[derive(Default)]
    pub struct FakeCommandRunner {
        responses: HashMap<String, Result<String, ProbeError>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeCommandRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(mut self, command_line: &str, stdout: &str) -> Self {
            self.responses
                .insert(command_line.to_string(), Ok(stdout.to_string()));
            self
        }

        pub fn fail(mut self, command_line: &str, error: ProbeError) -> Self {
            self.responses.insert(command_line.to_string(), Err(error));
            self
        }

        /// Command lines seen so far, in call order.
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    impl CommandRunner for FakeCommandRunner {
        fn run(&self, program: &str, args: &[&str], _cwd: Option<&Path>) -> Result<String, ProbeError> {
            let mut line = program.to_string();
            for arg in args {
                line.push(' ');
                line.push_str(arg);
            }
            self.calls.lock().push(line.clone());
            match self.responses.get(&line) {
                Some(response) => response.clone(),
                None => Err(ProbeError::Spawn {
                    program: program.to_string(),
                    message: "not found".to_string(),
                }),
            }
        }
    }

    #[derive(Default)]
    pub struct FakeEnv {
        vars: HashMap<String, String>,
        hostname: Option<String>,
    }

    impl FakeEnv {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(mut self, name: &str, value: &str) -> Self {
            self.vars.insert(name.to_string(), value.to_string());
            self
        }

        pub fn with_hostname(mut self, hostname: &str) -> Self {
            self.hostname = Some(hostname.to_string());
            self
        }
    }

    impl EnvReader for FakeEnv {
        fn var(&self, name: &str) -> Option<String> {
            self.vars.get(name).cloned()
        }

        fn hostname(&self) -> Option<String> {
            self.hostname.clone()
        }
    }
}
