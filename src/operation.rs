//! Operations
//!
//! An operation is a pluggable unit that contributes one entry to the template
//! namespace. `generate` is the read-only presentation step run on the interactive
//! path; `update` is the possibly slow refresh step whose result is persisted.
//!
//! Operations own the format of their state string. They hold nothing between calls
//! apart from the parameters they were constructed with.

use crate::capability::Capabilities;
use crate::error::OperationError;
use crate::types::{InstanceKey, LocationKey, OperationName};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;

pub mod git;
pub mod host;
pub mod passthrough;
pub mod tmux;
pub mod working_directory;

pub use git::Git;
pub use host::HostDetails;
pub use passthrough::{ExitCode, GCloudProject, PythonVirtualEnv, VimMode};
pub use tmux::{InTmux, TmuxActivePane, TmuxCurrentPane};
pub use working_directory::WorkingDirectory;

/// Binding parameters as written in config, minus the `type` discriminator.
pub type OperationParams = serde_json::Map<String, Value>;

/// Everything an operation may look at besides its own state.
pub struct OperationContext<'a> {
    pub location_key: &'a LocationKey,
    pub instance_key: &'a InstanceKey,
    pub location_path: &'a Path,
    pub capabilities: &'a Capabilities,
}

/// Pluggable unit of content generation.
pub trait Operation: Send {
    /// Namespace key and state-key component.
    fn name(&self) -> OperationName;

    /// Hint that `update` is slow and should run off the interactive path.
    fn is_async(&self) -> bool;

    /// Produce the value bound under `name()` in the template namespace.
    /// Must not persist anything.
    fn generate(&self, ctx: &OperationContext<'_>, state: &str) -> Result<Value, OperationError>;

    /// Produce the next state to persist. Nothing is committed on error, so this
    /// must be safe to re-run from the last committed state.
    fn update(&self, ctx: &OperationContext<'_>, state: &str) -> Result<String, OperationError>;
}

/// Deserialize typed parameters, rejecting unknown fields the target type declares.
pub fn parse_params<T: DeserializeOwned>(params: &OperationParams) -> Result<T, OperationError> {
    serde_json::from_value(Value::Object(params.clone()))
        .map_err(|e| OperationError::InvalidParams(e.to_string()))
}

/// Reject any parameters for operations that take none.
pub fn expect_no_params(params: &OperationParams) -> Result<(), OperationError> {
    match params.keys().next() {
        None => Ok(()),
        Some(key) => Err(OperationError::InvalidParams(format!(
            "unexpected parameter `{}`",
            key
        ))),
    }
}
