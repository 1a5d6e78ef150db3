//! Configuration System
//!
//! Layered configuration: built-in defaults, the global config file (or an explicit
//! `--config` file in its place), then `PANELINE__*` environment overrides. The raw
//! [`AppConfig`] is validated once against the operation registry into a
//! [`ValidatedConfig`] whose locations hold typed bindings and parsed templates.

use crate::error::ApiError;
use crate::location::Location;
use crate::logging::LoggingConfig;
use crate::operation::OperationParams;
use crate::registry::{BindingError, OperationRegistry};
use crate::store::StateConfig;
use crate::types::{LocationKey, OperationName};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

mod facade;
mod merge;
pub mod paths;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Shell commands run after `update` and `set-state`
    #[serde(default)]
    pub post_commands: Vec<String>,

    #[serde(default)]
    pub state: StateConfig,

    #[serde(default)]
    pub update: UpdateConfig,

    #[serde(default)]
    pub probe: ProbeConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Raw locations keyed by location key
    #[serde(default)]
    pub locations: HashMap<String, LocationConfig>,
}

/// Raw location as written in the config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationConfig {
    #[serde(default)]
    pub template: String,

    /// Each entry names its operation under `type`; the other keys are parameters.
    #[serde(default)]
    pub operations: Vec<OperationParams>,
}

/// Background update settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// Whole-pass timeout; 0 disables it
    #[serde(default = "default_update_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_update_timeout_ms() -> u64 {
    30_000
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_update_timeout_ms(),
        }
    }
}

impl UpdateConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

/// External probe settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default = "default_probe_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_probe_timeout_ms() -> u64 {
    5_000
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_probe_timeout_ms(),
        }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl LocationConfig {
    /// Resolve every raw binding against the registry and parse the template.
    pub fn validate(
        &self,
        key: &LocationKey,
        registry: &OperationRegistry,
    ) -> Result<Location, ApiError> {
        let mut bindings = Vec::with_capacity(self.operations.len());
        for (index, raw) in self.operations.iter().enumerate() {
            let malformed = |message: String| ApiError::MalformedBinding {
                location: key.clone(),
                index,
                message,
            };

            let mut params = raw.clone();
            let name = match params.remove("type") {
                Some(Value::String(name)) if !name.is_empty() => OperationName::new(name),
                Some(other) => {
                    return Err(malformed(format!(
                        "`type` must be a non-empty string, got {}",
                        other
                    )))
                }
                None => return Err(malformed("missing `type`".to_string())),
            };

            let binding = registry.validate(&name, params).map_err(|e| match e {
                BindingError::Unknown(name) => ApiError::UnknownOperation(name),
                BindingError::Rejected(err) => malformed(err.to_string()),
            })?;
            bindings.push(binding);
        }

        let location = Location::new(bindings, self.template.clone());
        let template = location.parse_template()?;
        for field in template.fields() {
            if let Some(root) = field.root() {
                if !location.operation_names().any(|name| name.as_str() == root) {
                    warn!(
                        location = %key,
                        field = %field,
                        "template references an operation the location does not bind"
                    );
                }
            }
        }
        Ok(location)
    }
}

impl AppConfig {
    /// Validate the entire configuration. Any invalid location rejects the whole config.
    pub fn validate(&self, registry: &OperationRegistry) -> Result<ValidatedConfig, ApiError> {
        let mut keys: Vec<&String> = self.locations.keys().collect();
        keys.sort();

        let mut locations = BTreeMap::new();
        for key in keys {
            let location_key = LocationKey::new(key.as_str());
            let location = self.locations[key].validate(&location_key, registry)?;
            locations.insert(location_key, location);
        }

        let mut state = self.state.clone();
        state.path = state.path.as_deref().map(paths::expand_home);

        Ok(ValidatedConfig {
            locations,
            post_commands: self.post_commands.clone(),
            state,
            update: self.update.clone(),
            probe: self.probe.clone(),
            logging: self.logging.clone(),
        })
    }
}

/// Configuration after validation against a registry
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub locations: BTreeMap<LocationKey, Location>,
    pub post_commands: Vec<String>,
    pub state: StateConfig,
    pub update: UpdateConfig,
    pub probe: ProbeConfig,
    pub logging: LoggingConfig,
}

impl ValidatedConfig {
    pub fn location(&self, key: &LocationKey) -> Result<&Location, ApiError> {
        self.locations
            .get(key)
            .ok_or_else(|| ApiError::LocationNotFound(key.clone()))
    }

    /// Configured state database path (`~` already expanded), or the default.
    pub fn state_path(&self) -> PathBuf {
        self.state
            .path
            .clone()
            .unwrap_or_else(paths::default_state_path)
    }
}
