//! Working directory display with the home directory abbreviated.

use crate::error::OperationError;
use crate::operation::{parse_params, Operation, OperationContext, OperationParams};
use crate::types::OperationName;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct WorkingDirectoryParams {
    #[serde(default = "default_home_alias")]
    home_alias: String,
}

fn default_home_alias() -> String {
    "~".to_string()
}

pub struct WorkingDirectory {
    home_alias: String,
}

impl WorkingDirectory {
    pub const NAME: &'static str = "working_directory";

    pub fn new(home_alias: impl Into<String>) -> Self {
        Self {
            home_alias: home_alias.into(),
        }
    }

    pub fn from_params(params: &OperationParams) -> Result<Self, OperationError> {
        let params: WorkingDirectoryParams = parse_params(params)?;
        Ok(Self::new(params.home_alias))
    }

    /// Replace a leading `home` with the alias. Matching is per path component, so
    /// `/home/al` does not abbreviate `/home/alice`.
    pub fn abbreviate(&self, path: &Path, home: Option<&str>) -> String {
        let Some(home) = home.filter(|h| !h.is_empty()) else {
            return path.display().to_string();
        };
        match path.strip_prefix(home) {
            Ok(rest) if rest.as_os_str().is_empty() => self.home_alias.clone(),
            Ok(rest) => format!("{}/{}", self.home_alias, rest.display()),
            Err(_) => path.display().to_string(),
        }
    }
}

impl Default for WorkingDirectory {
    fn default() -> Self {
        Self::new(default_home_alias())
    }
}

impl Operation for WorkingDirectory {
    fn name(&self) -> OperationName {
        OperationName::new(Self::NAME)
    }

    fn is_async(&self) -> bool {
        false
    }

    fn generate(&self, ctx: &OperationContext<'_>, _state: &str) -> Result<Value, OperationError> {
        let home = ctx.capabilities.env.var("HOME");
        Ok(Value::String(self.abbreviate(ctx.location_path, home.as_deref())))
    }

    fn update(&self, _ctx: &OperationContext<'_>, state: &str) -> Result<String, OperationError> {
        Ok(state.to_string())
    }
}
