//! Operations whose state is written from outside (shell hooks, editor plugins via
//! `paneline set-state`) and shown verbatim.

use crate::error::OperationError;
use crate::operation::{expect_no_params, Operation, OperationContext, OperationParams};
use crate::types::OperationName;
use serde_json::Value;
use tracing::debug;

macro_rules! passthrough_operation {
    ($(#[$meta:meta])* $ty:ident, $name:literal) => {
        $(#[$meta])*
        pub struct $ty;

        impl $ty {
            pub const NAME: &'static str = $name;

            pub fn from_params(params: &OperationParams) -> Result<Self, OperationError> {
                expect_no_params(params)?;
                Ok($ty)
            }
        }

        impl Operation for $ty {
            fn name(&self) -> OperationName {
                OperationName::new(Self::NAME)
            }

            fn is_async(&self) -> bool {
                false
            }

            fn generate(&self, _ctx: &OperationContext<'_>, state: &str) -> Result<Value, OperationError> {
                Ok(Value::String(state.to_string()))
            }

            // Keep whatever set-state wrote; an update pass must not erase it.
            fn update(&self, _ctx: &OperationContext<'_>, state: &str) -> Result<String, OperationError> {
                Ok(state.to_string())
            }
        }
    };
}

passthrough_operation!(
    /// Active Python virtual environment name.
    PythonVirtualEnv,
    "venv"
);

passthrough_operation!(
    /// Editor mode, e.g. `NORMAL` or `INSERT`.
    VimMode,
    "vim"
);

passthrough_operation!(
    /// Exit code of the last shell command.
    ExitCode,
    "exit_code"
);

/// Active Google Cloud project.
pub struct GCloudProject;

impl GCloudProject {
    pub const NAME: &'static str = "gcloud";

    pub fn from_params(params: &OperationParams) -> Result<Self, OperationError> {
        expect_no_params(params)?;
        Ok(GCloudProject)
    }
}

impl Operation for GCloudProject {
    fn name(&self) -> OperationName {
        OperationName::new(Self::NAME)
    }

    fn is_async(&self) -> bool {
        true
    }

    fn generate(&self, _ctx: &OperationContext<'_>, state: &str) -> Result<Value, OperationError> {
        Ok(Value::String(state.to_string()))
    }

    fn update(&self, ctx: &OperationContext<'_>, _state: &str) -> Result<String, OperationError> {
        match ctx.capabilities.commands.run(
            "gcloud",
            &["config", "get-value", "project"],
            Some(ctx.location_path),
        ) {
            Ok(out) => Ok(out.trim().to_string()),
            Err(e) => {
                debug!(error = %e, "gcloud project probe failed");
                Ok(String::new())
            }
        }
    }
}
