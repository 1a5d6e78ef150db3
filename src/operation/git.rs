//! Version-control status: current branch and short working-tree status.
//!
//! Probing runs in `update` only; `generate` decodes whatever was last persisted so
//! the interactive path never waits on `git`.

use crate::error::OperationError;
use crate::operation::{expect_no_params, Operation, OperationContext, OperationParams};
use crate::types::OperationName;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitState {
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub status: String,
}

pub struct Git;

impl Git {
    pub const NAME: &'static str = "git";

    pub fn from_params(params: &OperationParams) -> Result<Self, OperationError> {
        expect_no_params(params)?;
        Ok(Git)
    }

    fn probe(&self, ctx: &OperationContext<'_>) -> GitState {
        let commands = &ctx.capabilities.commands;
        let cwd = Some(ctx.location_path);

        let branch = match commands.run("git", &["rev-parse", "--abbrev-ref", "HEAD"], cwd) {
            Ok(out) => out.trim().to_string(),
            Err(e) => {
                // Outside a work tree this is the normal case.
                debug!(path = %ctx.location_path.display(), error = %e, "git branch probe failed");
                return GitState::default();
            }
        };

        let status = match commands.run("git", &["status", "-s"], cwd) {
            Ok(out) => out.trim_end().to_string(),
            Err(e) => {
                warn!(path = %ctx.location_path.display(), error = %e, "git status probe failed");
                String::new()
            }
        };

        GitState { branch, status }
    }
}

impl Operation for Git {
    fn name(&self) -> OperationName {
        OperationName::new(Self::NAME)
    }

    fn is_async(&self) -> bool {
        true
    }

    fn generate(&self, _ctx: &OperationContext<'_>, state: &str) -> Result<Value, OperationError> {
        let decoded = if state.is_empty() {
            GitState::default()
        } else {
            serde_json::from_str(state).unwrap_or_else(|e| {
                warn!(error = %e, "discarding unreadable git state");
                GitState::default()
            })
        };

        Ok(json!({
            "branch": decoded.branch,
            "dirty": !decoded.status.is_empty(),
            "status": decoded.status,
        }))
    }

    fn update(&self, ctx: &OperationContext<'_>, _state: &str) -> Result<String, OperationError> {
        let next = self.probe(ctx);
        serde_json::to_string(&next).map_err(|e| OperationError::Failed(e.to_string()))
    }
}
