//! Multiplexer session awareness.
//!
//! Instance keys for panes are expected as `<session>.<pane_id>`, e.g. `$1.%3`, which
//! is what `#{session_id}.#{pane_id}` expands to in a tmux format string.

use crate::error::OperationError;
use crate::operation::{expect_no_params, Operation, OperationContext, OperationParams};
use crate::types::{InstanceKey, OperationName};
use serde_json::Value;
use tracing::debug;

const TMUX_ENV: &str = "TMUX";
const ACTIVE_PANE_FORMAT: &str = "#{pane_id}";

/// Pane id part of an instance key: the second `.`-separated segment.
pub fn pane_id(instance_key: &InstanceKey) -> Option<&str> {
    instance_key
        .as_str()
        .split('.')
        .nth(1)
        .filter(|pane| !pane.is_empty())
}

macro_rules! stateless_operation {
    ($ty:ident, $name:literal) => {
        impl $ty {
            pub const NAME: &'static str = $name;

            pub fn from_params(params: &OperationParams) -> Result<Self, OperationError> {
                expect_no_params(params)?;
                Ok($ty)
            }
        }
    };
}

/// Whether the instance runs inside a tmux session.
pub struct InTmux;
stateless_operation!(InTmux, "in_tmux");

impl Operation for InTmux {
    fn name(&self) -> OperationName {
        OperationName::new(Self::NAME)
    }

    fn is_async(&self) -> bool {
        false
    }

    fn generate(&self, ctx: &OperationContext<'_>, _state: &str) -> Result<Value, OperationError> {
        Ok(Value::Bool(ctx.capabilities.env.is_set(TMUX_ENV)))
    }

    fn update(&self, _ctx: &OperationContext<'_>, state: &str) -> Result<String, OperationError> {
        Ok(state.to_string())
    }
}

/// Pane id of this instance, empty outside tmux.
pub struct TmuxCurrentPane;
stateless_operation!(TmuxCurrentPane, "tmux_current_pane");

impl Operation for TmuxCurrentPane {
    fn name(&self) -> OperationName {
        OperationName::new(Self::NAME)
    }

    fn is_async(&self) -> bool {
        false
    }

    fn generate(&self, ctx: &OperationContext<'_>, _state: &str) -> Result<Value, OperationError> {
        if !ctx.capabilities.env.is_set(TMUX_ENV) {
            return Ok(Value::String(String::new()));
        }
        let pane = pane_id(ctx.instance_key).unwrap_or_default();
        Ok(Value::String(pane.to_string()))
    }

    fn update(&self, _ctx: &OperationContext<'_>, state: &str) -> Result<String, OperationError> {
        Ok(state.to_string())
    }
}

/// Whether this instance's pane is the one tmux currently has focused.
pub struct TmuxActivePane;
stateless_operation!(TmuxActivePane, "tmux_active_pane");

impl Operation for TmuxActivePane {
    fn name(&self) -> OperationName {
        OperationName::new(Self::NAME)
    }

    fn is_async(&self) -> bool {
        false
    }

    fn generate(&self, ctx: &OperationContext<'_>, _state: &str) -> Result<Value, OperationError> {
        if !ctx.capabilities.env.is_set(TMUX_ENV) {
            return Ok(Value::Bool(false));
        }
        let Some(pane) = pane_id(ctx.instance_key) else {
            debug!(instance = %ctx.instance_key, "instance key carries no pane id");
            return Ok(Value::Bool(false));
        };

        let active = match ctx.capabilities.commands.run(
            "tmux",
            &["display", "-p", ACTIVE_PANE_FORMAT],
            Some(ctx.location_path),
        ) {
            Ok(out) => out.trim() == pane,
            Err(e) => {
                debug!(error = %e, "tmux active pane probe failed");
                false
            }
        };
        Ok(Value::Bool(active))
    }

    fn update(&self, _ctx: &OperationContext<'_>, state: &str) -> Result<String, OperationError> {
        Ok(state.to_string())
    }
}
