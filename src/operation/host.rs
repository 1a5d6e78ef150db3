//! Host identity: hostname and whether the session arrived over SSH.

use crate::error::OperationError;
use crate::operation::{expect_no_params, Operation, OperationContext, OperationParams};
use crate::types::OperationName;
use serde_json::{json, Value};
use tracing::debug;

pub struct HostDetails;

impl HostDetails {
    pub const NAME: &'static str = "host_details";

    pub fn from_params(params: &OperationParams) -> Result<Self, OperationError> {
        expect_no_params(params)?;
        Ok(HostDetails)
    }

    fn hostname(ctx: &OperationContext<'_>) -> String {
        let env = &ctx.capabilities.env;
        match env.hostname() {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => {
                debug!("hostname lookup empty, falling back to $HOSTNAME");
                env.var("HOSTNAME").unwrap_or_default()
            }
        }
    }
}

impl Operation for HostDetails {
    fn name(&self) -> OperationName {
        OperationName::new(Self::NAME)
    }

    fn is_async(&self) -> bool {
        false
    }

    fn generate(&self, ctx: &OperationContext<'_>, _state: &str) -> Result<Value, OperationError> {
        let env = &ctx.capabilities.env;
        let is_ssh = env.is_set("SSH_CONNECTION") || env.is_set("SSH_TTY");
        Ok(json!({
            "hostname": Self::hostname(ctx),
            "is_ssh": is_ssh,
        }))
    }

    fn update(&self, _ctx: &OperationContext<'_>, state: &str) -> Result<String, OperationError> {
        Ok(state.to_string())
    }
}
