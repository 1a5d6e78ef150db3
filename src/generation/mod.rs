//! Generation engine: renders a location's template from current operation state.
//!
//! Bindings are processed strictly in configured order. Each operation reads whatever
//! state is currently persisted, which may be stale relative to an update still in
//! flight; that is accepted. The first failure aborts the pass and nothing is rendered.

use crate::capability::Capabilities;
use crate::error::{ApiError, Stage};
use crate::location::{Location, Target};
use crate::operation::OperationContext;
use crate::registry::OperationRegistry;
use crate::store::StateStore;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Runs generate for every binding and renders the template.
pub struct GenerationEngine<'r> {
    registry: &'r OperationRegistry,
}

impl<'r> GenerationEngine<'r> {
    pub fn new(registry: &'r OperationRegistry) -> Self {
        Self { registry }
    }

    /// Build the template namespace: one entry per bound operation, keyed by name.
    pub fn namespace(
        &self,
        store: &dyn StateStore,
        location: &Location,
        target: &Target,
        capabilities: &Capabilities,
    ) -> Result<Map<String, Value>, ApiError> {
        let ctx = OperationContext {
            location_key: &target.location_key,
            instance_key: &target.instance_key,
            location_path: &target.location_path,
            capabilities,
        };

        let mut namespace = Map::new();
        for binding in &location.bindings {
            let operation = self.registry.construct(binding, Stage::Generate)?;
            let name = operation.name();
            let state = store
                .get(&target.location_key, &target.instance_key, &name)
                .map_err(|e| ApiError::state(&name, e))?;
            let value = operation
                .generate(&ctx, &state)
                .map_err(|e| ApiError::operation(&name, Stage::Generate, e))?;
            debug!(operation = %name, "generated");
            if namespace.insert(name.to_string(), value).is_some() {
                warn!(operation = %name, "operation bound twice; later result wins");
            }
        }
        Ok(namespace)
    }

    /// Generate the content for one instance of a location.
    pub fn generate(
        &self,
        store: &dyn StateStore,
        location: &Location,
        target: &Target,
        capabilities: &Capabilities,
    ) -> Result<String, ApiError> {
        let namespace = self.namespace(store, location, target, capabilities)?;
        let template = location.parse_template()?;
        let content = template.render(&Value::Object(namespace))?;
        debug!(
            location = %target.location_key,
            instance = %target.instance_key,
            bytes = content.len(),
            "content generated"
        );
        Ok(content)
    }
}
