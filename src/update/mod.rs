//! Update engine: refreshes and persists operation state for one instance.
//!
//! For each binding in order the current state is read, passed to the operation's
//! `update`, and the result written back unconditionally. The first failure stops the
//! pass; writes already made for earlier bindings stay committed.

pub mod runner;

pub use runner::{UpdateHandle, UpdateJob, UpdateRunner};

use crate::capability::Capabilities;
use crate::error::{ApiError, Stage};
use crate::location::{Location, Target};
use crate::operation::OperationContext;
use crate::registry::OperationRegistry;
use crate::store::StateStore;
use crate::types::OperationName;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Shared flag checked between bindings; once raised no further binding starts.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of a completed update pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Operations whose state was written, in order.
    pub updated: Vec<OperationName>,
}

/// Runs update for every binding of a location.
pub struct UpdateEngine<'r> {
    registry: &'r OperationRegistry,
}

impl<'r> UpdateEngine<'r> {
    pub fn new(registry: &'r OperationRegistry) -> Self {
        Self { registry }
    }

    pub fn update(
        &self,
        store: &dyn StateStore,
        location: &Location,
        target: &Target,
        capabilities: &Capabilities,
    ) -> Result<UpdateReport, ApiError> {
        self.update_with_cancel(store, location, target, capabilities, &CancellationFlag::new())
    }

    pub fn update_with_cancel(
        &self,
        store: &dyn StateStore,
        location: &Location,
        target: &Target,
        capabilities: &Capabilities,
        cancel: &CancellationFlag,
    ) -> Result<UpdateReport, ApiError> {
        let ctx = OperationContext {
            location_key: &target.location_key,
            instance_key: &target.instance_key,
            location_path: &target.location_path,
            capabilities,
        };

        let mut report = UpdateReport::default();
        for binding in &location.bindings {
            if cancel.is_cancelled() {
                info!(
                    location = %target.location_key,
                    instance = %target.instance_key,
                    completed = report.updated.len(),
                    "update cancelled"
                );
                return Err(ApiError::Cancelled);
            }

            let operation = self.registry.construct(binding, Stage::Update)?;
            let name = operation.name();
            let state = store
                .get(&target.location_key, &target.instance_key, &name)
                .map_err(|e| ApiError::state(&name, e))?;
            let next = operation
                .update(&ctx, &state)
                .map_err(|e| ApiError::operation(&name, Stage::Update, e))?;
            store
                .set(&target.location_key, &target.instance_key, &name, &next)
                .map_err(|e| ApiError::state(&name, e))?;
            debug!(operation = %name, "state updated");
            report.updated.push(name);
        }

        info!(
            location = %target.location_key,
            instance = %target.instance_key,
            updated = report.updated.len(),
            "update complete"
        );
        Ok(report)
    }
}
