//! Background update runner.
//!
//! Runs an update pass as a detached tokio task so the caller can return immediately.
//! The pass itself is synchronous and runs on the blocking pool. A timeout bounds the
//! whole pass: when it expires the cancellation flag is raised, no further binding
//! starts, and the handle reports [`ApiError::Timeout`]. A probe already running when
//! the timeout fires is bounded by the command runner's own timeout.

use crate::capability::Capabilities;
use crate::error::ApiError;
use crate::location::{Location, Target};
use crate::registry::OperationRegistry;
use crate::store::StateStore;
use crate::update::{CancellationFlag, UpdateEngine, UpdateReport};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::warn;

/// Everything one update pass needs, owned so it can move onto another thread.
#[derive(Clone)]
pub struct UpdateJob {
    pub registry: Arc<OperationRegistry>,
    pub store: Arc<dyn StateStore>,
    pub location: Location,
    pub target: Target,
    pub capabilities: Capabilities,
}

impl UpdateJob {
    /// Run the pass on the current thread.
    pub fn run(&self, cancel: &CancellationFlag) -> Result<UpdateReport, ApiError> {
        UpdateEngine::new(&self.registry).update_with_cancel(
            self.store.as_ref(),
            &self.location,
            &self.target,
            &self.capabilities,
            cancel,
        )
    }
}

/// Spawns update passes with a timeout.
pub struct UpdateRunner {
    timeout: Option<Duration>,
}

impl Default for UpdateRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateRunner {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new() -> Self {
        Self {
            timeout: Some(Self::DEFAULT_TIMEOUT),
        }
    }

    /// `None` disables the timeout.
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    /// Start the pass. Must be called from within a tokio runtime.
    pub fn spawn(&self, job: UpdateJob) -> UpdateHandle {
        let cancel = CancellationFlag::new();
        let flag = cancel.clone();
        let timeout = self.timeout;

        let task = tokio::spawn(async move {
            let worker_flag = flag.clone();
            let target = job.target.clone();
            let blocking = tokio::task::spawn_blocking(move || job.run(&worker_flag));

            let joined = match timeout {
                Some(limit) => match tokio::time::timeout(limit, blocking).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        flag.cancel();
                        warn!(
                            location = %target.location_key,
                            instance = %target.instance_key,
                            timeout_ms = limit.as_millis() as u64,
                            "update timed out"
                        );
                        return Err(ApiError::Timeout(limit));
                    }
                },
                None => blocking.await,
            };
            match joined {
                Ok(result) => result,
                Err(e) => Err(ApiError::Task(e.to_string())),
            }
        });

        UpdateHandle { cancel, task }
    }
}

/// Handle to a spawned update pass.
pub struct UpdateHandle {
    cancel: CancellationFlag,
    task: JoinHandle<Result<UpdateReport, ApiError>>,
}

impl UpdateHandle {
    /// Stop before the next binding. A binding already running finishes first.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub async fn wait(self) -> Result<UpdateReport, ApiError> {
        self.task
            .await
            .map_err(|e| ApiError::Task(e.to_string()))?
    }

    /// Let the pass run to completion without observing its result.
    pub fn detach(self) {
        drop(self.task);
    }
}
