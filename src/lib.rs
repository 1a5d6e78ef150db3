//! paneline: template-driven status segments
//!
//! Renders short text segments (tmux panes, status lines, prompts) by running an
//! ordered set of pluggable operations against one location instance and
//! substituting their results into a template. Slow probes run in a separate update
//! pass whose results are persisted in a state store and read back at render time.

pub mod capability;
pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod location;
pub mod logging;
pub mod operation;
pub mod registry;
pub mod store;
pub mod template;
pub mod types;
pub mod update;

pub use capability::{Capabilities, CommandRunner, EnvReader};
pub use error::{ApiError, OperationError, Stage, StorageError, TemplateError};
pub use generation::GenerationEngine;
pub use location::{Location, Target};
pub use operation::{Operation, OperationContext, OperationParams};
pub use registry::{Binding, OperationRegistry};
pub use store::{MemoryStateStore, SledStateStore, StateStore};
pub use types::{InstanceKey, LocationKey, OperationName};
pub use update::{CancellationFlag, UpdateEngine, UpdateReport};
