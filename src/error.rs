//! Error types for the paneline generation pipeline.

use crate::types::{LocationKey, OperationName};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Pipeline stage an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Generate,
    Update,
    State,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Generate => f.write_str("generate"),
            Stage::Update => f.write_str("update"),
            Stage::State => f.write_str("state"),
        }
    }
}

/// State store errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to open state store at {path}: {message}")]
    Open { path: String, message: String },

    #[error("State store backend error: {0}")]
    Backend(String),

    #[error("Corrupt state record {key}: {message}")]
    Corrupt { key: String, message: String },

    #[error("State store is closed")]
    Closed,
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

/// Failure of an external probe (command or environment lookup)
#[derive(Debug, Clone, Error)]
pub enum ProbeError {
    #[error("`{program}` could not be started: {message}")]
    Spawn { program: String, message: String },

    #[error("`{program}` exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("`{program}` timed out after {timeout:?}")]
    TimedOut { program: String, timeout: Duration },
}

/// Errors raised by an individual operation
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("Probe failed: {0}")]
    Probe(#[from] ProbeError),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("operation is not registered")]
    Unregistered,

    #[error("{0}")]
    Failed(String),
}

/// Template parse and render errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unclosed action starting at byte {0}")]
    Unclosed(usize),

    #[error("malformed action `{0}`")]
    Malformed(String),

    #[error("unexpected `{{{{ {0} }}}}` without a matching `{{{{ if }}}}`")]
    UnexpectedEnd(String),

    #[error("`{{{{ if {0} }}}}` is never closed with `{{{{ end }}}}`")]
    UnterminatedBlock(String),

    #[error("unresolved field `{0}`")]
    UnresolvedField(String),
}

/// Top-level error type
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown operation: {0}")]
    UnknownOperation(OperationName),

    #[error("Malformed binding #{index} in location '{location}': {message}")]
    MalformedBinding {
        location: LocationKey,
        index: usize,
        message: String,
    },

    #[error("Location not configured: {0}")]
    LocationNotFound(LocationKey),

    #[error("{stage} failed for operation '{operation}': {source}")]
    Operation {
        operation: OperationName,
        stage: Stage,
        #[source]
        source: OperationError,
    },

    #[error("state access failed for operation '{operation}': {source}")]
    State {
        operation: OperationName,
        #[source]
        source: StorageError,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Update timed out after {0:?}")]
    Timeout(Duration),

    #[error("Update cancelled")]
    Cancelled,

    #[error("Update task failed: {0}")]
    Task(String),

    #[error("Post command `{command}` failed: {message}")]
    PostCommand { command: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub(crate) fn operation(operation: &OperationName, stage: Stage, source: OperationError) -> Self {
        ApiError::Operation {
            operation: operation.clone(),
            stage,
            source,
        }
    }

    pub(crate) fn state(operation: &OperationName, source: StorageError) -> Self {
        ApiError::State {
            operation: operation.clone(),
            source,
        }
    }

    /// Stage annotation, when the error came out of a pipeline pass.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ApiError::Operation { stage, .. } => Some(*stage),
            ApiError::State { .. } => Some(Stage::State),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::Config(err.to_string())
    }
}
