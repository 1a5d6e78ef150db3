//! Operation registry: maps operation names to constructors.
//!
//! The registry is an explicit value built at startup and passed by reference to config
//! validation and both engines. Constructors are invoked once per use so no operation
//! instance outlives a single generate or update call.

use crate::error::{ApiError, OperationError, Stage};
use crate::operation::{
    ExitCode, GCloudProject, Git, HostDetails, InTmux, Operation, OperationParams,
    PythonVirtualEnv, TmuxActivePane, TmuxCurrentPane, VimMode, WorkingDirectory,
};
use crate::types::OperationName;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Builds a fresh operation from validated binding parameters.
pub type OperationConstructor =
    Arc<dyn Fn(&OperationParams) -> Result<Box<dyn Operation>, OperationError> + Send + Sync>;

/// A validated, ordered entry of a location: which operation and with what parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: OperationName,
    pub params: OperationParams,
}

impl Binding {
    pub fn new(name: impl Into<OperationName>) -> Self {
        Self {
            name: name.into(),
            params: OperationParams::new(),
        }
    }

    pub fn with_params(name: impl Into<OperationName>, params: OperationParams) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }
}

/// Summary row for listing registered operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationInfo {
    pub name: OperationName,
    /// `None` when the operation cannot be built without parameters.
    pub is_async: Option<bool>,
}

/// Operation registry
#[derive(Clone, Default)]
pub struct OperationRegistry {
    constructors: BTreeMap<OperationName, OperationConstructor>,
}

impl OperationRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in operation
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_builtin(Git::NAME, Git::from_params);
        registry.register_builtin(PythonVirtualEnv::NAME, PythonVirtualEnv::from_params);
        registry.register_builtin(VimMode::NAME, VimMode::from_params);
        registry.register_builtin(GCloudProject::NAME, GCloudProject::from_params);
        registry.register_builtin(ExitCode::NAME, ExitCode::from_params);
        registry.register_builtin(WorkingDirectory::NAME, WorkingDirectory::from_params);
        registry.register_builtin(TmuxActivePane::NAME, TmuxActivePane::from_params);
        registry.register_builtin(TmuxCurrentPane::NAME, TmuxCurrentPane::from_params);
        registry.register_builtin(InTmux::NAME, InTmux::from_params);
        registry.register_builtin(HostDetails::NAME, HostDetails::from_params);
        registry
    }

    fn register_builtin<T, F>(&mut self, name: &str, from_params: F)
    where
        T: Operation + 'static,
        F: Fn(&OperationParams) -> Result<T, OperationError> + Send + Sync + 'static,
    {
        self.register(
            name,
            Arc::new(move |params: &OperationParams| {
                from_params(params).map(|op| Box::new(op) as Box<dyn Operation>)
            }),
        );
    }

    /// Register a constructor, replacing any previous one under the same name
    pub fn register(&mut self, name: impl Into<OperationName>, constructor: OperationConstructor) {
        self.constructors.insert(name.into(), constructor);
    }

    /// Register an operation that takes no parameters
    pub fn register_simple<T, F>(&mut self, name: impl Into<OperationName>, make: F)
    where
        T: Operation + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let name = name.into();
        let label = name.clone();
        self.register(
            name,
            Arc::new(move |params: &OperationParams| {
                if let Some(key) = params.keys().next() {
                    return Err(OperationError::InvalidParams(format!(
                        "operation '{}' takes no parameters, got `{}`",
                        label, key
                    )));
                }
                Ok(Box::new(make()) as Box<dyn Operation>)
            }),
        );
    }

    /// Look up a constructor by name
    pub fn lookup(&self, name: &OperationName) -> Result<&OperationConstructor, ApiError> {
        self.constructors
            .get(name)
            .ok_or_else(|| ApiError::UnknownOperation(name.clone()))
    }

    pub fn contains(&self, name: &OperationName) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<OperationName> {
        self.constructors.keys().cloned().collect()
    }

    /// Check a binding against the registry by building it once.
    /// Unknown names and rejected parameters are both reported here.
    pub fn validate(
        &self,
        name: &OperationName,
        params: OperationParams,
    ) -> Result<Binding, BindingError> {
        let constructor = self
            .lookup(name)
            .map_err(|_| BindingError::Unknown(name.clone()))?;
        constructor(&params).map_err(BindingError::Rejected)?;
        Ok(Binding::with_params(name.clone(), params))
    }

    /// Build a fresh operation for one use. Errors name the binding and `stage`.
    pub fn construct(&self, binding: &Binding, stage: Stage) -> Result<Box<dyn Operation>, ApiError> {
        let constructor = self.constructors.get(&binding.name).ok_or_else(|| {
            ApiError::operation(&binding.name, stage, OperationError::Unregistered)
        })?;
        constructor(&binding.params).map_err(|e| ApiError::operation(&binding.name, stage, e))
    }

    /// Describe every registered operation
    pub fn describe(&self) -> Vec<OperationInfo> {
        let empty = OperationParams::new();
        self.constructors
            .iter()
            .map(|(name, constructor)| OperationInfo {
                name: name.clone(),
                is_async: constructor(&empty).ok().map(|op| op.is_async()),
            })
            .collect()
    }
}

/// Why a binding failed validation
#[derive(Debug)]
pub enum BindingError {
    Unknown(OperationName),
    Rejected(OperationError),
}
