//! Locations: an ordered list of validated bindings plus the template they feed.

use crate::error::TemplateError;
use crate::registry::Binding;
use crate::template::Template;
use crate::types::{InstanceKey, LocationKey, OperationName};
use std::path::PathBuf;

/// A validated location. Binding order is the order operations run in.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub bindings: Vec<Binding>,
    pub template: String,
}

impl Location {
    pub fn new(bindings: Vec<Binding>, template: impl Into<String>) -> Self {
        Self {
            bindings,
            template: template.into(),
        }
    }

    pub fn parse_template(&self) -> Result<Template, TemplateError> {
        Template::parse(&self.template)
    }

    /// Names of the bound operations, in order.
    pub fn operation_names(&self) -> impl Iterator<Item = &OperationName> {
        self.bindings.iter().map(|b| &b.name)
    }
}

/// What a single generate or update pass runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub location_key: LocationKey,
    pub instance_key: InstanceKey,
    pub location_path: PathBuf,
}

impl Target {
    pub fn new(
        location_key: impl Into<LocationKey>,
        instance_key: impl Into<InstanceKey>,
        location_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            location_key: location_key.into(),
            instance_key: instance_key.into(),
            location_path: location_path.into(),
        }
    }
}
