//! Identifier types shared by every pipeline stage.
//!
//! A state record is addressed by the triple (LocationKey, InstanceKey, OperationName):
//! which kind of content is being generated, which running instance it is for, and
//! which operation owns the value.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_key!(
    /// The kind of content being generated, e.g. a pane status line or a prompt.
    LocationKey
);

string_key!(
    /// One running instance of a location, usually a specific multiplexer pane.
    InstanceKey
);

string_key!(
    /// Stable operation identifier; also its template namespace key.
    OperationName
);

/// Composite key of a single state record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateKey {
    pub location: LocationKey,
    pub instance: InstanceKey,
    pub operation: OperationName,
}

impl StateKey {
    pub fn new(location: &LocationKey, instance: &InstanceKey, operation: &OperationName) -> Self {
        Self {
            location: location.clone(),
            instance: instance.clone(),
            operation: operation.clone(),
        }
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.location, self.instance, self.operation)
    }
}
