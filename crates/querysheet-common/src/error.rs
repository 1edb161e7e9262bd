//! Error raised when a scanned value has no defined cell conversion.

use std::{error::Error, fmt};

/// A value whose runtime type has no cell conversion.
///
/// Carries the native type name reported by the driver so the offending
/// column can be located without re-running the query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnsupportedValueType {
    type_name: String,
}

impl UnsupportedValueType {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

impl fmt::Display for UnsupportedValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported value type `{}`", self.type_name)
    }
}

impl Error for UnsupportedValueType {}
