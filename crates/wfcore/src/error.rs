use thiserror::Error;

use crate::StructuralPath;

/// Top-level error returned by a workflow build.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Structural error: {0}")]
    Structural(#[from] StructuralError),

    #[error("Duplicate activity id '{id}' at {first} and {second}")]
    DuplicateIdentity {
        id: String,
        first: StructuralPath,
        second: StructuralPath,
    },

    #[error("Registration error: {0}")]
    Registration(#[from] RegistrationError),

    #[error("Build cancelled")]
    Cancelled,

    #[error("Definition error: {0}")]
    Definition(String),
}

impl BuildError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, BuildError::Cancelled)
    }
}

/// Malformed port content found while flattening an activity tree.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructuralError {
    #[error("{activity_type} at {path} is missing required port '{port}'")]
    MissingRequiredPort {
        path: StructuralPath,
        activity_type: String,
        port: String,
    },

    #[error("{activity_type} at {path} has an empty entry in port '{port}' at index {ordinal}")]
    NullChild {
        path: StructuralPath,
        activity_type: String,
        port: String,
        ordinal: usize,
    },

    #[error("{activity_type} at {path} exposes port '{port}' as {actual}, descriptor declares {expected}")]
    PortKindMismatch {
        path: StructuralPath,
        activity_type: String,
        port: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("{activity_type} declares port '{port}' more than once")]
    DuplicatePort { activity_type: String, port: String },
}

/// Failure to record an activity type with the type registry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistrationError {
    #[error("Activity type is missing required metadata: {0}")]
    MissingMetadata(String),

    #[error("Invalid activity type name: '{0}'")]
    InvalidTypeName(String),

    #[error("Registry backend error: {0}")]
    Backend(String),
}
