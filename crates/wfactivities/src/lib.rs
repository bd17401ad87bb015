//! Standard activity library
//!
//! Control-flow composites, a couple of leaf primitives, activities whose
//! shape is defined by a document, and the JSON authoring format.

mod control;
mod custom;
mod document;
mod primitives;

pub use control::{Break, Fork, If, JoinMode, Sequence, While, BREAK, FORK, IF, SEQUENCE, WHILE};
pub use custom::{CustomActivity, CustomPort};
pub use document::{ActivityDocument, PortDocument, WorkflowDocument};
pub use primitives::{SetVariable, WriteLine, SET_VARIABLE, WRITE_LINE};

use wfbuild::{RegistrationSummary, TypeRegistry};
use wfcore::{Activity, ActivityDescriptor, RegistrationError};

/// Descriptors of every built-in activity type
pub fn standard_descriptors() -> Vec<ActivityDescriptor> {
    vec![
        Sequence::new().descriptor(),
        Fork::new().descriptor(),
        If::new("").descriptor(),
        While::new("").descriptor(),
        Break::new().descriptor(),
        SetVariable::new("", serde_json::Value::Null).descriptor(),
        WriteLine::new("").descriptor(),
    ]
}

/// Register all standard activity types with a registry
pub async fn register_all(
    registry: &dyn TypeRegistry,
) -> Result<RegistrationSummary, RegistrationError> {
    registry.register(standard_descriptors()).await
}
