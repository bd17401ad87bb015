//! Core abstractions for the workflow graph builder
//!
//! This crate provides the activity model, structural paths, variables and
//! the immutable workflow aggregate that every other crate depends on.

pub mod activity;
mod error;
mod node;
mod path;
mod variable;
mod workflow;

pub use activity::{
    Activity, ActivityDescriptor, EmptyComposite, PortContent, PortContentMut, PortDescriptor,
    PortKind, EMPTY_COMPOSITE_TYPE,
};
pub use error::{BuildError, RegistrationError, StructuralError};
pub use node::ActivityNode;
pub use path::{PathSegment, StructuralPath};
pub use variable::{InputDefinition, OutputDefinition, Variable, VariableContainer};
pub use workflow::{
    ActivationStrategy, Workflow, WorkflowIdentity, WorkflowMetadata, WorkflowOptions,
    WorkflowParts, WorkflowPublication,
};

/// Result type for build operations
pub type Result<T> = std::result::Result<T, BuildError>;
