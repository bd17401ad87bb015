//! Workflow graph builder
//!
//! This crate turns an authored activity tree into an immutable workflow:
//! it flattens the tree, registers the activity types it finds, assigns
//! every activity a stable identifier and names unnamed variables.

mod builder;
mod definition;
pub mod identifiers;
pub mod identity;
pub mod registry;
pub mod variables;
pub mod visitor;

pub use builder::{
    BuilderOptions, BuilderServices, WorkflowBuilder, WorkflowBuilderFactory, WorkflowConfig,
};
pub use definition::WorkflowDefinition;
pub use identifiers::{IdentifierGenerator, SequentialIdentifierGenerator, UuidIdentifierGenerator};
pub use identity::{assign_identities, derive_id, IdentityMap, DEFAULT_IDENTITY_NAMESPACE};
pub use registry::{ActivityTypeRegistry, RegistrationSummary, TypeRegistry};
pub use variables::{name_variables, resolve_scopes};
pub use visitor::{flatten, walk_mut, ActivityGraph};
